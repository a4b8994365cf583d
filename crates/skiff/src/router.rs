//! Message delivery
//!
//! All three routes funnel through `run_or_queue`: the instance is
//! checked out of its slot, its handlers run against a free `&mut App`,
//! and the instance is checked back in. A delivery that finds the
//! instance already checked out (re-entrant publish hitting the
//! publisher itself) queues on the slot and drains at check-in.

use serde_json::Value;

use skiff_dom::NodeId;

use crate::app::{App, Context, HandlerFailure};
use crate::binding::BindingId;
use crate::controller::{ControllerId, HandlerId, Msg};
use crate::scan::sub_marker_class;
use crate::tags::Checkout;

impl App {
    pub(crate) fn run_or_queue(
        &mut self,
        el: NodeId,
        binding: BindingId,
        handlers: Vec<HandlerId>,
        msg: Msg,
    ) {
        let mut instance = match self.tags.checkout(el, binding) {
            Checkout::Instance(instance) => instance,
            Checkout::Busy => {
                self.tags.queue(el, binding, handlers, msg);
                return;
            }
            Checkout::Missing => return,
        };

        let id = ControllerId { el, binding };
        for handler_id in handlers {
            let handler = instance.spec.handler(handler_id);
            let mut cx = Context { app: self, el, id };
            if let Err(error) = handler(instance.state.as_mut(), &mut cx, &msg) {
                tracing::error!(kind = %msg.kind, %error, "handler failed");
                self.failures.push(HandlerFailure {
                    controller: id,
                    kind: msg.kind.clone(),
                    error,
                });
            }
        }

        let pending = self.tags.checkin(el, binding, instance);
        for (handlers, msg) in pending {
            self.run_or_queue(el, binding, handlers, msg);
        }
    }

    /// Deliver a published message to every subscribed controller.
    /// Recipients are fixed up front (document order of their elements,
    /// binding order within one element); each is re-checked for
    /// attachment at its own delivery, since earlier handlers may have
    /// torn parts of the page down.
    pub(crate) fn publish_from(
        &mut self,
        source: Option<ControllerId>,
        name: &str,
        args: Vec<Value>,
    ) {
        let marker = sub_marker_class(name);
        let mut plan: Vec<(NodeId, BindingId, Vec<HandlerId>)> = Vec::new();
        let tree = self.doc.tree();
        for el in tree.descendants(NodeId::ROOT) {
            if !tree.has_class(el, &marker) {
                continue;
            }
            for binding in self.bindings.ids() {
                if !self.tags.has_instance(el, binding) {
                    continue;
                }
                let Some(spec) = self.bindings.spec(binding) else {
                    continue;
                };
                if let Some(handlers) = spec.sub_handlers(name) {
                    plan.push((el, binding, handlers.to_vec()));
                }
            }
        }
        tracing::trace!(name, recipients = plan.len(), "publish");
        for (el, binding, handlers) in plan {
            if !self.doc.tree().is_attached(el) {
                continue;
            }
            let msg = Msg::new(name, source, args.clone());
            self.run_or_queue(el, binding, handlers, msg);
        }
    }

    /// Deliver a tree message to strict-ancestor controllers that
    /// declare a `below` handler for it, nearest first.
    pub(crate) fn send_up(
        &mut self,
        from: NodeId,
        source: Option<ControllerId>,
        name: &str,
        args: Vec<Value>,
    ) {
        if !self.doc.tree().is_attached(from) {
            return;
        }
        let chain: Vec<NodeId> = self.doc.tree().ancestors(from).collect();
        self.deliver_tree(chain, source, name, args, Direction::Up);
    }

    /// Deliver a tree message to strict-descendant controllers that
    /// declare an `above` handler for it, in document order.
    pub(crate) fn send_down(
        &mut self,
        from: NodeId,
        source: Option<ControllerId>,
        name: &str,
        args: Vec<Value>,
    ) {
        if !self.doc.tree().is_attached(from) {
            return;
        }
        let chain: Vec<NodeId> = self.doc.tree().descendants(from).collect();
        self.deliver_tree(chain, source, name, args, Direction::Down);
    }

    fn deliver_tree(
        &mut self,
        chain: Vec<NodeId>,
        source: Option<ControllerId>,
        name: &str,
        args: Vec<Value>,
        direction: Direction,
    ) {
        let mut plan: Vec<(NodeId, BindingId, Vec<HandlerId>)> = Vec::new();
        for el in chain {
            if !self.tags.is_tagged(el) {
                continue;
            }
            for binding in self.bindings.ids() {
                if !self.tags.has_instance(el, binding) {
                    continue;
                }
                let Some(spec) = self.bindings.spec(binding) else {
                    continue;
                };
                let handlers = match direction {
                    Direction::Up => spec.below_handlers(name),
                    Direction::Down => spec.above_handlers(name),
                };
                if let Some(handlers) = handlers {
                    plan.push((el, binding, handlers.to_vec()));
                }
            }
        }
        for (el, binding, handlers) in plan {
            if !self.doc.tree().is_attached(el) {
                continue;
            }
            let msg = Msg::new(name, source, args.clone());
            self.run_or_queue(el, binding, handlers, msg);
        }
    }

    /// Route a DOM event into controller event handlers. The event
    /// bubbles from `target` to the root; at each tagged element on the
    /// path, direct handlers of the event type fire, and delegated
    /// handlers fire when some element between the target and the bound
    /// element (exclusive) matches the delegation selector.
    pub fn dispatch_event(&mut self, target: NodeId, kind: &str, args: Vec<Value>) {
        let mut path = vec![target];
        path.extend(self.doc.tree().ancestors(target));

        let mut plan: Vec<(NodeId, BindingId, Vec<HandlerId>)> = Vec::new();
        for &el in &path {
            if !self.tags.is_tagged(el) {
                continue;
            }
            for binding in self.bindings.ids() {
                if !self.tags.has_instance(el, binding) {
                    continue;
                }
                let Some(spec) = self.bindings.spec(binding) else {
                    continue;
                };
                let mut handlers = Vec::new();
                for ev in spec.events() {
                    if ev.kind != kind {
                        continue;
                    }
                    let hit = match &ev.delegate {
                        None => true,
                        Some(selector) => selector
                            .closest_within(self.doc.tree(), target, el)
                            .is_some(),
                    };
                    if hit {
                        handlers.push(ev.handler);
                    }
                }
                if !handlers.is_empty() {
                    plan.push((el, binding, handlers));
                }
            }
        }
        for (el, binding, handlers) in plan {
            if !self.doc.tree().is_attached(el) {
                continue;
            }
            let msg = Msg::new(kind, None, args.clone());
            self.run_or_queue(el, binding, handlers, msg);
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}
