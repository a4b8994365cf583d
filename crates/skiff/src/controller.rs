//! Controller specifications
//!
//! A controller is a data value: a state factory plus handler tables
//! (`events`, `subs`, `above`, `below`) and lifecycle hooks, assembled
//! by a typed builder and type-erased for storage in the binding table.
//! There is no inheritance; composition is `merge`.

use std::any::Any;
use std::rc::Rc;

use serde_json::Value;
use skiff_css::Selector;
use skiff_dom::NodeId;

use crate::app::Context;
use crate::binding::BindingId;
use crate::error::{BindError, HandlerError};

/// Identity of one controller instance: the element it controls plus the
/// binding that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId {
    pub el: NodeId,
    pub binding: BindingId,
}

/// Message envelope delivered to subscription, tree-message, lifecycle
/// and DOM-event handlers
#[derive(Debug, Clone)]
pub struct Msg {
    /// Symbolic message name (or DOM event type, or lifecycle phase)
    pub kind: String,
    /// Publishing controller, if the message came from one
    pub source: Option<ControllerId>,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl Msg {
    pub(crate) fn new(kind: &str, source: Option<ControllerId>, args: Vec<Value>) -> Self {
        Self {
            kind: kind.to_string(),
            source,
            args,
        }
    }

    pub(crate) fn lifecycle(phase: &str) -> Self {
        Self::new(phase, None, Vec::new())
    }

    /// Positional argument accessor
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

pub(crate) type HandlerId = usize;

pub(crate) type ErasedHandler =
    Rc<dyn Fn(&mut dyn Any, &mut Context<'_>, &Msg) -> Result<(), HandlerError>>;

/// One declared DOM event binding: `"<type> [<delegation selector>]"`
pub(crate) struct EventBinding {
    pub kind: String,
    pub delegate: Option<Selector>,
    pub handler: HandlerId,
}

/// Type-erased controller specification
pub struct ControllerSpec {
    factory: Rc<dyn Fn() -> Box<dyn Any>>,
    handlers: Vec<ErasedHandler>,
    init: Vec<HandlerId>,
    mount: Vec<HandlerId>,
    unmount: Vec<HandlerId>,
    events: Vec<EventBinding>,
    subs: Vec<(String, Vec<HandlerId>)>,
    above: Vec<(String, Vec<HandlerId>)>,
    below: Vec<(String, Vec<HandlerId>)>,
}

impl std::fmt::Debug for ControllerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSpec")
            .field("handlers", &self.handlers.len())
            .field("init", &self.init)
            .field("mount", &self.mount)
            .field("unmount", &self.unmount)
            .field("events", &self.events.len())
            .field("subs", &self.subs.len())
            .field("above", &self.above.len())
            .field("below", &self.below.len())
            .finish_non_exhaustive()
    }
}

impl ControllerSpec {
    /// Start building a spec over a state type
    pub fn build<S: Default + 'static>() -> ControllerSpecBuilder<S> {
        ControllerSpecBuilder {
            factory: Rc::new(|| Box::new(S::default()) as Box<dyn Any>),
            handlers: Vec::new(),
            init: Vec::new(),
            mount: Vec::new(),
            unmount: Vec::new(),
            raw_events: Vec::new(),
            subs: Vec::new(),
            above: Vec::new(),
            below: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Compose two specs over the same state type: tables concatenate,
    /// the later spec's state factory wins
    pub fn merge(mut self, other: ControllerSpec) -> ControllerSpec {
        let offset = self.handlers.len();
        self.factory = other.factory;
        self.handlers.extend(other.handlers);
        let remap = |ids: Vec<HandlerId>| ids.into_iter().map(|id| id + offset).collect::<Vec<_>>();
        self.init.extend(remap(other.init));
        self.mount.extend(remap(other.mount));
        self.unmount.extend(remap(other.unmount));
        for ev in other.events {
            self.events.push(EventBinding {
                kind: ev.kind,
                delegate: ev.delegate,
                handler: ev.handler + offset,
            });
        }
        for (name, ids) in other.subs {
            push_table(&mut self.subs, &name, remap(ids));
        }
        for (name, ids) in other.above {
            push_table(&mut self.above, &name, remap(ids));
        }
        for (name, ids) in other.below {
            push_table(&mut self.below, &name, remap(ids));
        }
        self
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Any> {
        (self.factory)()
    }

    pub(crate) fn handler(&self, id: HandlerId) -> ErasedHandler {
        Rc::clone(&self.handlers[id])
    }

    pub(crate) fn init_handlers(&self) -> Vec<HandlerId> {
        self.init.clone()
    }

    pub(crate) fn mount_handlers(&self) -> Vec<HandlerId> {
        self.mount.clone()
    }

    pub(crate) fn unmount_handlers(&self) -> Vec<HandlerId> {
        self.unmount.clone()
    }

    pub(crate) fn events(&self) -> &[EventBinding] {
        &self.events
    }

    pub(crate) fn sub_names(&self) -> impl Iterator<Item = &str> {
        self.subs.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn sub_handlers(&self, name: &str) -> Option<&[HandlerId]> {
        lookup_table(&self.subs, name)
    }

    pub(crate) fn above_handlers(&self, name: &str) -> Option<&[HandlerId]> {
        lookup_table(&self.above, name)
    }

    pub(crate) fn below_handlers(&self, name: &str) -> Option<&[HandlerId]> {
        lookup_table(&self.below, name)
    }
}

fn push_table(table: &mut Vec<(String, Vec<HandlerId>)>, name: &str, ids: Vec<HandlerId>) {
    if let Some((_, existing)) = table.iter_mut().find(|(n, _)| n == name) {
        existing.extend(ids);
    } else {
        table.push((name.to_string(), ids));
    }
}

fn lookup_table<'a>(
    table: &'a [(String, Vec<HandlerId>)],
    name: &str,
) -> Option<&'a [HandlerId]> {
    table
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, ids)| ids.as_slice())
}

/// Typed builder for [`ControllerSpec`]
pub struct ControllerSpecBuilder<S> {
    factory: Rc<dyn Fn() -> Box<dyn Any>>,
    handlers: Vec<ErasedHandler>,
    init: Vec<HandlerId>,
    mount: Vec<HandlerId>,
    unmount: Vec<HandlerId>,
    raw_events: Vec<(String, HandlerId)>,
    subs: Vec<(String, Vec<HandlerId>)>,
    above: Vec<(String, Vec<HandlerId>)>,
    below: Vec<(String, Vec<HandlerId>)>,
    _marker: std::marker::PhantomData<fn() -> S>,
}

impl<S: Default + 'static> ControllerSpecBuilder<S> {
    fn push_handler(
        &mut self,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> HandlerId {
        let id = self.handlers.len();
        self.handlers.push(Rc::new(move |state, cx, msg| {
            let state = state
                .downcast_mut::<S>()
                .ok_or_else(|| HandlerError::new("controller state type mismatch"))?;
            f(state, cx, msg)
        }));
        id
    }

    /// Use a custom state constructor instead of `S::default()`
    pub fn state(mut self, f: impl Fn() -> S + 'static) -> Self {
        self.factory = Rc::new(move || Box::new(f()) as Box<dyn Any>);
        self
    }

    /// Lifecycle: runs at instantiation, before the mount phase
    pub fn init(
        mut self,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        self.init.push(id);
        self
    }

    /// Lifecycle: runs after every instantiation in the scan pass
    pub fn mount(
        mut self,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        self.mount.push(id);
        self
    }

    /// Lifecycle: runs when `App::sweep` reclaims a detached instance
    pub fn unmount(
        mut self,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        self.unmount.push(id);
        self
    }

    /// DOM event handler; `key` is `"<type>"` for a direct handler or
    /// `"<type> <selector>"` for delegation scoped to the element
    pub fn event(
        mut self,
        key: &str,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        self.raw_events.push((key.to_string(), id));
        self
    }

    /// Global subscription handler
    pub fn sub(
        mut self,
        name: &str,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        push_table(&mut self.subs, name, vec![id]);
        self
    }

    /// Handler for messages sent `down` by ancestor controllers
    pub fn above(
        mut self,
        name: &str,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        push_table(&mut self.above, name, vec![id]);
        self
    }

    /// Handler for messages sent `up` by descendant controllers
    pub fn below(
        mut self,
        name: &str,
        f: impl Fn(&mut S, &mut Context<'_>, &Msg) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        let id = self.push_handler(f);
        push_table(&mut self.below, name, vec![id]);
        self
    }

    /// Validate event keys and produce the spec. Malformed keys are
    /// configuration errors and fail here, at registration time.
    pub fn finish(self) -> Result<ControllerSpec, BindError> {
        let mut events = Vec::with_capacity(self.raw_events.len());
        for (key, handler) in self.raw_events {
            let trimmed = key.trim();
            let mut parts = trimmed.splitn(2, char::is_whitespace);
            let kind = parts.next().unwrap_or("").to_string();
            if kind.is_empty() {
                return Err(BindError::EventKey(key));
            }
            let delegate = match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
                Some(selector) => Some(Selector::parse(selector).map_err(|source| {
                    BindError::DelegationSelector {
                        key: key.clone(),
                        source,
                    }
                })?),
                None => None,
            };
            events.push(EventBinding {
                kind,
                delegate,
                handler,
            });
        }
        Ok(ControllerSpec {
            factory: self.factory,
            handlers: self.handlers,
            init: self.init,
            mount: self.mount,
            unmount: self.unmount,
            events,
            subs: self.subs,
            above: self.above,
            below: self.below,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter;

    #[test]
    fn test_event_key_parsing() {
        let spec = ControllerSpec::build::<Counter>()
            .event("click", |_, _, _| Ok(()))
            .event("click .btn li", |_, _, _| Ok(()))
            .finish()
            .unwrap();
        assert_eq!(spec.events().len(), 2);
        assert_eq!(spec.events()[0].kind, "click");
        assert!(spec.events()[0].delegate.is_none());
        assert_eq!(spec.events()[1].kind, "click");
        assert_eq!(
            spec.events()[1].delegate.as_ref().unwrap().source(),
            ".btn li"
        );
    }

    #[test]
    fn test_malformed_event_key_fails_fast() {
        let err = ControllerSpec::build::<Counter>()
            .event("   ", |_, _, _| Ok(()))
            .finish()
            .unwrap_err();
        assert!(matches!(err, BindError::EventKey(_)));

        let err = ControllerSpec::build::<Counter>()
            .event("click .[", |_, _, _| Ok(()))
            .finish()
            .unwrap_err();
        assert!(matches!(err, BindError::DelegationSelector { .. }));
    }

    #[test]
    fn test_multi_handler_tables() {
        let spec = ControllerSpec::build::<Counter>()
            .sub("x", |_, _, _| Ok(()))
            .sub("x", |_, _, _| Ok(()))
            .sub("y", |_, _, _| Ok(()))
            .finish()
            .unwrap();
        assert_eq!(spec.sub_handlers("x").unwrap().len(), 2);
        assert_eq!(spec.sub_handlers("y").unwrap().len(), 1);
        assert!(spec.sub_handlers("z").is_none());
        let names: Vec<_> = spec.sub_names().collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_merge_remaps_handlers() {
        let base = ControllerSpec::build::<Counter>()
            .init(|_, _, _| Ok(()))
            .sub("x", |_, _, _| Ok(()))
            .finish()
            .unwrap();
        let extra = ControllerSpec::build::<Counter>()
            .mount(|_, _, _| Ok(()))
            .sub("x", |_, _, _| Ok(()))
            .finish()
            .unwrap();
        let merged = base.merge(extra);
        assert_eq!(merged.init_handlers().len(), 1);
        assert_eq!(merged.mount_handlers().len(), 1);
        assert_eq!(merged.sub_handlers("x").unwrap().len(), 2);
        // Remapped ids all resolve
        for &id in merged.sub_handlers("x").unwrap() {
            let _ = merged.handler(id);
        }
    }
}
