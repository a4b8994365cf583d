//! Tag table
//!
//! Explicit side-table from element identity to its Tag: the per-element
//! record of controller instances keyed by binding id. Instances are
//! checked out of their slot for the duration of a handler call, so the
//! handler can hold `&mut App` without aliasing; deliveries that target
//! a checked-out instance queue on the slot and drain at check-in.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use skiff_dom::NodeId;

use crate::binding::BindingId;
use crate::controller::{ControllerSpec, HandlerId, Msg};

pub(crate) struct ControllerInstance {
    pub state: Box<dyn Any>,
    pub spec: Rc<ControllerSpec>,
}

pub(crate) enum Slot {
    Occupied(ControllerInstance),
    CheckedOut { pending: Vec<(Vec<HandlerId>, Msg)> },
}

pub(crate) enum Checkout {
    Instance(ControllerInstance),
    Busy,
    Missing,
}

#[derive(Default)]
pub(crate) struct TagTable {
    tags: HashMap<NodeId, HashMap<BindingId, Slot>>,
}

impl TagTable {
    /// Create the element's Tag if this is the first time it is seen
    pub fn ensure(&mut self, el: NodeId) -> bool {
        if self.tags.contains_key(&el) {
            return false;
        }
        self.tags.insert(el, HashMap::new());
        true
    }

    pub fn has_instance(&self, el: NodeId, binding: BindingId) -> bool {
        self.tags
            .get(&el)
            .is_some_and(|tag| tag.contains_key(&binding))
    }

    pub fn is_tagged(&self, el: NodeId) -> bool {
        self.tags.contains_key(&el)
    }

    pub fn insert(&mut self, el: NodeId, binding: BindingId, instance: ControllerInstance) {
        self.tags
            .entry(el)
            .or_default()
            .insert(binding, Slot::Occupied(instance));
    }

    pub fn checkout(&mut self, el: NodeId, binding: BindingId) -> Checkout {
        let Some(slot) = self.tags.get_mut(&el).and_then(|tag| tag.get_mut(&binding)) else {
            return Checkout::Missing;
        };
        match slot {
            Slot::CheckedOut { .. } => Checkout::Busy,
            Slot::Occupied(_) => {
                let taken = std::mem::replace(slot, Slot::CheckedOut { pending: Vec::new() });
                match taken {
                    Slot::Occupied(instance) => Checkout::Instance(instance),
                    Slot::CheckedOut { .. } => unreachable!(),
                }
            }
        }
    }

    /// Return an instance to its slot, draining any deliveries queued
    /// while it was out. If the tag vanished meanwhile (swept from
    /// within the handler), the instance is dropped.
    pub fn checkin(
        &mut self,
        el: NodeId,
        binding: BindingId,
        instance: ControllerInstance,
    ) -> Vec<(Vec<HandlerId>, Msg)> {
        let Some(slot) = self.tags.get_mut(&el).and_then(|tag| tag.get_mut(&binding)) else {
            return Vec::new();
        };
        let prior = std::mem::replace(slot, Slot::Occupied(instance));
        match prior {
            Slot::CheckedOut { pending } => pending,
            Slot::Occupied(_) => Vec::new(),
        }
    }

    /// Queue a delivery on a checked-out slot
    pub fn queue(&mut self, el: NodeId, binding: BindingId, handlers: Vec<HandlerId>, msg: Msg) {
        if let Some(Slot::CheckedOut { pending }) =
            self.tags.get_mut(&el).and_then(|tag| tag.get_mut(&binding))
        {
            pending.push((handlers, msg));
        }
    }

    /// All tagged elements, in arbitrary order
    pub fn elements(&self) -> Vec<NodeId> {
        self.tags.keys().copied().collect()
    }

    /// Whether any slot of this element is currently checked out
    pub fn has_checked_out(&self, el: NodeId) -> bool {
        self.tags
            .get(&el)
            .is_some_and(|tag| tag.values().any(|s| matches!(s, Slot::CheckedOut { .. })))
    }

    /// Remove an element's Tag, yielding its slots
    pub fn remove(&mut self, el: NodeId) -> Option<HashMap<BindingId, Slot>> {
        self.tags.remove(&el)
    }
}
