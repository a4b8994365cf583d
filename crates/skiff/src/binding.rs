//! Binding table
//!
//! The ordered list of (selector, controller spec) pairs. Insertion
//! order is scan order, which in turn fixes controller-creation order
//! when several bindings match one element. Iteration is index-driven
//! so reentrant `bind` calls from inside controller callbacks are safe.

use std::rc::Rc;

use skiff_css::Selector;

use crate::controller::ControllerSpec;

/// Identity of a registered binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

pub(crate) struct Binding {
    pub id: BindingId,
    pub selector: Rc<Selector>,
    pub spec: Rc<ControllerSpec>,
}

#[derive(Default)]
pub(crate) struct BindingTable {
    bindings: Vec<Binding>,
    next: u32,
}

impl BindingTable {
    pub fn push(&mut self, selector: Selector, spec: ControllerSpec) -> BindingId {
        let id = BindingId(self.next);
        self.next += 1;
        self.bindings.push(Binding {
            id,
            selector: Rc::new(selector),
            spec: Rc::new(spec),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Snapshot by index; clones the shared handles so no borrow of the
    /// table outlives the call
    pub fn snapshot(&self, index: usize) -> Option<(BindingId, Rc<Selector>, Rc<ControllerSpec>)> {
        self.bindings
            .get(index)
            .map(|b| (b.id, Rc::clone(&b.selector), Rc::clone(&b.spec)))
    }

    pub fn spec(&self, id: BindingId) -> Option<Rc<ControllerSpec>> {
        self.bindings
            .iter()
            .find(|b| b.id == id)
            .map(|b| Rc::clone(&b.spec))
    }

    /// Binding ids in insertion order
    pub fn ids(&self) -> Vec<BindingId> {
        self.bindings.iter().map(|b| b.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut table = BindingTable::default();
        let a = table.push(
            Selector::parse(".a").unwrap(),
            ControllerSpec::build::<()>().finish().unwrap(),
        );
        let b = table.push(
            Selector::parse(".b").unwrap(),
            ControllerSpec::build::<()>().finish().unwrap(),
        );
        assert_ne!(a, b);
        assert_eq!(table.ids(), vec![a, b]);
        let (id, sel, _) = table.snapshot(0).unwrap();
        assert_eq!(id, a);
        assert_eq!(sel.source(), ".a");
        assert!(table.snapshot(2).is_none());
    }
}
