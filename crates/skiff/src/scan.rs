//! Binding scan
//!
//! Walks the document applying every binding's selector, creating
//! controller instances for unclaimed matches. Tagging is idempotent:
//! an element already holding an instance for a binding is skipped, so
//! repeated scans are free. `init` runs as each instance is created;
//! `mount` runs for the whole batch once the pass completes.

use skiff_dom::NodeId;

use crate::app::App;
use crate::binding::BindingId;
use crate::controller::Msg;
use crate::tags::ControllerInstance;
use crate::TAG_CLASS;

/// Marker class recording a subscription on the tagged element, so
/// publish can find subscribers with a plain class query. Message names
/// are sanitized; collisions only cost a table lookup at delivery.
pub(crate) fn sub_marker_class(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 10);
    out.push_str("skiff-sub-");
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('-');
        }
    }
    out
}

impl App {
    /// Apply every binding to the whole document.
    pub fn scan(&mut self) {
        self.scan_from(NodeId::ROOT);
    }

    /// Apply every binding to the strict descendants of `root`. The
    /// binding list is walked by index so a `bind` call from inside an
    /// `init` handler joins the same pass.
    pub fn scan_from(&mut self, root: NodeId) {
        let mut mount_queue: Vec<(NodeId, BindingId)> = Vec::new();
        let mut i = 0;
        while i < self.bindings.len() {
            if let Some((id, selector, _)) = self.bindings.snapshot(i) {
                for el in selector.match_all(self.doc.tree(), root) {
                    self.attach(el, id, &mut mount_queue);
                }
            }
            i += 1;
        }
        self.run_mounts(mount_queue);
    }

    /// Apply a single freshly registered binding to the whole document.
    pub(crate) fn scan_binding(&mut self, id: BindingId) {
        let Some(index) = self.bindings.ids().iter().position(|&b| b == id) else {
            return;
        };
        let mut mount_queue = Vec::new();
        if let Some((id, selector, _)) = self.bindings.snapshot(index) {
            for el in selector.match_all(self.doc.tree(), NodeId::ROOT) {
                self.attach(el, id, &mut mount_queue);
            }
        }
        self.run_mounts(mount_queue);
    }

    /// Create a controller instance on `el` for `binding`, unless one
    /// already exists there.
    fn attach(&mut self, el: NodeId, binding: BindingId, mount_queue: &mut Vec<(NodeId, BindingId)>) {
        if self.tags.has_instance(el, binding) {
            return;
        }
        let Some(spec) = self.bindings.spec(binding) else {
            return;
        };
        if self.tags.ensure(el) {
            self.doc.tree_mut().add_class(el, TAG_CLASS);
        }
        for name in spec.sub_names().map(sub_marker_class).collect::<Vec<_>>() {
            self.doc.tree_mut().add_class(el, &name);
        }
        let instance = ControllerInstance {
            state: spec.instantiate(),
            spec: spec.clone(),
        };
        self.tags.insert(el, binding, instance);
        tracing::debug!(el = el.to_raw(), "controller attached");

        let init = spec.init_handlers();
        if !init.is_empty() {
            self.run_or_queue(el, binding, init, Msg::lifecycle("init"));
        }
        mount_queue.push((el, binding));
    }

    fn run_mounts(&mut self, mount_queue: Vec<(NodeId, BindingId)>) {
        for (el, binding) in mount_queue {
            if !self.doc.tree().is_attached(el) {
                continue;
            }
            let Some(spec) = self.bindings.spec(binding) else {
                continue;
            };
            let mount = spec.mount_handlers();
            if !mount.is_empty() {
                self.run_or_queue(el, binding, mount, Msg::lifecycle("mount"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_marker_sanitizes() {
        assert_eq!(sub_marker_class("cart.add"), "skiff-sub-cart-add");
        assert_eq!(sub_marker_class("plain"), "skiff-sub-plain");
        assert_eq!(sub_marker_class("a b/c"), "skiff-sub-a-b-c");
    }
}
