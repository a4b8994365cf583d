//! DOM tree (arena-based allocation)
//!
//! The arena only grows. Detaching a subtree unlinks it but keeps its
//! slots, so a `NodeId` held by the runtime never dangles; callers use
//! `is_attached` to check liveness.

use crate::node::{ElementData, Node, NodeData};
use crate::NodeId;

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Get a node by id, panicking on an id from another arena
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes in the arena (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node, returning its id
    pub fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Allocate a new element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag)))
    }

    /// Allocate a new text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push_node(NodeData::Text(content.to_string()))
    }

    /// Allocate a new comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push_node(NodeData::Comment(content.to_string()))
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;
        if last.is_valid() {
            self.node_mut(last).next_sibling = child;
            self.node_mut(child).prev_sibling = last;
        } else {
            self.node_mut(parent).first_child = child;
        }
        self.node_mut(parent).last_child = child;
        self.node_mut(child).parent = parent;
    }

    /// Insert `new` as a child of `parent`, immediately before `reference`
    pub fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: NodeId) {
        self.detach(new);
        let prev = self.node(reference).prev_sibling;
        if prev.is_valid() {
            self.node_mut(prev).next_sibling = new;
        } else {
            self.node_mut(parent).first_child = new;
        }
        {
            let n = self.node_mut(new);
            n.parent = parent;
            n.prev_sibling = prev;
            n.next_sibling = reference;
        }
        self.node_mut(reference).prev_sibling = new;
    }

    /// Unlink a node from its parent and siblings; its subtree stays intact
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }
        if prev.is_valid() {
            self.node_mut(prev).next_sibling = next;
        } else {
            self.node_mut(parent).first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next).prev_sibling = prev;
        } else {
            self.node_mut(parent).last_child = prev;
        }
        let n = self.node_mut(id);
        n.parent = NodeId::NONE;
        n.prev_sibling = NodeId::NONE;
        n.next_sibling = NodeId::NONE;
    }

    /// Whether a node is connected to the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == NodeId::ROOT {
                return true;
            }
            cur = self.node(cur).parent;
            if !cur.is_valid() {
                return false;
            }
        }
    }

    /// Deep-copy a subtree out of another arena, returning the new root
    pub fn adopt(&mut self, other: &DomTree, node: NodeId) -> NodeId {
        let copy = self.push_node(other.node(node).data.clone());
        let mut child = other.node(node).first_child;
        while child.is_valid() {
            let adopted = self.adopt(other, child);
            self.append_child(copy, adopted);
            child = other.node(child).next_sibling;
        }
        copy
    }

    /// Iterate the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.node(id).first_child,
        }
    }

    /// Iterate strict ancestors, nearest first, ending at the document node
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).parent,
        }
    }

    /// Iterate strict descendants in document order
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: self.node(root).first_child,
        }
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, root: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.node(root).as_text() {
            out.push_str(t);
        }
        for id in self.descendants(root) {
            if let Some(t) = self.node(id).as_text() {
                out.push_str(t);
            }
        }
        out
    }

    // Element conveniences, tolerant of non-element ids.

    /// Lowercase tag name, if `id` is an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).as_element().map(|e| e.name.as_str())
    }

    /// Attribute lookup on an element
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).as_element().and_then(|e| e.attr(name))
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.node_mut(id).as_element_mut() {
            e.set_attr(name, value);
        }
    }

    /// Class-list membership test on an element
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id)
            .as_element()
            .is_some_and(|e| e.has_class(class))
    }

    /// Add a class to an element
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(e) = self.node_mut(id).as_element_mut() {
            e.add_class(class);
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        self.next = self.tree.node(id).next_sibling;
        Some(id)
    }
}

/// Iterator over strict ancestors, nearest first
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        self.next = self.tree.node(id).parent;
        Some(id)
    }
}

/// Document-order iterator over strict descendants of a root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.node(id);
        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            // Climb until a next sibling exists, stopping at the root
            let mut cur = id;
            loop {
                if cur == self.root {
                    break NodeId::NONE;
                }
                let n = self.tree.node(cur);
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                cur = n.parent;
                if !cur.is_valid() {
                    break NodeId::NONE;
                }
            }
        };
        Some(id)
    }
}
