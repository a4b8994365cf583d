//! Document - high-level wrapper over a tree
//!
//! Caches the structural html/head/body handles the way the runtime
//! needs them constantly (resource sync targets head, navigation swaps
//! body).

use crate::tree::DomTree;
use crate::NodeId;

/// An HTML document
#[derive(Debug, Clone)]
pub struct Document {
    tree: DomTree,
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
}

impl Document {
    /// Create a new document with the html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        tree.append_child(NodeId::ROOT, html);
        tree.append_child(html, head);
        tree.append_child(html, body);
        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Wrap an already-built tree, locating (or creating) the skeleton
    pub fn from_tree(tree: DomTree, url: &str) -> Self {
        let mut doc = Self {
            tree,
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        };
        doc.finalize();
        tracing::trace!(url, nodes = doc.tree.len(), "document assembled");
        doc
    }

    fn finalize(&mut self) {
        for child in self.tree.children(NodeId::ROOT).collect::<Vec<_>>() {
            if self.tree.tag_name(child) == Some("html") {
                self.html_element = child;
            }
        }
        if !self.html_element.is_valid() {
            let html = self.tree.create_element("html");
            self.tree.append_child(NodeId::ROOT, html);
            self.html_element = html;
        }
        for child in self.tree.children(self.html_element).collect::<Vec<_>>() {
            match self.tree.tag_name(child) {
                Some("head") => self.head_element = child,
                Some("body") => self.body_element = child,
                _ => {}
            }
        }
        if !self.head_element.is_valid() {
            let head = self.tree.create_element("head");
            let first = self.tree.node(self.html_element).first_child;
            if first.is_valid() {
                self.tree.insert_before(self.html_element, head, first);
            } else {
                self.tree.append_child(self.html_element, head);
            }
            self.head_element = head;
        }
        if !self.body_element.is_valid() {
            let body = self.tree.create_element("body");
            self.tree.append_child(self.html_element, body);
            self.body_element = body;
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Get the <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get the <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get the <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Point the cached body handle at a freshly attached element
    pub fn set_body(&mut self, body: NodeId) {
        self.body_element = body;
    }

    /// Text of the <title> element, empty if absent
    pub fn title(&self) -> String {
        for child in self.tree.children(self.head_element) {
            if self.tree.tag_name(child) == Some("title") {
                return self.tree.text_content(child).trim().to_string();
            }
        }
        String::new()
    }

    /// Replace (or create) the <title> element's text
    pub fn set_title(&mut self, title: &str) {
        for child in self.tree.children(self.head_element).collect::<Vec<_>>() {
            if self.tree.tag_name(child) == Some("title") {
                for text in self.tree.children(child).collect::<Vec<_>>() {
                    self.tree.detach(text);
                }
                let text = self.tree.create_text(title);
                self.tree.append_child(child, text);
                return;
            }
        }
        let el = self.tree.create_element("title");
        let text = self.tree.create_text(title);
        self.tree.append_child(el, text);
        let head = self.head_element;
        self.tree.append_child(head, el);
    }

    /// First element with a given id, searching the whole tree
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .find(|&n| self.tree.node(n).as_element().is_some_and(|e| e.id.as_deref() == Some(id)))
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Whether the document contains nothing but the skeleton
    pub fn is_blank(&self) -> bool {
        self.tree.children(self.head_element).next().is_none()
            && self.tree.children(self.body_element).next().is_none()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new("http://example.com/");
        assert!(doc.document_element().is_valid());
        assert!(doc.head().is_valid());
        assert!(doc.body().is_valid());
        assert!(doc.is_blank());
    }

    #[test]
    fn test_title_roundtrip() {
        let mut doc = Document::new("about:blank");
        assert_eq!(doc.title(), "");
        doc.set_title("hello");
        assert_eq!(doc.title(), "hello");
        doc.set_title("again");
        assert_eq!(doc.title(), "again");
        // Only one title element
        let count = doc
            .tree()
            .children(doc.head())
            .filter(|&c| doc.tree().tag_name(c) == Some("title"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_from_tree_creates_missing_parts() {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        tree.append_child(NodeId::ROOT, html);
        let doc = Document::from_tree(tree, "about:blank");
        assert!(doc.head().is_valid());
        assert!(doc.body().is_valid());
    }

    #[test]
    fn test_get_element_by_id() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let div = doc.tree_mut().create_element("div");
        doc.tree_mut().set_attr(div, "id", "target");
        doc.tree_mut().append_child(body, div);
        assert_eq!(doc.get_element_by_id("target"), Some(div));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }
}
