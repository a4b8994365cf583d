//! Skiff DOM - arena-backed document trees
//!
//! Nodes live in a flat arena and refer to each other by `NodeId`, so
//! handles stay valid across arbitrary tree surgery. Detached subtrees
//! keep their arena slots; the runtime treats attachment to the document
//! root as the liveness test.

mod document;
mod node;
mod serialize;
mod tree;

pub use document::Document;
pub use node::{Attribute, ElementData, Node, NodeData};
pub use serialize::serialize;
pub use tree::{Ancestors, Children, Descendants, DomTree};

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The document node every tree is created with
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id refers to a node at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index, for hosts that need a serializable handle
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Rebuild an id from `to_raw`
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}
