//! Weft DOM - live document tree
//!
//! Arena-allocated document tree the Weft reconciler patches.
//! Nodes are addressed by `NodeId` handles into a per-tree arena,
//! so component state can live in side tables keyed by handle.

mod events;
mod node;
mod token_list;
mod tree;

pub use events::{Event, EventHandler, ListenerMap};
pub use node::{Attribute, ElementData, Namespace, Node, NodeData, TextData};
pub use token_list::TokenList;
pub use tree::{DomError, DomResult, DomStats, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// The document root node
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Check whether this handle points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
