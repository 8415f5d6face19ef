//! DOM Tree (arena-based allocation)
//!
//! Linked-sibling arena tree with shadow root side tables. Structural
//! operations keep counters in `DomStats` so callers (and tests) can
//! observe exactly which mutations a patch performed.

use crate::node::{Namespace, Node, NodeData};
use crate::NodeId;
use std::collections::HashMap;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node not found")]
    NotFound,

    #[error("node is not an element")]
    NotAnElement,

    #[error("element already has a shadow root")]
    AlreadyAttached,
}

/// Mutation counters
#[derive(Debug, Clone, Copy, Default)]
pub struct DomStats {
    pub nodes_created: u64,
    pub nodes_moved: u64,
    pub nodes_removed: u64,
    pub attr_writes: u64,
    pub class_writes: u64,
    pub style_writes: u64,
    pub text_writes: u64,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    /// host element -> shadow root
    shadow_roots: HashMap<NodeId, NodeId>,
    /// shadow root -> host element
    shadow_hosts: HashMap<NodeId, NodeId>,
    stats: DomStats,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a new tree containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            shadow_roots: HashMap::new(),
            shadow_hosts: HashMap::new(),
            stats: DomStats::default(),
        }
    }

    /// The document root
    pub fn document(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    /// Number of nodes in the arena (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds only the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Mutation counters
    pub fn stats(&self) -> &DomStats {
        &self.stats
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_valid() {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_valid() {
            self.nodes.get_mut(id.index())
        } else {
            None
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.stats.nodes_created += 1;
        id
    }

    /// Create an HTML element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    /// Create an element in a specific namespace
    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.alloc(Node::element(tag, namespace))
    }

    /// Create a text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content))
    }

    // --- Traversal ---

    /// Parent of a node (NONE if detached, root, or shadow root)
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map_or(NodeId::NONE, |n| n.parent)
    }

    /// First child of a node
    pub fn first_child(&self, id: NodeId) -> NodeId {
        self.get(id).map_or(NodeId::NONE, |n| n.first_child)
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> NodeId {
        self.get(id).map_or(NodeId::NONE, |n| n.next_sibling)
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.first_child(id);
        std::iter::successors(first.is_valid().then_some(first), move |&cur| {
            let next = self.next_sibling(cur);
            next.is_valid().then_some(next)
        })
    }

    /// Parent, crossing a shadow boundary through the host element
    pub fn parent_or_host(&self, id: NodeId) -> NodeId {
        let parent = self.parent(id);
        if parent.is_valid() {
            return parent;
        }
        self.shadow_hosts.get(&id).copied().unwrap_or(NodeId::NONE)
    }

    /// Iterate over successive ancestors, crossing shadow boundaries
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.parent_or_host(id);
        std::iter::successors(first.is_valid().then_some(first), move |&cur| {
            let next = self.parent_or_host(cur);
            next.is_valid().then_some(next)
        })
    }

    /// Check whether a node has a live document position
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id == NodeId::DOCUMENT {
            return true;
        }
        self.ancestors(id).any(|a| a == NodeId::DOCUMENT)
    }

    /// Collect a node and all of its descendants, depth first
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            let mut child = self.first_child(cur);
            let mut children = Vec::new();
            while child.is_valid() {
                children.push(child);
                child = self.next_sibling(child);
            }
            // reverse so DFS visits children in order
            stack.extend(children.into_iter().rev());
        }
        out
    }

    // --- Structural operations ---

    /// Unlink a node from its parent; the node stays in the arena
    pub fn detach(&mut self, child: NodeId) {
        let Some(node) = self.get(child) else { return };
        let parent = node.parent;
        if !parent.is_valid() {
            return;
        }
        let prev = node.prev_sibling;
        let next = node.next_sibling;

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach a node and count it as removed
    pub fn remove(&mut self, child: NodeId) {
        self.detach(child);
        self.stats.nodes_removed += 1;
    }

    /// Append a child, implicitly detaching it from its old position.
    /// Re-parenting an already placed node counts as a move.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, NodeId::NONE);
    }

    /// Insert `child` into `parent` before `anchor` (NONE appends).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: NodeId) {
        if !child.is_valid() || self.get(parent).is_none() {
            return;
        }
        if child == anchor {
            return;
        }
        let was_placed = self.parent(child).is_valid();
        self.detach(child);
        if was_placed {
            self.stats.nodes_moved += 1;
        }

        if anchor.is_valid() && self.parent(anchor) == parent {
            let prev = self.nodes[anchor.index()].prev_sibling;
            self.nodes[child.index()].next_sibling = anchor;
            self.nodes[child.index()].prev_sibling = prev;
            self.nodes[anchor.index()].prev_sibling = child;
            if prev.is_valid() {
                self.nodes[prev.index()].next_sibling = child;
            } else {
                self.nodes[parent.index()].first_child = child;
            }
        } else {
            // append
            let last = self.nodes[parent.index()].last_child;
            self.nodes[child.index()].prev_sibling = last;
            if last.is_valid() {
                self.nodes[last.index()].next_sibling = child;
            } else {
                self.nodes[parent.index()].first_child = child;
            }
            self.nodes[parent.index()].last_child = child;
        }
        self.nodes[child.index()].parent = parent;
    }

    // --- Shadow roots ---

    /// Attach a shadow root to a host element
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        let node = self.get(host).ok_or(DomError::NotFound)?;
        if !node.is_element() {
            return Err(DomError::NotAnElement);
        }
        if self.shadow_roots.contains_key(&host) {
            return Err(DomError::AlreadyAttached);
        }
        let root = self.alloc(Node::shadow_root(host));
        self.shadow_roots.insert(host, root);
        self.shadow_hosts.insert(root, host);
        tracing::debug!(host = host.0, root = root.0, "attached shadow root");
        Ok(root)
    }

    /// Shadow root attached to a host, if any
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_roots.get(&host).copied()
    }

    /// Host element of a shadow root, if `id` is one
    pub fn shadow_host(&self, id: NodeId) -> Option<NodeId> {
        self.shadow_hosts.get(&id).copied()
    }

    // --- Content access ---

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Text content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_text()
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Text(t) = &mut node.data
        {
            t.content = content.to_string();
            self.stats.text_writes += 1;
        }
    }

    /// Get an attribute (class and style are reported from their own
    /// storage)
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let elem = self.get(id)?.as_element()?;
        match name {
            "class" => (!elem.classes.is_empty()).then(|| elem.classes.value()),
            _ => elem.get_attr(name).map(str::to_string),
        }
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) else {
            tracing::warn!(node = id.0, name, "set_attribute on non-element");
            return;
        };
        if name == "class" {
            elem.classes.set_value(value);
            self.stats.class_writes += 1;
        } else {
            elem.set_attr(name, value);
            self.stats.attr_writes += 1;
        }
    }

    /// Remove an attribute from an element
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) else {
            return;
        };
        if name == "class" {
            elem.classes.set_value("");
            self.stats.class_writes += 1;
        } else if elem.remove_attr(name) {
            self.stats.attr_writes += 1;
        }
    }

    /// Add a class token to an element
    pub fn class_add(&mut self, id: NodeId, token: &str) {
        if let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) {
            elem.classes.add(token);
            self.stats.class_writes += 1;
        }
    }

    /// Remove a class token from an element
    pub fn class_remove(&mut self, id: NodeId, token: &str) {
        if let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) {
            elem.classes.remove(token);
            self.stats.class_writes += 1;
        }
    }

    /// Check for a class token
    pub fn class_contains(&self, id: NodeId, token: &str) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .is_some_and(|e| e.classes.contains(token))
    }

    /// Space-joined class value of an element
    pub fn class_value(&self, id: NodeId) -> String {
        self.get(id)
            .and_then(Node::as_element)
            .map(|e| e.classes.value())
            .unwrap_or_default()
    }

    /// Set an inline style declaration
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) {
            elem.set_style(property, value);
            self.stats.style_writes += 1;
        }
    }

    /// Remove an inline style declaration
    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        if let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut)
            && elem.remove_style(property)
        {
            self.stats.style_writes += 1;
        }
    }

    /// Inline style value
    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.get(id)?
            .as_element()?
            .get_style(property)
            .map(str::to_string)
    }

    /// Serialize a subtree to an HTML-ish string (for tests and
    /// debugging; no escaping)
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(t) => out.push_str(&t.content),
            NodeData::Document | NodeData::ShadowRoot { .. } => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for attr in &elem.attrs {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, attr.value));
                }
                if !elem.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", elem.classes.value()));
                }
                if !elem.styles.is_empty() {
                    let style = elem
                        .styles
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    out.push_str(&format!(" style=\"{style}\""));
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str(&format!("</{}>", elem.tag));
            }
        }
    }
}
