//! Shared runtime context
//!
//! Per-host bookkeeping lives here, keyed by the host element's node
//! id, so component instances stay plain structs with no back-pointers
//! into the runtime.

use crate::component::Component;
use crate::deferred::DeferredId;
use crate::registry::ComponentSpec;
use crate::runtime::Runtime;
use crate::vnode::VNode;
use std::collections::HashMap;
use std::rc::Rc;
use weft_dom::{Event, NodeId};

/// Callback invoked once a host finishes loading
pub type ReadyCallback = Box<dyn FnOnce(&mut Runtime)>;

/// Light-DOM children captured from a host at connect time, grouped by
/// the slot they target
#[derive(Debug, Clone, Default)]
pub struct ProjectedContent {
    pub default_nodes: Vec<NodeId>,
    pub named: HashMap<String, Vec<NodeId>>,
}

impl ProjectedContent {
    pub fn is_empty(&self) -> bool {
        self.default_nodes.is_empty() && self.named.is_empty()
    }

    /// Nodes targeting a slot name (None for the default slot)
    pub fn nodes_for(&self, name: Option<&str>) -> Vec<NodeId> {
        match name {
            Some(n) => self.named.get(n).cloned().unwrap_or_default(),
            None => self.default_nodes.clone(),
        }
    }

    /// Every captured node, in capture order
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = self.default_nodes.clone();
        for nodes in self.named.values() {
            ids.extend_from_slice(nodes);
        }
        ids
    }
}

/// Lifecycle state for one connected host element
pub struct HostState {
    pub tag: String,
    pub spec: Option<Rc<ComponentSpec>>,
    pub instance: Option<Box<dyn Component>>,
    /// Render output of the previous pass
    pub vnode: Option<VNode>,
    pub content: ProjectedContent,
    /// Events received before the instance existed, in arrival order
    pub queued_events: Vec<(String, Event)>,
    pub ready_callbacks: Vec<ReadyCallback>,
    /// Descendant hosts whose initial render waits on ours
    pub render_waiters: Vec<NodeId>,
    /// Child hosts that have not finished loading yet
    pub loading_children: Vec<NodeId>,
    /// Nearest ancestor host still loading when we connected
    pub ancestor: Option<NodeId>,
    pub update_queued: bool,
    pub rendering: bool,
    pub has_rendered: bool,
    pub has_loaded: bool,
    pub disconnected: bool,
    /// Deferred id a pre-render hook is suspended on
    pub pending_hook: Option<DeferredId>,
}

impl HostState {
    pub fn new(tag: impl Into<String>, content: ProjectedContent) -> Self {
        Self {
            tag: tag.into(),
            spec: None,
            instance: None,
            vnode: None,
            content,
            queued_events: Vec::new(),
            ready_callbacks: Vec::new(),
            render_waiters: Vec::new(),
            loading_children: Vec::new(),
            ancestor: None,
            update_queued: false,
            rendering: false,
            has_rendered: false,
            has_loaded: false,
            disconnected: false,
            pending_hook: None,
        }
    }
}

/// Host state table shared across the runtime
#[derive(Default)]
pub struct RuntimeContext {
    hosts: HashMap<NodeId, HostState>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host: NodeId) -> Option<&HostState> {
        self.hosts.get(&host)
    }

    pub fn get_mut(&mut self, host: NodeId) -> Option<&mut HostState> {
        self.hosts.get_mut(&host)
    }

    pub fn insert(&mut self, host: NodeId, state: HostState) {
        self.hosts.insert(host, state);
    }

    pub fn remove(&mut self, host: NodeId) -> Option<HostState> {
        self.hosts.remove(&host)
    }

    pub fn contains(&self, host: NodeId) -> bool {
        self.hosts.contains_key(&host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn host_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.hosts.keys().copied()
    }
}
