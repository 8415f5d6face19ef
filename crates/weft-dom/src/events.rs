//! DOM events
//!
//! Per-(node, event) listener table. At most one handler is registered
//! for a given node and event name; setting a handler replaces the
//! previous one, so re-renders never stack duplicate listeners.

use crate::NodeId;
use std::collections::HashMap;
use std::rc::Rc;

/// An event delivered to a listener
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name (e.g. "click")
    pub name: String,
    /// Opaque payload
    pub detail: String,
}

impl Event {
    /// Create an event with an empty payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: String::new(),
        }
    }

    /// Attach a payload
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Event handler callback
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Listener table keyed by (node, event name)
#[derive(Default)]
pub struct ListenerMap {
    handlers: HashMap<(NodeId, String), EventHandler>,
}

impl ListenerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any existing one for this
    /// node/event pair
    pub fn set(&mut self, node: NodeId, event: &str, handler: EventHandler) {
        self.handlers.insert((node, event.to_string()), handler);
    }

    /// Look up a handler; the returned `Rc` lets callers invoke it
    /// outside any borrow of the table
    pub fn get(&self, node: NodeId, event: &str) -> Option<EventHandler> {
        self.handlers.get(&(node, event.to_string())).cloned()
    }

    /// Remove the handler for a node/event pair
    pub fn remove(&mut self, node: NodeId, event: &str) -> bool {
        self.handlers.remove(&(node, event.to_string())).is_some()
    }

    /// Remove every handler registered on a node
    pub fn remove_all(&mut self, node: NodeId) {
        self.handlers.retain(|(n, _), _| *n != node);
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ListenerMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerMap")
            .field("len", &self.handlers.len())
            .finish()
    }
}
