//! Component registry
//!
//! Maps custom element tag names to their definitions. Tag names follow
//! the custom element rules: lowercase start, at least one hyphen, and
//! not one of the reserved hyphenated SVG/MathML names. Connections that
//! arrive before their definition park on a per-tag deferred and are
//! replayed when `define` lands.

use crate::component::Component;
use crate::deferred::DeferredId;
use crate::error::ComponentError;
use std::collections::HashMap;
use std::rc::Rc;

/// Style encapsulation mode for a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encapsulation {
    /// Render children directly under the host
    #[default]
    None,
    /// Like `None`, plus a scope marker attribute on the host
    Scoped,
    /// Render into a shadow root attached to the host
    Shadow,
}

/// Host-level event listener declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerDecl {
    /// Event name to listen for
    pub event: String,
    /// Component method invoked with the event
    pub method: String,
}

/// Factory for component instances
pub type Constructor = Rc<dyn Fn() -> Result<Box<dyn Component>, ComponentError>>;

/// Everything the runtime knows about a component tag
pub struct ComponentSpec {
    pub tag: String,
    pub constructor: Constructor,
    pub listeners: Vec<ListenerDecl>,
    pub encapsulation: Encapsulation,
    /// Style mode attached to the host after each render, if any
    pub style_mode: Option<String>,
}

impl ComponentSpec {
    pub fn new<C, F>(tag: impl Into<String>, constructor: F) -> Self
    where
        C: Component + 'static,
        F: Fn() -> C + 'static,
    {
        Self {
            tag: tag.into(),
            constructor: Rc::new(move || Ok(Box::new(constructor()))),
            listeners: Vec::new(),
            encapsulation: Encapsulation::None,
            style_mode: None,
        }
    }

    /// Like `new`, but the factory itself can fail
    pub fn try_new<F>(tag: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Component>, ComponentError> + 'static,
    {
        Self {
            tag: tag.into(),
            constructor: Rc::new(constructor),
            listeners: Vec::new(),
            encapsulation: Encapsulation::None,
            style_mode: None,
        }
    }

    /// Declare a host-level event listener
    pub fn with_listener(mut self, event: impl Into<String>, method: impl Into<String>) -> Self {
        self.listeners.push(ListenerDecl {
            event: event.into(),
            method: method.into(),
        });
        self
    }

    pub fn with_encapsulation(mut self, mode: Encapsulation) -> Self {
        self.encapsulation = mode;
        self
    }

    pub fn with_style_mode(mut self, mode: impl Into<String>) -> Self {
        self.style_mode = Some(mode.into());
        self
    }

    /// Handler method declared for an event name
    pub fn method_for(&self, event: &str) -> Option<&str> {
        self.listeners
            .iter()
            .find(|l| l.event == event)
            .map(|l| l.method.as_str())
    }
}

impl std::fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("tag", &self.tag)
            .field("listeners", &self.listeners)
            .field("encapsulation", &self.encapsulation)
            .field("style_mode", &self.style_mode)
            .finish()
    }
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid custom element name: {0}")]
    InvalidName(String),

    #[error("element already defined: {0}")]
    AlreadyDefined(String),
}

/// Names that contain a hyphen but are reserved by SVG/MathML
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Component definitions keyed by tag name
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    definitions: HashMap<String, Rc<ComponentSpec>>,
    /// Per-tag deferred waiting for a definition
    pending: HashMap<String, DeferredId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component definition
    pub fn define(&mut self, spec: ComponentSpec) -> Result<(), RegistryError> {
        if !Self::is_valid_name(&spec.tag) {
            return Err(RegistryError::InvalidName(spec.tag.clone()));
        }
        if self.definitions.contains_key(&spec.tag) {
            return Err(RegistryError::AlreadyDefined(spec.tag.clone()));
        }
        self.definitions.insert(spec.tag.clone(), Rc::new(spec));
        Ok(())
    }

    pub fn definition(&self, tag: &str) -> Option<&Rc<ComponentSpec>> {
        self.definitions.get(tag)
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    pub fn pending_for(&self, tag: &str) -> Option<DeferredId> {
        self.pending.get(tag).copied()
    }

    pub fn set_pending(&mut self, tag: &str, id: DeferredId) {
        self.pending.insert(tag.to_string(), id);
    }

    pub fn take_pending(&mut self, tag: &str) -> Option<DeferredId> {
        self.pending.remove(tag)
    }

    /// Validate a custom element name
    pub fn is_valid_name(name: &str) -> bool {
        if name.is_empty() || !name.contains('-') {
            return false;
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            _ => return false,
        }
        if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')) {
            return false;
        }
        !RESERVED_NAMES.contains(&name)
    }
}
