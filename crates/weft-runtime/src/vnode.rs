//! Virtual nodes
//!
//! `VNode` is the immutable render output the reconciler diffs against
//! the previous pass. Trees are built with `h()`, which normalizes its
//! children at build time: nulls and bare booleans are dropped, nested
//! lists are flattened, and consecutive string/number children merge
//! into a single text node. Functional components expand through
//! `h_fn` before any diffing happens, so the reconciler only ever sees
//! concrete tags.

use std::rc::Rc;
use weft_dom::{EventHandler, NodeId};

/// Where a ref callback is in the element's life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    /// The element was just created
    Attached(NodeId),
    /// The element was removed from the tree
    Destroyed,
}

/// Callback fired when the element backing a vnode appears or dies
pub type RefCallback = Rc<dyn Fn(RefTarget)>;

/// Attribute value
#[derive(Clone)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Event handler, carried under an `on*` key
    Handler(EventHandler),
    /// Explicit absence; diffing treats it as a removal
    Null,
}

impl AttrValue {
    /// Serialized form, or None for values that never reach the DOM
    pub fn as_attr_string(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Handler(_) | Self::Null => None,
        }
    }

    /// Truthiness used for boolean attributes
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty() && s != "false",
            Self::Int(i) => *i != 0,
            Self::Bool(b) => *b,
            Self::Handler(_) => true,
            Self::Null => false,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Handler(_) => write!(f, "Handler"),
            Self::Null => write!(f, "Null"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Attribute bag passed to `h()`
#[derive(Default)]
pub struct VAttrs {
    pub attrs: Vec<(String, AttrValue)>,
    pub styles: Vec<(String, String)>,
    /// Conditional class tokens, expanded into `class` at build time
    pub class_map: Vec<(String, bool)>,
    pub key: Option<String>,
    pub ref_cb: Option<RefCallback>,
}

impl VAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Register an event handler under `on<event>`
    pub fn on(mut self, event: &str, handler: impl Fn(&weft_dom::Event) + 'static) -> Self {
        self.attrs
            .push((format!("on{event}"), AttrValue::Handler(Rc::new(handler))));
        self
    }

    /// Include a class token when `enabled` is true
    pub fn class_if(mut self, token: impl Into<String>, enabled: bool) -> Self {
        self.class_map.push((token.into(), enabled));
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.push((property.into(), value.into()));
        self
    }

    /// Diff identity key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Ref callback fired on element creation and destruction
    pub fn ref_fn(mut self, f: impl Fn(RefTarget) + 'static) -> Self {
        self.ref_cb = Some(Rc::new(f));
        self
    }
}

/// Child argument to `h()`
pub enum Child {
    Node(VNode),
    Text(String),
    Int(i64),
    /// Dropped at build time (conditional rendering)
    Bool(bool),
    /// Dropped at build time
    Empty,
    /// Flattened at build time
    Many(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(v: VNode) -> Self {
        Self::Node(v)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Child {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Child {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(c) => c.into(),
            None => Self::Empty,
        }
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(list: Vec<T>) -> Self {
        Self::Many(list.into_iter().map(Into::into).collect())
    }
}

/// A node in the virtual tree
#[derive(Clone)]
pub struct VNode {
    /// Element tag; None for text nodes
    pub tag: Option<String>,
    /// Text content for text nodes
    pub text: Option<String>,
    pub attrs: Vec<(String, AttrValue)>,
    pub styles: Vec<(String, String)>,
    pub children: Vec<VNode>,
    pub key: Option<String>,
    pub ref_cb: Option<RefCallback>,
    /// Backing element, filled in by the reconciler
    pub dom_node: NodeId,
    /// This is a slot whose projected content is app-owned
    pub(crate) slot_projected: bool,
}

impl VNode {
    pub fn text_node(content: impl Into<String>) -> Self {
        Self {
            tag: None,
            text: Some(content.into()),
            attrs: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
            key: None,
            ref_cb: None,
            dom_node: NodeId::NONE,
            slot_projected: false,
        }
    }

    fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            text: None,
            attrs: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
            key: None,
            ref_cb: None,
            dom_node: NodeId::NONE,
            slot_projected: false,
        }
    }

    pub fn is_text(&self) -> bool {
        self.tag.is_none()
    }

    /// Look up an attribute's serialized value
    pub fn attr_str(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_attr_string())
    }

    /// Two vnodes describe the same element identity
    pub fn same_identity(&self, other: &Self) -> bool {
        self.tag == other.tag && self.key == other.key
    }

    /// Collect every ref callback in this subtree, depth first
    pub(crate) fn collect_refs(&self, out: &mut Vec<RefCallback>) {
        if let Some(cb) = &self.ref_cb {
            out.push(Rc::clone(cb));
        }
        for child in &self.children {
            child.collect_refs(out);
        }
    }
}

impl std::fmt::Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VNode")
            .field("tag", &self.tag)
            .field("text", &self.text)
            .field("key", &self.key)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("dom_node", &self.dom_node)
            .finish()
    }
}

/// Build an element vnode, normalizing children
pub fn h(tag: &str, data: VAttrs, children: Vec<Child>) -> VNode {
    let VAttrs {
        mut attrs,
        styles,
        class_map,
        key,
        ref_cb,
    } = data;

    // conditional classes fold into the class attribute
    let enabled: Vec<&str> = class_map
        .iter()
        .filter(|(_, on)| *on)
        .map(|(t, _)| t.as_str())
        .collect();
    if !enabled.is_empty() {
        let joined = enabled.join(" ");
        if let Some((_, existing)) = attrs.iter_mut().find(|(n, _)| n == "class") {
            let base = existing.as_attr_string().unwrap_or_default();
            *existing = AttrValue::Str(if base.is_empty() {
                joined
            } else {
                format!("{base} {joined}")
            });
        } else {
            attrs.push(("class".to_string(), AttrValue::Str(joined)));
        }
    }

    let mut node = VNode::element(tag);
    node.attrs = attrs;
    node.styles = styles;
    node.key = key;
    node.ref_cb = ref_cb;
    node.children = flatten_children(children);
    node
}

/// Build a bare text vnode
pub fn text(content: impl Into<String>) -> VNode {
    VNode::text_node(content)
}

/// Expand a functional component at build time
pub fn h_fn<F>(factory: F, data: VAttrs, children: Vec<Child>) -> VNode
where
    F: Fn(VAttrs, Vec<VNode>) -> VNode,
{
    factory(data, flatten_children(children))
}

fn flatten_children(children: Vec<Child>) -> Vec<VNode> {
    let mut out = Vec::new();
    for child in children {
        push_child(&mut out, child);
    }
    out
}

fn push_child(out: &mut Vec<VNode>, child: Child) {
    match child {
        Child::Empty | Child::Bool(_) => {}
        Child::Text(s) => merge_text(out, &s),
        Child::Int(i) => merge_text(out, &i.to_string()),
        Child::Node(v) => out.push(v),
        Child::Many(list) => {
            for c in list {
                push_child(out, c);
            }
        }
    }
}

fn merge_text(out: &mut Vec<VNode>, content: &str) {
    if let Some(last) = out.last_mut()
        && last.is_text()
        && let Some(t) = &mut last.text
    {
        t.push_str(content);
        return;
    }
    out.push(VNode::text_node(content));
}
