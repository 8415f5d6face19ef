//! Reconciler
//!
//! Diffs the previous render's vnode tree against the new one and
//! applies the minimal set of mutations to the live tree. Children are
//! matched with a two-ended scan (old-start/old-end/new-start/new-end)
//! plus a lazily built key map for the middle, so keyed reorders move
//! nodes instead of recreating them. A tag change always breaks a
//! match, even under an equal key.
//!
//! Structural effects that the runtime must act on after the patch
//! (ref callbacks, removed subtrees) are collected in `PatchEffects`
//! rather than applied inline, keeping the diff itself free of
//! lifecycle reentrancy.

use crate::context::ProjectedContent;
use crate::registry::Encapsulation;
use crate::vnode::{AttrValue, RefCallback, RefTarget, VNode};
use std::collections::HashMap;
use std::rc::Rc;
use weft_dom::{DomTree, ListenerMap, Namespace, NodeId};

/// Attributes rendered by presence/absence rather than value
const BOOLEAN_ATTRS: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "defer",
    "disabled",
    "formnovalidate",
    "hidden",
    "loop",
    "multiple",
    "muted",
    "open",
    "readonly",
    "required",
    "selected",
];

/// Everything a patch pass needs from the runtime
pub struct PatchContext<'a> {
    pub dom: &'a mut DomTree,
    pub listeners: &'a mut ListenerMap,
    /// Captured light-DOM content available for slot projection
    pub content: &'a mut ProjectedContent,
    pub encapsulation: Encapsulation,
    /// Scope marker written to the host on the first render when scoped
    pub scope_id: Option<&'a str>,
    /// Server-render marker written to the host on the first render
    pub ssr_id: Option<&'a str>,
}

/// Deferred consequences of a patch pass
#[derive(Default)]
pub struct PatchEffects {
    /// Roots of subtrees the patch unlinked
    pub removed: Vec<NodeId>,
    /// Ref callbacks to fire, in patch order
    pub refs: Vec<(RefCallback, RefTarget)>,
}

/// Patch a host element's rendered output.
///
/// `old` is the stored tree from the previous pass (None on the first
/// render); `new` is consumed, annotated with the element ids backing
/// each vnode, and returned for storage.
pub fn patch(
    ctx: PatchContext<'_>,
    host: NodeId,
    old: Option<&VNode>,
    mut new: VNode,
    is_update: bool,
) -> (VNode, PatchEffects) {
    let use_slots = ctx.encapsulation != Encapsulation::Shadow;
    let mut patcher = Patcher {
        dom: ctx.dom,
        listeners: ctx.listeners,
        content: ctx.content,
        use_slots,
        effects: PatchEffects::default(),
    };

    // render target: the shadow root when encapsulated, else the host
    let target = match ctx.encapsulation {
        Encapsulation::Shadow => match patcher.dom.shadow_root(host) {
            Some(root) => root,
            None => match patcher.dom.attach_shadow(host) {
                Ok(root) => root,
                Err(err) => {
                    tracing::warn!(host = host.index(), %err, "shadow attach failed, rendering light");
                    host
                }
            },
        },
        _ => host,
    };

    if !is_update {
        if ctx.encapsulation == Encapsulation::Scoped
            && let Some(scope) = ctx.scope_id
        {
            patcher.dom.set_attribute(host, "data-scope", scope);
        }
        if let Some(ssr) = ctx.ssr_id {
            patcher.dom.set_attribute(host, "data-weft-ssr", ssr);
        }
    }

    new.dom_node = host;
    let empty_attrs: &[(String, AttrValue)] = &[];
    let empty_styles: &[(String, String)] = &[];
    patcher.update_attributes(host, old.map_or(empty_attrs, |o| &o.attrs), &new.attrs);
    patcher.update_styles(host, old.map_or(empty_styles, |o| &o.styles), &new.styles);

    let no_children: &[VNode] = &[];
    let old_children = old.map_or(no_children, |o| &o.children);
    patcher.patch_children(target, old_children, &mut new.children, false);

    (new, patcher.effects)
}

struct Patcher<'a> {
    dom: &'a mut DomTree,
    listeners: &'a mut ListenerMap,
    content: &'a mut ProjectedContent,
    /// Slot elements project content (non-shadow encapsulation)
    use_slots: bool,
    effects: PatchEffects,
}

impl Patcher<'_> {
    /// Two-ended keyed children diff
    fn patch_children(&mut self, parent: NodeId, old: &[VNode], new: &mut [VNode], svg: bool) {
        if old.is_empty() && new.is_empty() {
            return;
        }

        let mut old_start: isize = 0;
        let mut old_end: isize = old.len() as isize - 1;
        let mut new_start: isize = 0;
        let mut new_end: isize = new.len() as isize - 1;
        let mut consumed = vec![false; old.len()];
        let mut key_index: Option<HashMap<&str, usize>> = None;

        while old_start <= old_end && new_start <= new_end {
            if consumed[old_start as usize] {
                old_start += 1;
                continue;
            }
            if consumed[old_end as usize] {
                old_end -= 1;
                continue;
            }
            let (os, oe) = (old_start as usize, old_end as usize);
            let (ns, ne) = (new_start as usize, new_end as usize);

            if old[os].same_identity(&new[ns]) {
                self.patch_node(&old[os], &mut new[ns], svg);
                old_start += 1;
                new_start += 1;
            } else if old[oe].same_identity(&new[ne]) {
                self.patch_node(&old[oe], &mut new[ne], svg);
                old_end -= 1;
                new_end -= 1;
            } else if old[os].same_identity(&new[ne]) {
                // old head moved toward the tail
                self.patch_node(&old[os], &mut new[ne], svg);
                let anchor = self.dom.next_sibling(old[oe].dom_node);
                self.dom.insert_before(parent, old[os].dom_node, anchor);
                old_start += 1;
                new_end -= 1;
            } else if old[oe].same_identity(&new[ns]) {
                // old tail moved toward the head
                self.patch_node(&old[oe], &mut new[ns], svg);
                self.dom.insert_before(parent, old[oe].dom_node, old[os].dom_node);
                old_end -= 1;
                new_start += 1;
            } else {
                let matched = {
                    let map = key_index.get_or_insert_with(|| {
                        let mut m = HashMap::new();
                        for (i, node) in old.iter().enumerate().take(oe + 1).skip(os) {
                            if let Some(k) = &node.key {
                                m.insert(k.as_str(), i);
                            }
                        }
                        m
                    });
                    new[ns].key.as_deref().and_then(|k| map.get(k).copied())
                };

                match matched {
                    // a key match only holds the element if the tag held too
                    Some(i) if !consumed[i] && old[i].tag == new[ns].tag => {
                        self.patch_node(&old[i], &mut new[ns], svg);
                        consumed[i] = true;
                        self.dom.insert_before(parent, old[i].dom_node, old[os].dom_node);
                    }
                    _ => {
                        let created = self.create_node(&mut new[ns], svg);
                        self.dom.insert_before(parent, created, old[os].dom_node);
                    }
                }
                new_start += 1;
            }
        }

        if old_start > old_end {
            // old exhausted: mount the remaining new nodes before the
            // node that follows the new range (append when at the end)
            let anchor = new
                .get(new_end as usize + 1)
                .map_or(NodeId::NONE, |n| n.dom_node);
            let mut i = new_start;
            while i <= new_end {
                let created = self.create_node(&mut new[i as usize], svg);
                self.dom.insert_before(parent, created, anchor);
                i += 1;
            }
        } else if new_start > new_end {
            // new exhausted: unmount what remains of old
            let mut i = old_start;
            while i <= old_end {
                if !consumed[i as usize] {
                    self.remove_vnode(&old[i as usize]);
                }
                i += 1;
            }
        }
    }

    /// Patch one matched old/new pair in place
    fn patch_node(&mut self, old: &VNode, new: &mut VNode, svg: bool) {
        let elm = old.dom_node;
        new.dom_node = elm;

        if new.tag.is_none() {
            // text fast path: write only on change
            if old.text != new.text
                && let Some(content) = &new.text
            {
                self.dom.set_text(elm, content);
            }
            return;
        }

        self.update_attributes(elm, &old.attrs, &new.attrs);
        self.update_styles(elm, &old.styles, &new.styles);

        if self.use_slots && old.slot_projected {
            // projected content is app-owned; leave it alone
            new.slot_projected = true;
            return;
        }

        let child_svg = child_namespace(new.tag.as_deref().unwrap_or(""), svg);
        self.patch_children(elm, &old.children, &mut new.children, child_svg);
    }

    /// Create the element (or text node) backing a vnode, depth first
    fn create_node(&mut self, vnode: &mut VNode, svg: bool) -> NodeId {
        let Some(tag) = vnode.tag.clone() else {
            let id = self.dom.create_text(vnode.text.as_deref().unwrap_or(""));
            vnode.dom_node = id;
            return id;
        };

        let node_svg = svg || tag == "svg";
        let id = if node_svg {
            self.dom.create_element_ns(&tag, Namespace::Svg)
        } else {
            self.dom.create_element(&tag)
        };
        vnode.dom_node = id;

        self.update_attributes(id, &[], &vnode.attrs);
        self.update_styles(id, &[], &vnode.styles);
        if let Some(cb) = &vnode.ref_cb {
            self.effects.refs.push((Rc::clone(cb), RefTarget::Attached(id)));
        }

        if self.use_slots && tag == "slot" {
            let name = vnode.attr_str("name");
            let projected = self.content.nodes_for(name.as_deref());
            if !projected.is_empty() {
                for node in projected {
                    self.dom.append_child(id, node);
                }
                vnode.slot_projected = true;
                return id;
            }
            // no content targets this slot: render the fallback children
        }

        let child_svg = child_namespace(&tag, svg);
        for child in &mut vnode.children {
            let created = self.create_node(child, child_svg);
            self.dom.append_child(id, created);
        }
        id
    }

    /// Unlink a vnode's element and queue its teardown effects
    fn remove_vnode(&mut self, vnode: &VNode) {
        let mut refs = Vec::new();
        vnode.collect_refs(&mut refs);
        for cb in refs {
            self.effects.refs.push((cb, RefTarget::Destroyed));
        }
        if vnode.dom_node.is_valid() {
            self.dom.remove(vnode.dom_node);
            self.effects.removed.push(vnode.dom_node);
        }
    }

    /// Diff attribute lists: removals first, then additions/changes
    fn update_attributes(
        &mut self,
        elm: NodeId,
        old: &[(String, AttrValue)],
        new: &[(String, AttrValue)],
    ) {
        for (name, old_value) in old {
            if new.iter().any(|(n, _)| n == name) {
                continue;
            }
            self.remove_attr(elm, name, old_value);
        }
        for (name, new_value) in new {
            let old_value = old.iter().find(|(n, _)| n == name).map(|(_, v)| v);
            if old_value == Some(new_value) {
                continue;
            }
            self.set_attr(elm, name, old_value, new_value);
        }
    }

    fn remove_attr(&mut self, elm: NodeId, name: &str, old_value: &AttrValue) {
        if let Some(event) = event_name(name) {
            self.listeners.remove(elm, &event);
            return;
        }
        if name == "class" {
            let old_class = old_value.as_attr_string().unwrap_or_default();
            for token in old_class.split_whitespace() {
                self.dom.class_remove(elm, token);
            }
            return;
        }
        self.dom.remove_attribute(elm, name);
    }

    fn set_attr(&mut self, elm: NodeId, name: &str, old: Option<&AttrValue>, new: &AttrValue) {
        if let Some(event) = event_name(name) {
            match new {
                AttrValue::Handler(handler) => {
                    // setting replaces the previous handler
                    self.listeners.set(elm, &event, Rc::clone(handler));
                }
                _ => {
                    self.listeners.remove(elm, &event);
                }
            }
            return;
        }

        if name == "class" {
            let old_class = old.and_then(AttrValue::as_attr_string).unwrap_or_default();
            let new_class = new.as_attr_string().unwrap_or_default();
            let old_tokens: Vec<&str> = old_class.split_whitespace().collect();
            let new_tokens: Vec<&str> = new_class.split_whitespace().collect();
            for token in &old_tokens {
                if !new_tokens.contains(token) {
                    self.dom.class_remove(elm, token);
                }
            }
            for token in &new_tokens {
                if !old_tokens.contains(token) {
                    self.dom.class_add(elm, token);
                }
            }
            return;
        }

        if BOOLEAN_ATTRS.contains(&name) {
            if new.is_truthy() {
                self.dom.set_attribute(elm, name, "");
            } else {
                self.dom.remove_attribute(elm, name);
            }
            return;
        }

        match new.as_attr_string() {
            Some(value) => self.dom.set_attribute(elm, name, &value),
            None => self.dom.remove_attribute(elm, name),
        }
    }

    /// Diff style declarations key by key
    fn update_styles(&mut self, elm: NodeId, old: &[(String, String)], new: &[(String, String)]) {
        for (property, _) in old {
            let kept = new.iter().any(|(p, v)| p == property && !v.is_empty());
            if !kept {
                self.dom.remove_style(elm, property);
            }
        }
        for (property, value) in new {
            if value.is_empty() {
                continue;
            }
            let unchanged = old.iter().any(|(p, v)| p == property && v == value);
            if !unchanged {
                self.dom.set_style(elm, property, value);
            }
        }
    }
}

/// Namespace the children of `tag` render in
fn child_namespace(tag: &str, svg: bool) -> bool {
    // foreignObject drops its subtree back into HTML
    (svg || tag == "svg") && tag != "foreignObject"
}

/// Event name for handler-shaped attribute keys (`on*`)
fn event_name(attr: &str) -> Option<String> {
    let rest = attr.strip_prefix("on")?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{h, Child, VAttrs};

    fn harness() -> (DomTree, ListenerMap, ProjectedContent, NodeId) {
        let mut dom = DomTree::new();
        let host = dom.create_element("my-host");
        let doc = dom.document();
        dom.append_child(doc, host);
        (dom, ListenerMap::new(), ProjectedContent::default(), host)
    }

    fn run_patch(
        dom: &mut DomTree,
        listeners: &mut ListenerMap,
        content: &mut ProjectedContent,
        host: NodeId,
        old: Option<&VNode>,
        new: VNode,
    ) -> (VNode, PatchEffects) {
        let ctx = PatchContext {
            dom,
            listeners,
            content,
            encapsulation: Encapsulation::None,
            scope_id: None,
            ssr_id: None,
        };
        patch(ctx, host, old, new, old.is_some())
    }

    fn keyed_list(keys: &[&str]) -> VNode {
        let items = keys
            .iter()
            .map(|k| Child::from(h("li", VAttrs::new().key(*k), vec![Child::from(*k)])))
            .collect();
        h("my-host", VAttrs::new(), items)
    }

    #[test]
    fn test_initial_mount() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "div",
                VAttrs::new().attr("id", "x"),
                vec![Child::from("hello")],
            ))],
        );

        let (stored, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, tree);

        assert_eq!(dom.outer_html(host), "<my-host><div id=\"x\">hello</div></my-host>");
        assert!(stored.children[0].dom_node.is_valid());
    }

    #[test]
    fn test_insert_in_middle_reuses_neighbors() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let (old, _) = run_patch(
            &mut dom,
            &mut listeners,
            &mut content,
            host,
            None,
            keyed_list(&["a", "b"]),
        );
        let created_before = dom.stats().nodes_created;

        run_patch(
            &mut dom,
            &mut listeners,
            &mut content,
            host,
            Some(&old),
            keyed_list(&["a", "c", "b"]),
        );

        // one new element and its text; a and b untouched
        assert_eq!(dom.stats().nodes_created - created_before, 2);
        assert_eq!(dom.stats().nodes_removed, 0);
        assert_eq!(dom.stats().nodes_moved, 0);
        assert_eq!(
            dom.outer_html(host),
            "<my-host><li>a</li><li>c</li><li>b</li></my-host>"
        );
    }

    #[test]
    fn test_keyed_reorder_moves_instead_of_recreating() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let (old, _) = run_patch(
            &mut dom,
            &mut listeners,
            &mut content,
            host,
            None,
            keyed_list(&["a", "b", "c"]),
        );
        let created_before = dom.stats().nodes_created;
        let ids: Vec<NodeId> = old.children.iter().map(|c| c.dom_node).collect();

        let (new, _) = run_patch(
            &mut dom,
            &mut listeners,
            &mut content,
            host,
            Some(&old),
            keyed_list(&["c", "a", "b"]),
        );

        assert_eq!(dom.stats().nodes_created, created_before);
        assert_eq!(
            dom.outer_html(host),
            "<my-host><li>c</li><li>a</li><li>b</li></my-host>"
        );
        // same elements, new order
        assert_eq!(new.children[0].dom_node, ids[2]);
        assert_eq!(new.children[1].dom_node, ids[0]);
    }

    #[test]
    fn test_tag_change_breaks_key_match() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let old_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h("div", VAttrs::new().key("k"), vec![]))],
        );
        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, old_tree);
        let old_elm = old.children[0].dom_node;

        let new_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h("span", VAttrs::new().key("k"), vec![]))],
        );
        let (new, effects) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), new_tree);

        assert_ne!(new.children[0].dom_node, old_elm);
        assert_eq!(effects.removed, vec![old_elm]);
        assert_eq!(dom.outer_html(host), "<my-host><span></span></my-host>");
    }

    #[test]
    fn test_attr_diff_removes_then_updates() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let old_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "input",
                VAttrs::new().attr("id", "x").attr("title", "old"),
                vec![],
            ))],
        );
        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, old_tree);
        let input = old.children[0].dom_node;

        let new_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "input",
                VAttrs::new().attr("title", "new"),
                vec![],
            ))],
        );
        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), new_tree);

        assert_eq!(dom.attribute(input, "id"), None);
        assert_eq!(dom.attribute(input, "title").as_deref(), Some("new"));
    }

    #[test]
    fn test_boolean_attr_presence() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let make = |on: bool| {
            h(
                "my-host",
                VAttrs::new(),
                vec![Child::from(h(
                    "input",
                    VAttrs::new().attr("disabled", on),
                    vec![],
                ))],
            )
        };

        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, make(true));
        let input = old.children[0].dom_node;
        assert_eq!(dom.attribute(input, "disabled").as_deref(), Some(""));

        let (old, _) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make(false));
        assert_eq!(dom.attribute(input, "disabled"), None);

        // the string "false" is falsy for boolean attributes
        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "input",
                VAttrs::new().attr("disabled", "false"),
                vec![],
            ))],
        );
        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), tree);
        assert_eq!(dom.attribute(input, "disabled"), None);
    }

    #[test]
    fn test_class_diff_is_token_wise_and_idempotent() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let make = |class: &str| {
            h(
                "my-host",
                VAttrs::new(),
                vec![Child::from(h(
                    "div",
                    VAttrs::new().attr("class", class),
                    vec![],
                ))],
            )
        };

        let (old, _) =
            run_patch(&mut dom, &mut listeners, &mut content, host, None, make("a b"));
        let div = old.children[0].dom_node;
        let writes = dom.stats().class_writes;

        // identical class value: zero writes
        let (old, _) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make("a b"));
        assert_eq!(dom.stats().class_writes, writes);

        // token change: one remove, one add
        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make("a c"));
        assert_eq!(dom.stats().class_writes, writes + 2);
        assert_eq!(dom.class_value(div), "a c");
    }

    #[test]
    fn test_style_diff_clears_absent_keys() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let old_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "div",
                VAttrs::new().style("color", "red").style("width", "10px"),
                vec![],
            ))],
        );
        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, old_tree);
        let div = old.children[0].dom_node;

        let new_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "div",
                VAttrs::new().style("color", "blue"),
                vec![],
            ))],
        );
        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), new_tree);

        assert_eq!(dom.style(div, "color").as_deref(), Some("blue"));
        assert_eq!(dom.style(div, "width"), None);
    }

    #[test]
    fn test_handler_replacement_keeps_one_listener() {
        use std::cell::Cell;

        let (mut dom, mut listeners, mut content, host) = harness();
        let count = std::rc::Rc::new(Cell::new(0));

        let c1 = std::rc::Rc::clone(&count);
        let old_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "button",
                VAttrs::new().on("click", move |_| c1.set(c1.get() + 1)),
                vec![],
            ))],
        );
        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, old_tree);
        let button = old.children[0].dom_node;

        let c2 = std::rc::Rc::clone(&count);
        let new_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "button",
                VAttrs::new().on("click", move |_| c2.set(c2.get() + 10)),
                vec![],
            ))],
        );
        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), new_tree);

        assert_eq!(listeners.len(), 1);
        let handler = listeners.get(button, "click").unwrap();
        handler(&weft_dom::Event::new("click"));
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn test_text_write_only_on_change() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let make = |t: &str| h("my-host", VAttrs::new(), vec![Child::from(t)]);

        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, make("hi"));
        let writes = dom.stats().text_writes;

        let (old, _) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make("hi"));
        assert_eq!(dom.stats().text_writes, writes);

        run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make("bye"));
        assert_eq!(dom.stats().text_writes, writes + 1);
    }

    #[test]
    fn test_svg_namespace_and_foreign_object() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "svg",
                VAttrs::new(),
                vec![
                    Child::from(h("path", VAttrs::new(), vec![])),
                    Child::from(h(
                        "foreignObject",
                        VAttrs::new(),
                        vec![Child::from(h("div", VAttrs::new(), vec![]))],
                    )),
                ],
            ))],
        );

        let (stored, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, tree);
        let svg = &stored.children[0];
        let path = svg.children[0].dom_node;
        let fo = svg.children[1].dom_node;
        let div = svg.children[1].children[0].dom_node;

        let ns = |id: NodeId| dom.get(id).unwrap().as_element().unwrap().namespace;
        assert_eq!(ns(svg.dom_node), Namespace::Svg);
        assert_eq!(ns(path), Namespace::Svg);
        assert_eq!(ns(fo), Namespace::Svg);
        // foreignObject children fall back to HTML
        assert_eq!(ns(div), Namespace::Html);
    }

    #[test]
    fn test_slot_projects_captured_content() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let light = dom.create_text("projected");
        content.default_nodes.push(light);

        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "slot",
                VAttrs::new(),
                vec![Child::from("fallback")],
            ))],
        );
        let (stored, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, tree);

        assert!(stored.children[0].slot_projected);
        assert_eq!(
            dom.outer_html(host),
            "<my-host><slot>projected</slot></my-host>"
        );
    }

    #[test]
    fn test_slot_fallback_without_content() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "slot",
                VAttrs::new().attr("name", "header"),
                vec![Child::from("fallback")],
            ))],
        );
        let (stored, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, tree);

        assert!(!stored.children[0].slot_projected);
        assert_eq!(
            dom.outer_html(host),
            "<my-host><slot name=\"header\">fallback</slot></my-host>"
        );
    }

    #[test]
    fn test_projected_slot_children_survive_updates() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let light = dom.create_text("projected");
        content.default_nodes.push(light);

        let make = |title: &str| {
            h(
                "my-host",
                VAttrs::new(),
                vec![Child::from(h(
                    "slot",
                    VAttrs::new().attr("title", title),
                    vec![Child::from("fallback")],
                ))],
            )
        };
        let (old, _) = run_patch(&mut dom, &mut listeners, &mut content, host, None, make("a"));
        let (new, _) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), make("b"));

        // attr updated, projected child untouched
        assert!(new.children[0].slot_projected);
        assert_eq!(
            dom.outer_html(host),
            "<my-host><slot title=\"b\">projected</slot></my-host>"
        );
    }

    #[test]
    fn test_shadow_render_targets_shadow_root() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h("div", VAttrs::new(), vec![]))],
        );
        let ctx = PatchContext {
            dom: &mut dom,
            listeners: &mut listeners,
            content: &mut content,
            encapsulation: Encapsulation::Shadow,
            scope_id: None,
            ssr_id: None,
        };
        let (stored, _) = patch(ctx, host, None, tree, false);

        let root = dom.shadow_root(host).unwrap();
        let children: Vec<_> = dom.children(root).collect();
        assert_eq!(children, vec![stored.children[0].dom_node]);
        assert!(dom.children(host).next().is_none());
    }

    #[test]
    fn test_scoped_render_marks_host() {
        let (mut dom, mut listeners, mut content, host) = harness();
        let tree = h("my-host", VAttrs::new(), vec![]);
        let ctx = PatchContext {
            dom: &mut dom,
            listeners: &mut listeners,
            content: &mut content,
            encapsulation: Encapsulation::Scoped,
            scope_id: Some("sc-my-host"),
            ssr_id: None,
        };
        patch(ctx, host, None, tree, false);

        assert_eq!(dom.attribute(host, "data-scope").as_deref(), Some("sc-my-host"));
    }

    #[test]
    fn test_removed_subtree_reports_refs_and_roots() {
        use std::cell::RefCell;

        let (mut dom, mut listeners, mut content, host) = harness();
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));

        let s1 = std::rc::Rc::clone(&seen);
        let old_tree = h(
            "my-host",
            VAttrs::new(),
            vec![Child::from(h(
                "div",
                VAttrs::new().ref_fn(move |t| s1.borrow_mut().push(t)),
                vec![],
            ))],
        );
        let (old, effects) =
            run_patch(&mut dom, &mut listeners, &mut content, host, None, old_tree);
        let div = old.children[0].dom_node;
        assert_eq!(effects.refs.len(), 1);
        assert_eq!(effects.refs[0].1, RefTarget::Attached(div));

        let new_tree = h("my-host", VAttrs::new(), vec![]);
        let (_, effects) =
            run_patch(&mut dom, &mut listeners, &mut content, host, Some(&old), new_tree);

        assert_eq!(effects.removed, vec![div]);
        assert_eq!(effects.refs.len(), 1);
        assert_eq!(effects.refs[0].1, RefTarget::Destroyed);
    }
}
