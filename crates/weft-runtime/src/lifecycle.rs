//! Host lifecycle
//!
//! Drives a host element from connection through instantiation,
//! rendering and load, and back out on disconnection:
//!
//! connect -> initialize (definition may be pending) -> instance
//! -> will-load/will-update (may suspend) -> render -> did-load once
//! every descendant host has loaded, propagating leaves first.

use crate::component::{HookContext, HookResult, PlaceholderComponent};
use crate::context::{HostState, ProjectedContent};
use crate::deferred::Resume;
use crate::error::LifecyclePhase;
use crate::reconciler::{self, PatchContext, PatchEffects};
use crate::registry::{ComponentRegistry, Encapsulation};
use crate::runtime::Runtime;
use crate::scheduler::Priority;
use crate::vnode::{h, Child, RefTarget};
use weft_dom::NodeId;

impl Runtime {
    /// Connect a host element that entered the document. Captures its
    /// light-DOM children for slot projection and queues component
    /// initialization at high priority.
    pub fn connect_element(&mut self, host: NodeId) {
        if self.relocating || self.context.contains(host) {
            return;
        }
        let Some(tag) = self.dom.tag(host).map(str::to_string) else {
            return;
        };
        if !ComponentRegistry::is_valid_name(&tag) {
            return;
        }

        // children present at connect time are projection content
        let mut content = ProjectedContent::default();
        let children: Vec<NodeId> = self.dom.children(host).collect();
        for child in children {
            match self.dom.attribute(child, "slot") {
                Some(name) => content.named.entry(name).or_default().push(child),
                None => content.default_nodes.push(child),
            }
        }

        let mut state = HostState::new(&tag, content);
        let ancestor = self
            .dom
            .ancestors(host)
            .find(|a| self.context.contains(*a));
        if let Some(anc) = ancestor
            && self.context.get(anc).is_some_and(|s| !s.has_loaded)
        {
            state.ancestor = Some(anc);
        }
        let ancestor = state.ancestor;
        self.context.insert(host, state);
        if let Some(anc) = ancestor
            && let Some(anc_state) = self.context.get_mut(anc)
        {
            anc_state.loading_children.push(host);
        }

        tracing::debug!(host = host.index(), %tag, "host connected");
        self.enqueue(
            Priority::High,
            Box::new(move |rt| rt.initialize_component(host)),
        );
    }

    /// Look up the host's definition, or park until it is defined
    pub(crate) fn initialize_component(&mut self, host: NodeId) {
        let (tag, needs_spec, disconnected) = {
            let Some(state) = self.context.get(host) else {
                return;
            };
            (state.tag.clone(), state.spec.is_none(), state.disconnected)
        };
        if disconnected {
            return;
        }

        if needs_spec {
            if let Some(spec) = self.registry.definition(&tag).cloned() {
                if let Some(state) = self.context.get_mut(host) {
                    state.spec = Some(spec);
                }
            } else {
                let id = match self.registry.pending_for(&tag) {
                    Some(id) => id,
                    None => {
                        let id = self.deferreds.create();
                        self.registry.set_pending(&tag, id);
                        id
                    }
                };
                tracing::trace!(host = host.index(), %tag, "waiting for definition");
                self.deferreds.park(id, Resume::DefinitionReady { host });
                return;
            }
        }

        self.schedule_update(host, Priority::High);
    }

    /// Queue a re-render for a host (frame-timed)
    pub fn request_update(&mut self, host: NodeId) {
        self.schedule_update(host, Priority::Low);
    }

    /// Queue an update unless one is queued, a render is in progress,
    /// or the host disconnected
    pub(crate) fn schedule_update(&mut self, host: NodeId, priority: Priority) {
        let Some(state) = self.context.get_mut(host) else {
            return;
        };
        if state.update_queued || state.rendering || state.disconnected {
            return;
        }
        state.update_queued = true;
        self.enqueue(priority, Box::new(move |rt| rt.perform_update(host)));
    }

    /// One update pass: instantiate on the first pass, replay queued
    /// events, then run the pre-render hook (which may suspend).
    pub(crate) fn perform_update(&mut self, host: NodeId) {
        let initial = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            state.update_queued = false;
            if state.disconnected {
                return;
            }
            state.instance.is_none()
        };

        if initial {
            // an unrendered ancestor renders first; it re-queues us
            // when its pass completes
            let ancestor = self.context.get(host).and_then(|s| s.ancestor);
            if let Some(anc) = ancestor
                && self.context.get(anc).is_some_and(|s| !s.has_rendered)
            {
                if let Some(anc_state) = self.context.get_mut(anc) {
                    anc_state.render_waiters.push(host);
                }
                tracing::trace!(host = host.index(), ancestor = anc.index(), "render deferred");
                return;
            }
            self.create_instance(host);
            self.replay_queued_events(host);
        }

        self.run_pre_render_hook(host, initial);
    }

    fn create_instance(&mut self, host: NodeId) {
        let constructor = self
            .context
            .get(host)
            .and_then(|s| s.spec.as_ref())
            .map(|spec| std::rc::Rc::clone(&spec.constructor));
        let Some(constructor) = constructor else {
            return;
        };

        let (instance, error) = match constructor() {
            Ok(instance) => (instance, None),
            Err(err) => (
                Box::new(PlaceholderComponent) as Box<dyn crate::component::Component>,
                Some(err),
            ),
        };
        if let Some(state) = self.context.get_mut(host) {
            state.instance = Some(instance);
        }
        if let Some(err) = error {
            self.report(LifecyclePhase::Construct, host, err);
        }
    }

    /// Replay events queued before the instance existed, in arrival
    /// order; a failing handler does not stop the rest.
    fn replay_queued_events(&mut self, host: NodeId) {
        let (events, spec) = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            (std::mem::take(&mut state.queued_events), state.spec.clone())
        };
        if events.is_empty() {
            return;
        }
        let Some(spec) = spec else { return };
        let Some(mut instance) = self
            .context
            .get_mut(host)
            .and_then(|s| s.instance.take())
        else {
            return;
        };

        for (event_name, event) in events {
            let Some(method) = spec.method_for(&event_name) else {
                continue;
            };
            if let Err(err) = instance.handle_event(method, &event) {
                self.report(LifecyclePhase::EventReplay, host, err);
            }
        }
        if let Some(state) = self.context.get_mut(host) {
            state.instance = Some(instance);
        }
    }

    /// Run will-load/will-update; continue to render unless the hook
    /// suspends on a deferred completion
    fn run_pre_render_hook(&mut self, host: NodeId, initial: bool) {
        let result = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            let Some(mut instance) = state.instance.take() else {
                return;
            };
            let mut hook_ctx = HookContext {
                deferreds: &mut self.deferreds,
            };
            let result = if initial {
                instance.will_load(&mut hook_ctx)
            } else {
                instance.will_update(&mut hook_ctx)
            };
            state.instance = Some(instance);
            result
        };

        match result {
            Ok(HookResult::Ready) => self.render_and_finish(host, initial),
            Ok(HookResult::Pending(id)) => {
                if self.deferreds.park(id, Resume::BeginRender { host, initial }) {
                    if let Some(state) = self.context.get_mut(host) {
                        state.pending_hook = Some(id);
                    }
                    tracing::trace!(host = host.index(), "pre-render hook suspended");
                } else {
                    // already resolved; continue inline
                    self.render_and_finish(host, initial);
                }
            }
            Err(err) => {
                let phase = if initial {
                    LifecyclePhase::WillLoad
                } else {
                    LifecyclePhase::WillUpdate
                };
                self.report(phase, host, err);
                // a failed hook skips neither the render nor the load
                self.render_and_finish(host, initial);
            }
        }
    }

    /// Render the host's vnode tree, patch it into the live tree, and
    /// finish the pass (load propagation or did-update).
    pub(crate) fn render_and_finish(&mut self, host: NodeId, initial: bool) {
        let (render_result, host_data) = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            state.pending_hook = None;
            state.rendering = true;
            let Some(mut instance) = state.instance.take() else {
                state.rendering = false;
                return;
            };
            let render_result = instance.render();
            let host_data = instance.host_data().unwrap_or_default();
            state.instance = Some(instance);
            (render_result, host_data)
        };

        let children = match render_result {
            Ok(children) => children,
            Err(err) => {
                self.report(LifecyclePhase::Render, host, err);
                // the failed pass leaves the tree as it was
                if let Some(state) = self.context.get_mut(host) {
                    state.rendering = false;
                    state.has_rendered = true;
                }
                self.flush_render_waiters(host);
                if initial {
                    self.try_mark_loaded(host);
                }
                return;
            }
        };

        let Some((tag, encapsulation, style_mode, is_update)) = self.context.get(host).map(|s| {
            let spec = s.spec.as_deref();
            (
                s.tag.clone(),
                spec.map_or(Encapsulation::None, |sp| sp.encapsulation),
                spec.and_then(|sp| sp.style_mode.clone()),
                s.has_rendered,
            )
        }) else {
            return;
        };

        // on the first light-DOM render the captured content leaves
        // its original position; slots re-home it during the patch
        if !is_update && encapsulation != Encapsulation::Shadow {
            let captured = self
                .context
                .get(host)
                .map(|s| s.content.all_ids())
                .unwrap_or_default();
            self.relocating = true;
            for id in captured {
                if self.dom.parent(id) == host {
                    self.dom.detach(id);
                }
            }
            self.relocating = false;
        }

        let root = h(
            &tag,
            host_data,
            children.into_iter().map(Child::from).collect(),
        );
        let old = self
            .context
            .get_mut(host)
            .and_then(|s| s.vnode.take());
        let scope = format!("sc-{tag}");

        self.relocating = true;
        let (new_root, effects) = {
            let Some(state) = self.context.get_mut(host) else {
                self.relocating = false;
                return;
            };
            let ctx = PatchContext {
                dom: &mut self.dom,
                listeners: &mut self.listeners,
                content: &mut state.content,
                encapsulation,
                scope_id: (encapsulation == Encapsulation::Scoped).then_some(scope.as_str()),
                ssr_id: self.ssr_id.as_deref(),
            };
            reconciler::patch(ctx, host, old.as_ref(), root, is_update)
        };
        self.relocating = false;

        let mut nested_hosts = Vec::new();
        collect_host_candidates(&new_root, &mut nested_hosts);

        if let Some(state) = self.context.get_mut(host) {
            state.vnode = Some(new_root);
            state.has_rendered = true;
            state.rendering = false;
        }

        self.apply_effects(effects);

        // custom elements this pass rendered become hosts themselves;
        // they register as loading children before we check our own
        // load state
        for nested in nested_hosts {
            if nested != host {
                self.connect_element(nested);
            }
        }

        self.flush_render_waiters(host);
        if let Some(mode) = style_mode {
            self.styles.attach(host, &mode);
        }

        if initial {
            self.try_mark_loaded(host);
        } else {
            self.run_post_hook(host, LifecyclePhase::DidUpdate);
        }

        // a disconnect observed while the hook was pending finishes now
        if self.context.get(host).is_some_and(|s| s.disconnected) {
            self.release_host(host);
        }
    }

    /// Descendants whose initial render waited on ours re-enter the
    /// high lane
    fn flush_render_waiters(&mut self, host: NodeId) {
        let waiters = self
            .context
            .get_mut(host)
            .map(|s| std::mem::take(&mut s.render_waiters))
            .unwrap_or_default();
        for waiter in waiters {
            self.schedule_update(waiter, Priority::High);
        }
    }

    /// Fire ref callbacks and tear down subtrees the patch removed
    fn apply_effects(&mut self, effects: PatchEffects) {
        for (callback, target) in effects.refs {
            callback(target);
        }
        for root in effects.removed {
            let ids = self.dom.subtree_ids(root);
            for id in &ids {
                self.listeners.remove_all(*id);
            }
            let hosts: Vec<NodeId> = ids
                .into_iter()
                .filter(|id| self.context.contains(*id))
                .collect();
            for host in hosts {
                self.disconnect_element(host);
            }
        }
    }

    /// Mark a host loaded once its own pass and every loading child
    /// finished; propagates to the waiting ancestor, leaves first.
    pub(crate) fn try_mark_loaded(&mut self, host: NodeId) {
        let ready_callbacks = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            if state.has_loaded
                || state.disconnected
                || state.instance.is_none()
                || !state.loading_children.is_empty()
            {
                return;
            }
            state.has_loaded = true;
            std::mem::take(&mut state.ready_callbacks)
        };

        tracing::debug!(host = host.index(), "host loaded");
        for callback in ready_callbacks {
            callback(self);
        }
        self.run_post_hook(host, LifecyclePhase::DidLoad);
        self.dom.class_add(host, "hydrated");

        let ancestor = self.context.get(host).and_then(|s| s.ancestor);
        if let Some(anc) = ancestor {
            let unblocked = self
                .context
                .get_mut(anc)
                .map(|s| {
                    s.loading_children.retain(|&c| c != host);
                    s.loading_children.is_empty()
                })
                .unwrap_or(false);
            if unblocked {
                self.try_mark_loaded(anc);
            }
        }
    }

    fn run_post_hook(&mut self, host: NodeId, phase: LifecyclePhase) {
        let Some(mut instance) = self
            .context
            .get_mut(host)
            .and_then(|s| s.instance.take())
        else {
            return;
        };
        let result = match phase {
            LifecyclePhase::DidLoad => instance.did_load(),
            LifecyclePhase::DidUpdate => instance.did_update(),
            LifecyclePhase::WillUnload => instance.will_unload(),
            _ => Ok(()),
        };
        if let Some(state) = self.context.get_mut(host) {
            state.instance = Some(instance);
        }
        if let Err(err) = result {
            self.report(phase, host, err);
        }
    }

    /// Disconnect a host that left the document. Moves performed by a
    /// patch in progress are suppressed, as is a host that still has a
    /// live document position.
    pub fn disconnect_element(&mut self, host: NodeId) {
        if self.relocating {
            return;
        }
        if self
            .context
            .get(host)
            .is_none_or(|s| s.disconnected)
        {
            return;
        }
        if self.dom.is_attached(host) {
            return;
        }

        let (ancestor, ref_callbacks) = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            state.disconnected = true;
            let mut refs = Vec::new();
            if let Some(vnode) = &state.vnode {
                vnode.collect_refs(&mut refs);
            }
            (state.ancestor, refs)
        };
        tracing::debug!(host = host.index(), "host disconnected");

        // an ancestor waiting on this host stops waiting
        if let Some(anc) = ancestor {
            let unblocked = self
                .context
                .get_mut(anc)
                .map(|s| {
                    s.loading_children.retain(|&c| c != host);
                    s.loading_children.is_empty()
                })
                .unwrap_or(false);
            if unblocked {
                self.try_mark_loaded(anc);
            }
        }

        for callback in ref_callbacks {
            callback(RefTarget::Destroyed);
        }

        let mut ids = self.dom.subtree_ids(host);
        if let Some(root) = self.dom.shadow_root(host) {
            ids.extend(self.dom.subtree_ids(root));
        }
        for id in ids {
            self.listeners.remove_all(id);
        }

        self.run_post_hook(host, LifecyclePhase::WillUnload);

        // a suspended hook keeps the state alive until it resumes
        let hook_pending = self
            .context
            .get(host)
            .is_some_and(|s| s.pending_hook.is_some());
        if !hook_pending {
            self.release_host(host);
        }
    }

    /// Remove an element from the tree and disconnect any hosts inside
    pub fn remove_element(&mut self, node: NodeId) {
        let ids = self.dom.subtree_ids(node);
        self.dom.remove(node);
        for id in &ids {
            self.listeners.remove_all(*id);
        }
        let hosts: Vec<NodeId> = ids
            .into_iter()
            .filter(|id| self.context.contains(*id))
            .collect();
        for host in hosts {
            self.disconnect_element(host);
        }
    }

    pub(crate) fn release_host(&mut self, host: NodeId) {
        self.context.remove(host);
    }
}

/// Custom elements in a rendered tree, in document order
fn collect_host_candidates(vnode: &crate::vnode::VNode, out: &mut Vec<NodeId>) {
    if let Some(tag) = &vnode.tag
        && tag.contains('-')
        && vnode.dom_node.is_valid()
    {
        out.push(vnode.dom_node);
    }
    for child in &vnode.children {
        collect_host_candidates(child, out);
    }
}
