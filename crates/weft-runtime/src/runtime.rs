//! Runtime core
//!
//! `Runtime` owns the live tree, the listener table, the component
//! registry, the scheduler and the shared per-host context. Lifecycle
//! flows (connect, update, disconnect) live in `lifecycle.rs`; this
//! module holds construction, the embedder surface, and dispatch.

use crate::context::RuntimeContext;
use crate::deferred::{DeferredId, DeferredRegistry, Resume};
use crate::error::{ComponentError, ErrorSink, LifecyclePhase, RuntimeError, TracingSink};
use crate::registry::{ComponentRegistry, ComponentSpec, RegistryError};
use crate::scheduler::{
    drain_frame, drain_high, FrameClock, Priority, SchedulerStats, Task, TaskQueue, WallClock,
};
use crate::style::{RecordingStyleAttacher, StyleAttacher};
use crate::vnode::VNode;
use std::rc::Rc;
use weft_dom::{DomStats, DomTree, Event, ListenerMap, NodeId};

/// The component runtime
pub struct Runtime {
    pub(crate) dom: DomTree,
    pub(crate) listeners: ListenerMap,
    pub(crate) registry: ComponentRegistry,
    pub(crate) context: RuntimeContext,
    pub(crate) queue: TaskQueue<Runtime>,
    pub(crate) deferreds: DeferredRegistry,
    clock: Rc<dyn FrameClock>,
    pub(crate) styles: Box<dyn StyleAttacher>,
    sink: Rc<dyn ErrorSink>,
    /// Server-render marker applied to hosts on their first render
    pub(crate) ssr_id: Option<String>,
    /// A patch is moving nodes; disconnects observed now are not real
    pub(crate) relocating: bool,
}

fn queue_of(rt: &mut Runtime) -> &mut TaskQueue<Runtime> {
    &mut rt.queue
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            dom: DomTree::new(),
            listeners: ListenerMap::new(),
            registry: ComponentRegistry::new(),
            context: RuntimeContext::new(),
            queue: TaskQueue::new(),
            deferreds: DeferredRegistry::new(),
            clock: Rc::new(WallClock::new()),
            styles: Box::new(RecordingStyleAttacher::new()),
            sink: Rc::new(TracingSink),
            ssr_id: None,
            relocating: false,
        }
    }

    // --- Embedder configuration ---

    pub fn set_clock(&mut self, clock: Rc<dyn FrameClock>) {
        self.clock = clock;
    }

    pub fn set_error_sink(&mut self, sink: Rc<dyn ErrorSink>) {
        self.sink = sink;
    }

    pub fn set_style_attacher(&mut self, styles: Box<dyn StyleAttacher>) {
        self.styles = styles;
    }

    pub fn set_ssr_id(&mut self, id: Option<String>) {
        self.ssr_id = id;
    }

    // --- Access ---

    pub fn dom(&self) -> &DomTree {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut DomTree {
        &mut self.dom
    }

    pub fn dom_stats(&self) -> &DomStats {
        self.dom.stats()
    }

    pub fn scheduler_stats(&self) -> &SchedulerStats {
        self.queue.stats()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether a host element has runtime state
    pub fn is_connected(&self, host: NodeId) -> bool {
        self.context.contains(host)
    }

    pub fn has_rendered(&self, host: NodeId) -> bool {
        self.context.get(host).is_some_and(|s| s.has_rendered)
    }

    pub fn is_loaded(&self, host: NodeId) -> bool {
        self.context.get(host).is_some_and(|s| s.has_loaded)
    }

    /// Stored render output of the previous pass
    pub fn rendered_vnode(&self, host: NodeId) -> Option<&VNode> {
        self.context.get(host).and_then(|s| s.vnode.as_ref())
    }

    // --- Definitions and deferreds ---

    /// Register a component definition; hosts that connected before
    /// the definition arrived resume initialization.
    pub fn define_component(&mut self, spec: ComponentSpec) -> Result<(), RegistryError> {
        let tag = spec.tag.clone();
        self.registry.define(spec)?;
        tracing::debug!(%tag, "component defined");
        if let Some(id) = self.registry.take_pending(&tag) {
            self.resolve_deferred(id);
        }
        Ok(())
    }

    /// Allocate a deferred completion (for suspending hooks)
    pub fn create_deferred(&mut self) -> DeferredId {
        self.deferreds.create()
    }

    /// Resolve a deferred completion; parked work re-enters the high
    /// lane in park order.
    pub fn resolve_deferred(&mut self, id: DeferredId) {
        for resume in self.deferreds.resolve(id) {
            match resume {
                Resume::BeginRender { host, initial } => {
                    if let Some(state) = self.context.get_mut(host) {
                        state.pending_hook = None;
                    }
                    self.enqueue(
                        Priority::High,
                        Box::new(move |rt| rt.render_and_finish(host, initial)),
                    );
                }
                Resume::DefinitionReady { host } => {
                    self.enqueue(
                        Priority::High,
                        Box::new(move |rt| rt.initialize_component(host)),
                    );
                }
            }
        }
    }

    /// Run `callback` once `host` has finished loading (immediately if
    /// it already has).
    pub fn on_ready(&mut self, host: NodeId, callback: impl FnOnce(&mut Runtime) + 'static) {
        if self.is_loaded(host) {
            callback(self);
            return;
        }
        if let Some(state) = self.context.get_mut(host) {
            state.ready_callbacks.push(Box::new(callback));
        }
    }

    // --- Scheduling ---

    pub(crate) fn enqueue(&mut self, priority: Priority, task: Task<Runtime>) {
        self.queue.enqueue(priority, task);
    }

    /// Enqueue arbitrary work on a lane
    pub fn enqueue_task(&mut self, priority: Priority, task: impl FnOnce(&mut Runtime) + 'static) {
        self.enqueue(priority, Box::new(task));
    }

    /// Drain the high lane if a microtask flush is pending
    pub fn pump_microtasks(&mut self) {
        if self.queue.microtask_requested() {
            drain_high(self, queue_of);
        }
    }

    /// Drive the scheduler until both lanes are empty. Microtask
    /// flushes run ahead of frame flushes, matching their timing.
    pub fn pump(&mut self) {
        loop {
            if self.queue.microtask_requested() {
                drain_high(self, queue_of);
                continue;
            }
            if self.queue.frame_requested() {
                let clock = Rc::clone(&self.clock);
                drain_frame(self, queue_of, clock.as_ref());
                continue;
            }
            break;
        }
    }

    // --- Event dispatch ---

    /// Deliver an event to the listener registered on a rendered node
    pub fn dispatch_dom_event(&mut self, node: NodeId, event: &Event) {
        if let Some(handler) = self.listeners.get(node, &event.name) {
            handler(event);
        }
    }

    /// Deliver an event to a host's declared listener method. Events
    /// arriving before the instance exists are queued and replayed in
    /// order once it does.
    pub fn dispatch_host_event(&mut self, host: NodeId, event: &Event) {
        let spec = {
            let Some(state) = self.context.get_mut(host) else {
                return;
            };
            if state.instance.is_none() {
                tracing::trace!(host = host.index(), event = %event.name, "event queued pre-instance");
                state.queued_events.push((event.name.clone(), event.clone()));
                return;
            }
            state.spec.clone()
        };
        let Some(spec) = spec else { return };
        let Some(method) = spec.method_for(&event.name).map(str::to_string) else {
            return;
        };

        let Some(mut instance) = self
            .context
            .get_mut(host)
            .and_then(|s| s.instance.take())
        else {
            return;
        };
        let result = instance.handle_event(&method, event);
        if let Some(state) = self.context.get_mut(host) {
            state.instance = Some(instance);
        }
        if let Err(err) = result {
            self.report(LifecyclePhase::EventDispatch, host, err);
        }
    }

    // --- Errors ---

    pub(crate) fn report(&self, phase: LifecyclePhase, host: NodeId, source: ComponentError) {
        let error = RuntimeError {
            phase,
            host,
            source,
        };
        self.sink.report(&error);
    }
}
