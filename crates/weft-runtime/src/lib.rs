//! weft-runtime - component runtime core
//!
//! Lazily upgrades custom elements into component instances, renders
//! them through a keyed virtual-node reconciler, and batches work on a
//! two-lane scheduler (microtask-timed initial renders, frame-timed
//! re-renders). Components are plain structs implementing [`Component`];
//! the runtime owns all shared state, keyed by host element id.

mod component;
mod context;
mod deferred;
mod error;
mod lifecycle;
mod reconciler;
mod registry;
mod runtime;
mod scheduler;
mod style;
mod vnode;

pub use component::{Component, HookContext, HookResult};
pub use context::{HostState, ProjectedContent, RuntimeContext};
pub use deferred::{DeferredId, DeferredRegistry};
pub use error::{ComponentError, ErrorSink, LifecyclePhase, RuntimeError, TracingSink};
pub use reconciler::{patch, PatchContext, PatchEffects};
pub use registry::{
    ComponentRegistry, ComponentSpec, Constructor, Encapsulation, ListenerDecl, RegistryError,
};
pub use runtime::Runtime;
pub use scheduler::{
    drain_frame, drain_high, FlushOutcome, FlushRequest, FrameClock, Priority, SchedulerStats,
    Task, TaskQueue, WallClock, CATCHUP_FRAME_SLICE_MS, FIRST_FRAME_SLICE_MS,
};
pub use style::{RecordingStyleAttacher, StyleAttacher};
pub use vnode::{h, h_fn, text, AttrValue, Child, RefCallback, RefTarget, VAttrs, VNode};

pub use weft_dom::{DomStats, DomTree, Event, EventHandler, ListenerMap, Namespace, NodeId};
