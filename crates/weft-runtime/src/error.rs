//! Runtime errors
//!
//! Every failure is tagged with the lifecycle phase that produced it
//! and the offending host element, then handed to an `ErrorSink`.
//! Failures never unwind past the phase boundary: a failed phase is
//! skipped for that pass and the next scheduled update gets a fresh
//! attempt.

use weft_dom::NodeId;

/// Lifecycle phase that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Construct,
    WillLoad,
    WillUpdate,
    Render,
    DidLoad,
    DidUpdate,
    WillUnload,
    EventReplay,
    EventDispatch,
}

impl LifecyclePhase {
    /// Get phase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Construct => "construct",
            Self::WillLoad => "will-load",
            Self::WillUpdate => "will-update",
            Self::Render => "render",
            Self::DidLoad => "did-load",
            Self::DidUpdate => "did-update",
            Self::WillUnload => "will-unload",
            Self::EventReplay => "event-replay",
            Self::EventDispatch => "event-dispatch",
        }
    }
}

/// Error produced by a component hook or operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    #[error("{0}")]
    Message(String),

    #[error("no handler method `{0}`")]
    UnknownMethod(String),
}

impl ComponentError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Phase-tagged component failure
#[derive(Debug, thiserror::Error)]
#[error("{} failed for node {}: {source}", .phase.name(), .host.index())]
pub struct RuntimeError {
    pub phase: LifecyclePhase,
    pub host: NodeId,
    #[source]
    pub source: ComponentError,
}

/// Sink for phase-local failures
pub trait ErrorSink {
    fn report(&self, error: &RuntimeError);
}

/// Default sink: logs through `tracing`
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &RuntimeError) {
        tracing::error!(
            phase = error.phase.name(),
            host = error.host.index(),
            error = %error.source,
            "component phase failed"
        );
    }
}
