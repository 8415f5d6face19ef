//! Deferred completions
//!
//! Promise-shaped suspension points. A lifecycle hook (or a missing
//! component definition) can hand back a `DeferredId`; the work that
//! depends on it is parked as a `Resume` record and replayed when the
//! id resolves. Resolution is sticky: parking against an already
//! resolved id is rejected so the caller can continue inline.

use std::collections::{HashMap, HashSet};
use weft_dom::NodeId;

/// Handle for a pending completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeferredId(u64);

/// Work parked behind a deferred completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// A pre-render hook suspended; resume the render pass for `host`
    BeginRender { host: NodeId, initial: bool },
    /// A host waited for its tag definition; retry initialization
    DefinitionReady { host: NodeId },
}

/// Registry of pending and resolved completions
#[derive(Debug, Default)]
pub struct DeferredRegistry {
    next: u64,
    pending: HashMap<DeferredId, Vec<Resume>>,
    /// Kept for the document lifetime: a late `park` against a
    /// resolved id must keep returning false, so resolved ids are
    /// never forgotten.
    resolved: HashSet<DeferredId>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh unresolved completion
    pub fn create(&mut self) -> DeferredId {
        let id = DeferredId(self.next);
        self.next += 1;
        self.pending.insert(id, Vec::new());
        id
    }

    /// Park work behind `id`. Returns false if `id` already resolved,
    /// in which case the caller should proceed immediately.
    pub fn park(&mut self, id: DeferredId, resume: Resume) -> bool {
        if self.resolved.contains(&id) {
            return false;
        }
        self.pending.entry(id).or_default().push(resume);
        true
    }

    /// Resolve `id`, draining its parked work in park order.
    /// Resolving twice (or resolving an unknown id) yields nothing.
    pub fn resolve(&mut self, id: DeferredId) -> Vec<Resume> {
        if !self.resolved.insert(id) {
            return Vec::new();
        }
        self.pending.remove(&id).unwrap_or_default()
    }

    pub fn is_resolved(&self, id: DeferredId) -> bool {
        self.resolved.contains(&id)
    }

    /// Number of unresolved completions
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_and_resolve() {
        let mut reg = DeferredRegistry::new();
        let id = reg.create();
        let host = NodeId::DOCUMENT;

        assert!(reg.park(id, Resume::DefinitionReady { host }));
        assert!(reg.park(
            id,
            Resume::BeginRender {
                host,
                initial: true
            }
        ));

        let drained = reg.resolve(id);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Resume::DefinitionReady { host });
    }

    #[test]
    fn test_resolution_is_sticky() {
        let mut reg = DeferredRegistry::new();
        let id = reg.create();

        assert!(reg.resolve(id).is_empty());
        assert!(reg.is_resolved(id));

        // late park is rejected, caller continues inline
        assert!(!reg.park(id, Resume::DefinitionReady { host: NodeId::DOCUMENT }));
        assert!(reg.resolve(id).is_empty());
    }
}
