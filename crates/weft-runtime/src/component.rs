//! Component trait
//!
//! User components implement `Component`; every hook has a default so
//! implementations only override what they need. The pre-render hooks
//! may suspend by returning `HookResult::Pending` with a deferred id
//! obtained from the `HookContext`.

use crate::deferred::{DeferredId, DeferredRegistry};
use crate::error::ComponentError;
use crate::vnode::{VAttrs, VNode};
use weft_dom::Event;

/// Outcome of a pre-render hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Continue to render immediately
    Ready,
    /// Suspend; render resumes when the deferred id resolves
    Pending(DeferredId),
}

/// Capabilities handed to pre-render hooks
pub struct HookContext<'a> {
    pub(crate) deferreds: &'a mut DeferredRegistry,
}

impl HookContext<'_> {
    /// Allocate a deferred completion to suspend on
    pub fn defer(&mut self) -> DeferredId {
        self.deferreds.create()
    }
}

/// A component instance driven by the runtime lifecycle
pub trait Component {
    /// Runs once before the first render
    fn will_load(&mut self, _ctx: &mut HookContext<'_>) -> Result<HookResult, ComponentError> {
        Ok(HookResult::Ready)
    }

    /// Runs before every re-render
    fn will_update(&mut self, _ctx: &mut HookContext<'_>) -> Result<HookResult, ComponentError> {
        Ok(HookResult::Ready)
    }

    /// Produce the children of the host element
    fn render(&mut self) -> Result<Vec<VNode>, ComponentError> {
        Ok(Vec::new())
    }

    /// Attributes to apply to the host element itself
    fn host_data(&self) -> Option<VAttrs> {
        None
    }

    /// Runs once after the component and all its descendants loaded
    fn did_load(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Runs after every re-render
    fn did_update(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Runs when the host leaves the document for good
    fn will_unload(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Invoke a declared event handler method by name
    fn handle_event(&mut self, method: &str, _event: &Event) -> Result<(), ComponentError> {
        Err(ComponentError::UnknownMethod(method.to_string()))
    }
}

/// Stand-in used when a constructor fails; renders nothing so the
/// rest of the tree keeps working.
pub(crate) struct PlaceholderComponent;

impl Component for PlaceholderComponent {
    fn handle_event(&mut self, _method: &str, _event: &Event) -> Result<(), ComponentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl Component for Bare {}

    #[test]
    fn test_default_hooks() {
        let mut reg = DeferredRegistry::new();
        let mut ctx = HookContext {
            deferreds: &mut reg,
        };
        let mut c = Bare;

        assert_eq!(c.will_load(&mut ctx).unwrap(), HookResult::Ready);
        assert!(c.render().unwrap().is_empty());
        assert!(c.host_data().is_none());
        assert!(c.handle_event("onThing", &Event::new("thing")).is_err());
    }
}
