//! Component style attachment
//!
//! Components can declare a style mode; after each render the runtime
//! asks the attacher to make that mode's styles reachable from the
//! host. The default attacher just records the request and dedupes it,
//! which is what headless embedders and tests want. Real embedders
//! plug in their own.

use weft_dom::NodeId;

/// Applies a component's style mode to its host
pub trait StyleAttacher {
    fn attach(&mut self, host: NodeId, mode: &str);
}

/// Recording attacher: remembers each distinct (host, mode) request
#[derive(Debug, Default)]
pub struct RecordingStyleAttacher {
    attached: Vec<(NodeId, String)>,
}

impl RecordingStyleAttacher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> &[(NodeId, String)] {
        &self.attached
    }
}

impl StyleAttacher for RecordingStyleAttacher {
    fn attach(&mut self, host: NodeId, mode: &str) {
        if self.attached.iter().any(|(h, m)| *h == host && m == mode) {
            return;
        }
        tracing::debug!(host = host.index(), mode, "style mode attached");
        self.attached.push((host, mode.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_dedupes() {
        let mut styles = RecordingStyleAttacher::new();
        styles.attach(NodeId::DOCUMENT, "ios");
        styles.attach(NodeId::DOCUMENT, "ios");
        styles.attach(NodeId::DOCUMENT, "md");

        assert_eq!(styles.attached().len(), 2);
    }
}
