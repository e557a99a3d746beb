//! Element geometry as a collaborator.
//!
//! A headless engine has no layout, so bounding boxes come from whoever
//! embeds the capture core. Backends with a real layout pass implement
//! [`BoundsProvider`]; the default noop provider reports no geometry and
//! snapshots carry a zeroed rect.

use ego_tree::NodeId;

use crate::Rect;

pub trait BoundsProvider: Send + Sync {
    /// Bounding box of an element, viewport-relative, if known.
    fn bounds(&self, node: NodeId) -> Option<Rect>;
}

/// Noop provider used when no layout engine is attached.
pub struct NoopBounds;

impl NoopBounds {
    pub fn new() -> Self {
        NoopBounds
    }
}

impl Default for NoopBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsProvider for NoopBounds {
    fn bounds(&self, _node: NodeId) -> Option<Rect> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn noop_bounds_reports_nothing() {
        let doc = Html::parse_document("<div>x</div>");
        let id = doc.root_element().id();
        let provider = NoopBounds::new();
        assert!(provider.bounds(id).is_none());
    }
}
