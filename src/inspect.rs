//! Inspect-mode state machine and overlay/tooltip presenter.
//!
//! The interactive flow is Idle → (enable) → Hovering → (click) →
//! CapturedPending → back to Idle once the snapshot is emitted; Escape or an
//! explicit disable tears hovering down from any state. The states are an
//! explicit enum so the transition table is testable without real input
//! events. All transitions run synchronously on the caller's thread; the
//! only shared state is the hovered and selected element references, both
//! last-writer-wins.

use ego_tree::NodeId;
use serde::Serialize;

use crate::{Rect, Viewport};

/// Current mode of the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectState {
    /// Not inspecting; nothing highlighted.
    Idle,
    /// Inspect mode armed; hover tracking drives the overlay.
    Hovering { hovered: Option<NodeId> },
    /// A click froze the target; capture is running synchronously.
    CapturedPending { target: NodeId },
    /// Explicitly disabled (observably identical to Idle).
    Disabled,
}

/// Input events driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InspectEvent {
    Enable,
    Disable,
    Toggle,
    MouseMove { target: NodeId, x: f64, y: f64 },
    Click { target: NodeId },
    Escape,
}

/// Highlight box drawn over the hovered or selected element.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBox {
    pub rect: Rect,
    /// Selection uses a distinct visual treatment from plain hovering.
    pub selected: bool,
}

/// Hover tooltip content and placement.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub tag_name: String,
    pub selector: String,
    /// "W×H" label from the element's bounds, when geometry is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_excerpt: Option<String>,
    pub x: f64,
    pub y: f64,
}

// Estimated tooltip box used for edge flipping; the real box is measured
// by whatever renders it.
const TOOLTIP_EST_WIDTH: f64 = 260.0;
const TOOLTIP_EST_HEIGHT: f64 = 70.0;
const TOOLTIP_OFFSET: f64 = 15.0;

impl Tooltip {
    /// Cursor-relative placement, flipped when it would overflow the
    /// viewport.
    pub fn place(cursor_x: f64, cursor_y: f64, viewport: Viewport) -> (f64, f64) {
        let mut x = cursor_x + TOOLTIP_OFFSET;
        let mut y = cursor_y + TOOLTIP_OFFSET;
        if x + TOOLTIP_EST_WIDTH > viewport.width as f64 {
            x = cursor_x - TOOLTIP_EST_WIDTH - TOOLTIP_OFFSET;
        }
        if y + TOOLTIP_EST_HEIGHT > viewport.height as f64 {
            y = cursor_y - TOOLTIP_EST_HEIGHT - TOOLTIP_OFFSET;
        }
        (x, y)
    }
}

/// Holder for the inspector's mutable state: mode, the selected-element
/// back-reference, and the current presentation.
#[derive(Debug)]
pub struct Inspector {
    state: InspectState,
    selected: Option<NodeId>,
    overlay: Option<OverlayBox>,
    tooltip: Option<Tooltip>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Inspector { state: InspectState::Idle, selected: None, overlay: None, tooltip: None }
    }

    pub fn state(&self) -> InspectState {
        self.state
    }

    pub fn is_inspecting(&self) -> bool {
        matches!(
            self.state,
            InspectState::Hovering { .. } | InspectState::CapturedPending { .. }
        )
    }

    /// Element frozen by the most recent capture, if any. Survives mode
    /// changes so style queries can be re-run against the live document.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn overlay(&self) -> Option<&OverlayBox> {
        self.overlay.as_ref()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn enable(&mut self) {
        if !self.is_inspecting() {
            log::info!("inspect mode enabled");
            self.state = InspectState::Hovering { hovered: None };
        }
    }

    pub fn disable(&mut self) {
        if self.is_inspecting() {
            log::info!("inspect mode disabled");
        }
        self.teardown(InspectState::Disabled);
    }

    /// Flip inspect mode; returns whether it is now on.
    pub fn toggle(&mut self) -> bool {
        if self.is_inspecting() {
            self.disable();
            false
        } else {
            self.enable();
            true
        }
    }

    /// Escape abandons hovering immediately; nothing was captured, so there
    /// is nothing to unwind.
    pub fn escape(&mut self) {
        self.teardown(InspectState::Idle);
    }

    /// Track a hover target. Returns true when the target changed and the
    /// overlay should move.
    pub fn hover(&mut self, target: NodeId) -> bool {
        match self.state {
            InspectState::Hovering { hovered } => {
                let changed = hovered != Some(target);
                self.state = InspectState::Hovering { hovered: Some(target) };
                changed
            }
            _ => false,
        }
    }

    pub fn hovered(&self) -> Option<NodeId> {
        match self.state {
            InspectState::Hovering { hovered } => hovered,
            _ => None,
        }
    }

    /// Freeze a click target. Returns false when not inspecting.
    pub fn begin_capture(&mut self, target: NodeId) -> bool {
        if !self.is_inspecting() {
            return false;
        }
        self.state = InspectState::CapturedPending { target };
        true
    }

    /// Capture finished: remember the selection and drop back to Idle.
    /// A later capture simply replaces the held reference.
    pub fn complete_capture(&mut self, target: NodeId) {
        self.selected = Some(target);
        self.teardown(InspectState::Idle);
    }

    /// Capture failed: inspect mode is still torn down so the user is never
    /// left with a frozen crosshair.
    pub fn abort_capture(&mut self) {
        self.teardown(InspectState::Idle);
    }

    pub fn set_overlay(&mut self, overlay: OverlayBox) {
        self.overlay = Some(overlay);
    }

    pub fn set_tooltip(&mut self, tooltip: Tooltip) {
        self.tooltip = Some(tooltip);
    }

    fn teardown(&mut self, next: InspectState) {
        self.state = next;
        self.overlay = None;
        self.tooltip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn some_node() -> NodeId {
        Html::parse_document("<div>x</div>").root_element().id()
    }

    #[test]
    fn enable_enters_hovering() {
        let mut ins = Inspector::new();
        assert_eq!(ins.state(), InspectState::Idle);
        ins.enable();
        assert!(ins.is_inspecting());
        assert_eq!(ins.hovered(), None);
    }

    #[test]
    fn toggle_flips_mode() {
        let mut ins = Inspector::new();
        assert!(ins.toggle());
        assert!(!ins.toggle());
        assert_eq!(ins.state(), InspectState::Disabled);
        assert!(ins.toggle());
    }

    #[test]
    fn hover_reports_target_changes() {
        let mut ins = Inspector::new();
        let n = some_node();
        // hovering while idle does nothing
        assert!(!ins.hover(n));
        ins.enable();
        assert!(ins.hover(n));
        assert!(!ins.hover(n));
        assert_eq!(ins.hovered(), Some(n));
    }

    #[test]
    fn escape_clears_hover_state_from_any_state() {
        let mut ins = Inspector::new();
        let n = some_node();
        ins.enable();
        ins.hover(n);
        ins.set_overlay(OverlayBox { rect: Rect::default(), selected: false });
        ins.escape();
        assert_eq!(ins.state(), InspectState::Idle);
        assert!(ins.overlay().is_none());
        assert_eq!(ins.hovered(), None);
    }

    #[test]
    fn capture_lifecycle_keeps_selection_and_returns_to_idle() {
        let mut ins = Inspector::new();
        let n = some_node();
        assert!(!ins.begin_capture(n), "capture requires inspect mode");
        ins.enable();
        assert!(ins.begin_capture(n));
        assert_eq!(ins.state(), InspectState::CapturedPending { target: n });
        ins.complete_capture(n);
        assert_eq!(ins.state(), InspectState::Idle);
        assert_eq!(ins.selected(), Some(n));
        // selection survives a later enable/disable cycle
        ins.enable();
        ins.disable();
        assert_eq!(ins.selected(), Some(n));
    }

    #[test]
    fn failed_capture_still_tears_down() {
        let mut ins = Inspector::new();
        let n = some_node();
        ins.enable();
        ins.begin_capture(n);
        ins.abort_capture();
        assert_eq!(ins.state(), InspectState::Idle);
        assert_eq!(ins.selected(), None);
    }

    #[test]
    fn tooltip_flips_at_viewport_edges() {
        let vp = Viewport { width: 1280, height: 720 };
        let (x, y) = Tooltip::place(10.0, 10.0, vp);
        assert_eq!((x, y), (25.0, 25.0));
        let (x, _) = Tooltip::place(1270.0, 10.0, vp);
        assert!(x < 1270.0);
        let (_, y) = Tooltip::place(10.0, 715.0, vp);
        assert!(y < 715.0);
    }
}
