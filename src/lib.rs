//! DomScope Capture Engine
//!
//! A headless element-capture engine for Rust: load a page, point at an
//! element, and get back a self-contained snapshot of it. A snapshot holds
//! the resolved styles with contrast context, readable markup, a
//! serializable DOM structure tree, and the visual assets the subtree
//! references.
//!
//! # Features
//!
//! - **Inspect mode**: an explicit hover/click state machine mirroring an
//!   in-page element picker
//! - **Style resolution**: a cascade engine over the document's stylesheets,
//!   with runtime style overlays
//! - **Message protocol**: JSON request/response control surface suitable
//!   for driving the engine over a pipe
//!
//! # Example
//!
//! ```
//! use domscope::{CaptureConfig, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = "<style>#hero { color: #fff; background-color: #141414 }</style>\
//!             <div id=\"hero\">Hello</div>";
//! let session = Session::from_html(html, None, CaptureConfig::default());
//! let target = session.find("#hero")?;
//! let snapshot = session.capture(target)?;
//! assert_eq!(snapshot.selector, "#hero");
//! # Ok(())
//! # }
//! ```

use ego_tree::NodeId;
use scraper::node::Element;
use scraper::Html;
use serde::Serialize;

pub mod error;
pub use error::{Error, Result};

pub mod color;

// Cascade resolution over parsed stylesheets
pub mod cascade;

// The tracked property allowlist and per-element style snapshots
pub mod style;

pub mod selector;
pub mod structure;
pub mod assets;
pub mod markup;

// Geometry comes from an embedder-provided backend
pub mod bounds;

pub mod inspect;
pub mod session;

pub use assets::{Asset, AssetKind};
pub use bounds::{BoundsProvider, NoopBounds};
pub use inspect::{InspectEvent, InspectState, Inspector};
pub use session::{Notification, Request, Response, Session};
pub use structure::DomNode;
pub use style::StyleMap;

/// Marker string identifying the engine's own overlay/tooltip nodes.
/// Elements, ids, classes and attributes carrying it are invisible to
/// capture.
pub const INTERNAL_MARKER: &str = "domscope";

/// Configuration for a capture session
///
/// The defaults match the interactive picker's behavior: snapshots stay
/// small enough to ship over a pipe, and traversal depth is bounded so a
/// click on `<body>` cannot serialize the whole page.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum DOM structure depth below the captured element
    pub max_depth: usize,
    /// Maximum assets reported per capture
    pub max_assets: usize,
    /// Maximum serialized markup length in characters
    pub max_markup_len: usize,
    /// Maximum captured text content length in characters
    pub max_text_len: usize,
    /// Inline SVG larger than this is reported by reference only
    pub max_inline_svg_len: usize,
    /// Data URIs are truncated to this many characters
    pub max_data_uri_len: usize,
    /// Tooltip text excerpt length in characters
    pub tooltip_text_len: usize,
    /// Ancestor labels in a selector path
    pub path_depth: usize,
    /// Viewport dimensions for tooltip placement
    pub viewport: Viewport,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Timeout for page and stylesheet fetches in milliseconds
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_assets: 50,
            max_markup_len: 8000,
            max_text_len: 200,
            max_inline_svg_len: 5000,
            max_data_uri_len: 200,
            tooltip_text_len: 30,
            path_depth: 3,
            viewport: Viewport::default(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0 DomScope/0.1"
                .to_string(),
            timeout_ms: 30000,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Viewport-relative bounding box. Zeroed when no layout backend is
/// attached. Serializes with the CSS edge names `top` and `left`.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Rect {
    #[serde(rename = "left")]
    pub x: f64,
    #[serde(rename = "top")]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A complete capture of one element
///
/// This is the payload of the `ELEMENT_SELECTED` notification and the
/// product of [`Session::capture`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Display label, e.g. `#card` or `div.hero`
    pub selector: String,
    /// Bounded ancestor path, e.g. `div.outer > #list > li.item`
    pub path: String,
    pub tag_name: String,
    pub class_name: String,
    pub styles: StyleMap,
    /// Readable indented markup of the subtree
    pub html: String,
    pub assets: Vec<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_structure: Option<DomNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub rect: Rect,
}

/// Nearest ancestor that is an element node.
pub(crate) fn parent_element(document: &Html, node: NodeId) -> Option<NodeId> {
    let mut current = document.tree.get(node)?.parent();
    while let Some(parent) = current {
        if parent.value().is_element() {
            return Some(parent.id());
        }
        current = parent.parent();
    }
    None
}

/// Whether an element belongs to the engine's own UI.
pub(crate) fn is_internal(element: &Element) -> bool {
    if element.attr("id").map(|id| id.contains(INTERNAL_MARKER)).unwrap_or(false) {
        return true;
    }
    element
        .attr("class")
        .map(|classes| classes.contains(INTERNAL_MARKER))
        .unwrap_or(false)
}

/// Truncate to at most `max` characters, never splitting a code point.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
