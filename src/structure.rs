//! DOM Structure Extractor.
//!
//! Walks an element's subtree depth-first into a JSON-serializable tree of
//! `{tagName, attributes, styles, textContent, children}`. The walk is
//! bounded by a depth limit, skips non-visual tags and internal overlay
//! nodes, strips inline event-handler attributes, and never fails: a bad
//! node degrades to an empty record instead of aborting the walk.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::cascade::StyleEngine;
use crate::style::{self, StyleMap};

/// Tags that carry no visual structure and are never emitted.
pub const SKIP_TAGS: &[&str] = &["script", "style", "link", "meta"];

/// One node of the extracted tree.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    pub tag_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub styles: StyleMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,
}

/// Extract the subtree rooted at `element`, at most `max_depth` levels deep.
/// Returns `None` when the depth budget is exhausted or the element itself
/// is skippable.
pub fn extract(
    document: &Html,
    engine: &StyleEngine,
    element: ElementRef,
    max_depth: usize,
) -> Option<DomNode> {
    if max_depth == 0 {
        return None;
    }
    let value = element.value();
    let tag = value.name().to_ascii_lowercase();
    if SKIP_TAGS.contains(&tag.as_str()) || crate::is_internal(value) {
        return None;
    }

    let mut attributes = BTreeMap::new();
    for (name, attr_value) in value.attrs() {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("on") || lower.contains(crate::INTERNAL_MARKER) {
            continue;
        }
        attributes.insert(lower, attr_value.to_string());
    }

    let styles = style::snapshot(document, engine, element.id());

    // Leaf text only: children still convey nested text themselves.
    let mut child_nodes = element.children();
    let text_content = match (child_nodes.next(), child_nodes.next()) {
        (Some(only), None) => only
            .value()
            .as_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        _ => None,
    };

    let children = element
        .children()
        .filter_map(ElementRef::wrap)
        .filter_map(|child| extract(document, engine, child, max_depth - 1))
        .collect();

    Some(DomNode { tag_name: tag, attributes, styles, text_content, children })
}
