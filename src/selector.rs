//! Selector Resolver.
//!
//! Produces human-readable element labels, not query-safe selectors: a
//! non-empty id wins, then `tag.firstClass` with utility classes filtered
//! out, then the bare tag name. `path` joins up to three ancestor labels
//! with `" > "`, stopping at `<body>`. Uniqueness is deliberately not
//! guaranteed.

use scraper::ElementRef;

// Marker prefixes of utility/state classes that make poor labels.
const UTILITY_PREFIXES: &[&str] =
    &["js-", "is-", "has-", "hover:", "focus:", "active:", "disabled:"];

fn is_utility_class(class: &str) -> bool {
    class.is_empty()
        || class.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
        || UTILITY_PREFIXES.iter().any(|p| class.starts_with(p))
        || class.contains(crate::INTERNAL_MARKER)
}

/// Label one element: `#id`, `tag.firstClass`, or `tag`.
pub fn resolve(element: ElementRef) -> String {
    let value = element.value();
    if let Some(id) = value.attr("id") {
        if !id.trim().is_empty() {
            return format!("#{}", id.trim());
        }
    }

    let tag = value.name().to_ascii_lowercase();
    if let Some(class_attr) = value.attr("class") {
        if let Some(first) = class_attr.split_whitespace().find(|c| !is_utility_class(c)) {
            return format!("{}.{}", tag, first);
        }
    }
    tag
}

/// Ancestor path of labels from the outermost kept ancestor down to the
/// element itself, e.g. `div.card > ul > li.item`.
pub fn path(element: ElementRef, max_parts: usize) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let tag = el.value().name().to_ascii_lowercase();
        if tag == "body" || tag == "html" || parts.len() >= max_parts {
            break;
        }
        parts.insert(0, resolve(el));
        current = el.parent().and_then(ElementRef::wrap);
    }

    parts.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn id_wins_over_classes() {
        let doc = Html::parse_document("<div id=\"card\" class=\"hero main\"></div>");
        assert_eq!(resolve(first(&doc, "div")), "#card");
    }

    #[test]
    fn first_useful_class_is_used() {
        let doc = Html::parse_document("<div class=\"js-init is-open hero main\"></div>");
        assert_eq!(resolve(first(&doc, "div")), "div.hero");
    }

    #[test]
    fn numeric_and_utility_classes_are_skipped() {
        let doc = Html::parse_document("<span class=\"2col hover:blue\"></span>");
        assert_eq!(resolve(first(&doc, "span")), "span");
    }

    #[test]
    fn bare_tag_fallback() {
        let doc = Html::parse_document("<section></section>");
        assert_eq!(resolve(first(&doc, "section")), "section");
    }

    #[test]
    fn path_joins_bounded_ancestors() {
        let doc = Html::parse_document(
            "<body><div class=\"outer\"><ul id=\"list\"><li class=\"item\">x</li></ul></div></body>",
        );
        assert_eq!(path(first(&doc, "li"), 3), "div.outer > #list > li.item");
    }

    #[test]
    fn path_stops_at_body() {
        let doc = Html::parse_document("<body><p>x</p></body>");
        assert_eq!(path(first(&doc, "p"), 3), "p");
    }

    #[test]
    fn path_caps_depth() {
        let doc = Html::parse_document(
            "<body><div><div><div><div><em>x</em></div></div></div></div></body>",
        );
        let p = path(first(&doc, "em"), 3);
        assert_eq!(p.split(" > ").count(), 3);
        assert!(p.ends_with("em"));
    }
}
