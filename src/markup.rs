//! Snapshot Serializer.
//!
//! Renders an extracted [`DomNode`] tree back into readable, indented
//! pseudo-HTML. Output longer than the configured cap is cut at the nearest
//! preceding line boundary and finished with a truncation marker, so a
//! truncated snapshot never ends mid-tag.

use crate::structure::DomNode;

/// Marker appended when output is truncated.
pub const TRUNCATION_MARKER: &str = "<!-- truncated -->";

// Tags rendered self-closing.
const VOID_TAGS: &[&str] = &[
    "img", "input", "br", "hr", "meta", "link", "area", "base", "col", "embed", "source",
    "track", "wbr",
];

/// Render `node` as indented pseudo-HTML, at most `max_len` characters.
pub fn to_markup(node: &DomNode, max_len: usize) -> String {
    let mut out = String::new();
    write_node(node, 0, &mut out);
    let out = out.trim_end().to_string();
    truncate_markup(out, max_len)
}

fn write_node(node: &DomNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&node.tag_name);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }

    if VOID_TAGS.contains(&node.tag_name.as_str()) {
        out.push_str(" />\n");
        return;
    }

    match (&node.text_content, node.children.is_empty()) {
        // leaf with text on one line
        (Some(text), true) => {
            out.push('>');
            out.push_str(text);
            out.push_str("</");
            out.push_str(&node.tag_name);
            out.push_str(">\n");
        }
        _ => {
            out.push_str(">\n");
            if let Some(text) = &node.text_content {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(text);
                out.push('\n');
            }
            for child in &node.children {
                write_node(child, depth + 1, out);
            }
            out.push_str(&indent);
            out.push_str("</");
            out.push_str(&node.tag_name);
            out.push_str(">\n");
        }
    }
}

// Cut at the last newline before the cap so no line is left dangling.
fn truncate_markup(out: String, max_len: usize) -> String {
    if out.len() <= max_len {
        return out;
    }
    let mut cut = max_len.min(out.len());
    while cut > 0 && !out.is_char_boundary(cut) {
        cut -= 1;
    }
    let boundary = out[..cut].rfind('\n').unwrap_or(0);
    let mut truncated = out[..boundary].trim_end().to_string();
    truncated.push('\n');
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::StyleEngine;
    use crate::structure::extract;
    use scraper::{Html, Selector};

    fn node_for(html: &str) -> DomNode {
        let doc = Html::parse_document(html);
        let engine = StyleEngine::build(&doc, &[]);
        let root = doc.select(&Selector::parse("#x").unwrap()).next().unwrap();
        extract(&doc, &engine, root, 10).unwrap()
    }

    #[test]
    fn text_leaves_render_on_one_line() {
        let markup = to_markup(&node_for("<div id=\"x\"><span>Hi</span></div>"), 8000);
        assert!(markup.contains("<span>Hi</span>"));
        assert!(markup.starts_with("<div id=\"x\">"));
        assert!(markup.trim_end().ends_with("</div>"));
    }

    #[test]
    fn void_tags_self_close() {
        let markup = to_markup(&node_for("<div id=\"x\"><img src=\"a.png\"><br></div>"), 8000);
        assert!(markup.contains("<img src=\"a.png\" />"));
        assert!(markup.contains("<br />"));
        assert!(!markup.contains("</img>"));
    }

    #[test]
    fn nesting_indents_two_spaces_per_level() {
        let markup = to_markup(&node_for("<div id=\"x\"><ul><li>a</li></ul></div>"), 8000);
        let lines: Vec<&str> = markup.lines().collect();
        assert!(lines.iter().any(|l| l.starts_with("  <ul>")));
        assert!(lines.iter().any(|l| l.starts_with("    <li>a</li>")));
    }

    #[test]
    fn truncation_lands_on_a_line_boundary() {
        let mut items = String::new();
        for i in 0..200 {
            items.push_str(&format!("<li>item number {}</li>", i));
        }
        let node = node_for(&format!("<div id=\"x\"><ul>{}</ul></div>", items));
        let markup = to_markup(&node, 500);
        assert!(markup.len() <= 500 + TRUNCATION_MARKER.len() + 1);
        assert!(markup.ends_with(TRUNCATION_MARKER));
        // the line before the marker is complete, never a dangling open tag
        let before_marker = markup.lines().rev().nth(1).unwrap();
        assert!(before_marker.trim_end().ends_with('>'));
    }

    #[test]
    fn short_output_is_untouched() {
        let markup = to_markup(&node_for("<div id=\"x\">hi</div>"), 8000);
        assert!(!markup.contains(TRUNCATION_MARKER));
    }
}
