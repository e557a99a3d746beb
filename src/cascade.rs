//! Computed-style engine.
//!
//! Resolves the styles a browser would report from `getComputedStyle`, built
//! out of the document's `<style>` blocks, fetched linked stylesheets, and
//! `style=""` attributes. The parser is deliberately tolerant: rules that do
//! not parse are skipped, never fatal. Matching uses `scraper::Selector`, the
//! cascade orders declarations by (specificity, source order), and the inline
//! attribute forms the highest layer. `APPLY_STYLES` edits land in the same
//! inline layer at runtime.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// A pseudo-element slot tracked for asset discovery (`content: url(...)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pseudo {
    Before,
    After,
}

#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    value: String,
    specificity: u32,
    order: u32,
}

/// Per-document style index. Built once when a document is loaded; queried
/// synchronously during capture.
#[derive(Debug, Default)]
pub struct StyleEngine {
    rules: HashMap<NodeId, Vec<Declaration>>,
    pseudo_rules: HashMap<(NodeId, Pseudo), Vec<Declaration>>,
    // Inline layer: document `style=""` attributes plus runtime edits,
    // in application order. Last writer wins per property.
    inline: HashMap<NodeId, Vec<(String, String)>>,
}

impl StyleEngine {
    /// Index every rule in `sheets` against `document`, then layer in the
    /// documents' inline `style` attributes.
    pub fn build(document: &Html, sheets: &[String]) -> Self {
        let mut engine = StyleEngine::default();
        let mut order: u32 = 0;

        for sheet in sheets {
            let mut rules = Vec::new();
            parse_rules(sheet, &mut rules);
            for (selector_text, body) in rules {
                for single in selector_text.split(',') {
                    let single = single.trim();
                    if single.is_empty() {
                        continue;
                    }
                    let (base, pseudo) = split_pseudo(single);
                    let parsed = match Selector::parse(base) {
                        Ok(s) => s,
                        Err(_) => {
                            log::debug!("skipping unparseable selector: {}", single);
                            continue;
                        }
                    };
                    let spec = specificity(base);
                    let declarations = parse_declarations(&body);
                    if declarations.is_empty() {
                        continue;
                    }
                    for element in document.select(&parsed) {
                        let id = element.id();
                        let bucket = match pseudo {
                            None => engine.rules.entry(id).or_default(),
                            Some(p) => engine.pseudo_rules.entry((id, p)).or_default(),
                        };
                        for (name, value) in &declarations {
                            bucket.push(Declaration {
                                name: name.clone(),
                                value: value.clone(),
                                specificity: spec,
                                order,
                            });
                            order += 1;
                        }
                    }
                }
            }
        }

        // Inline style attributes are the top cascade layer.
        for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
            if let Some(style) = element.value().attr("style") {
                let entry = engine.inline.entry(element.id()).or_default();
                for (name, value) in parse_declarations(style) {
                    entry.push((name, value));
                }
            }
        }

        engine
    }

    /// Record a runtime inline-style edit for `node`. Equivalent to writing
    /// `element.style[prop] = value` on a live element.
    pub fn apply_inline(&mut self, node: NodeId, name: &str, value: &str) {
        self.inline
            .entry(node)
            .or_default()
            .push((name.to_ascii_lowercase(), value.trim().to_string()));
    }

    /// Resolve the computed value of `css_name` for `node`. Walks up the
    /// parent chain for inherited properties. Returns `None` when nothing in
    /// the document sets the property anywhere relevant.
    pub fn resolved(
        &self,
        document: &Html,
        node: NodeId,
        css_name: &str,
        inherited: bool,
    ) -> Option<String> {
        if let Some(v) = self.declared(node, css_name) {
            return Some(v);
        }
        if inherited {
            let mut current = crate::parent_element(document, node);
            while let Some(id) = current {
                if let Some(v) = self.declared(id, css_name) {
                    return Some(v);
                }
                current = crate::parent_element(document, id);
            }
        }
        None
    }

    /// Resolve a property declared on a pseudo-element of `node`.
    pub fn pseudo_resolved(&self, node: NodeId, pseudo: Pseudo, css_name: &str) -> Option<String> {
        let decls = self.pseudo_rules.get(&(node, pseudo))?;
        decls
            .iter()
            .filter(|d| d.name == css_name)
            .max_by_key(|d| (d.specificity, d.order))
            .map(|d| d.value.clone())
    }

    // Highest-precedence declared value for a single node: inline layer
    // first (last write wins), then the rule cascade.
    fn declared(&self, node: NodeId, css_name: &str) -> Option<String> {
        if let Some(inline) = self.inline.get(&node) {
            if let Some((_, v)) = inline.iter().rev().find(|(n, _)| n == css_name) {
                return Some(v.clone());
            }
        }
        self.rules.get(&node).and_then(|decls| {
            decls
                .iter()
                .filter(|d| d.name == css_name)
                .max_by_key(|d| (d.specificity, d.order))
                .map(|d| d.value.clone())
        })
    }
}

// Split "selector { body }" pairs out of a stylesheet, recursing into
// block-level at-rules (@media, @supports) and skipping the rest.
fn parse_rules(css: &str, out: &mut Vec<(String, String)>) {
    let css = strip_comments(css);
    let bytes = css.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        // find the next '{' and the matching '}'
        let open = match css[i..].find('{') {
            Some(o) => i + o,
            None => break,
        };
        let selector = css[i..open].trim().to_string();
        let mut depth = 1usize;
        let mut j = open + 1;
        while j < bytes.len() && depth > 0 {
            match bytes[j] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            j += 1;
        }
        let body_end = j.saturating_sub(1);
        let body = &css[open + 1..body_end.max(open + 1)];
        if selector.starts_with('@') {
            if body.contains('{') {
                parse_rules(body, out);
            }
            // @import/@charset and friends carry no matchable rules
        } else if !selector.is_empty() {
            out.push((selector, body.to_string()));
        }
        i = j;
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

// "color: red; font-size : 12px" -> [("color","red"), ("font-size","12px")]
fn parse_declarations(body: &str) -> Vec<(String, String)> {
    body.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = collapse_whitespace(value.trim().trim_end_matches("!important").trim());
            if name.is_empty() || value.is_empty() || name.starts_with("--") {
                return None;
            }
            Some((name, value))
        })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_ws {
                out.push(' ');
            }
            last_ws = true;
        } else {
            out.push(c);
            last_ws = false;
        }
    }
    out
}

// Approximate CSS specificity: ids dominate classes/attributes/pseudo-classes,
// which dominate type selectors.
fn specificity(selector: &str) -> u32 {
    let mut ids = 0u32;
    let mut classes = 0u32;
    let mut types = 0u32;
    for compound in selector.split(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~') {
        let compound = compound.trim();
        if compound.is_empty() {
            continue;
        }
        if compound.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
            types += 1;
        }
        ids += compound.matches('#').count() as u32;
        classes += compound.matches('.').count() as u32;
        classes += compound.matches('[').count() as u32;
        // single-colon pseudo-classes; "::" is a pseudo-element and stripped earlier
        classes += compound.matches(':').count() as u32;
    }
    ids * 1_000_000 + classes * 1_000 + types
}

// Strip a trailing ::before/::after (or legacy single-colon form) off a
// selector, reporting which pseudo slot the rule targets.
fn split_pseudo(selector: &str) -> (&str, Option<Pseudo>) {
    for (suffix, pseudo) in [
        ("::before", Pseudo::Before),
        ("::after", Pseudo::After),
        (":before", Pseudo::Before),
        (":after", Pseudo::After),
    ] {
        if let Some(base) = selector.strip_suffix(suffix) {
            let base = base.trim();
            return (if base.is_empty() { "*" } else { base }, Some(pseudo));
        }
    }
    (selector, None)
}
