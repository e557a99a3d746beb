//! Asset Collector.
//!
//! Traverses an element's subtree in pre-order and records every visual
//! resource it can see: images, background layers, inline SVG, media
//! sources, icon fonts, pseudo-element content, mask and clip-path
//! references. URLs are resolved to absolute form against the document
//! base; failures are recorded with an `error` marker rather than dropped.
//! Results are deduplicated by resolved URL and capped once at the end, so
//! the first assets in traversal order survive.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use serde::Serialize;
use url::Url;

use crate::cascade::{Pseudo, StyleEngine};
use crate::selector;
use crate::structure::SKIP_TAGS;
use crate::CaptureConfig;

/// Discriminates what kind of resource an [`Asset`] describes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    BackgroundImage,
    Img,
    ImgSrcset,
    SvgInline,
    SvgImage,
    PictureSource,
    VideoPoster,
    VideoSource,
    AudioSource,
    Iframe,
    IconFont,
    PseudoBefore,
    PseudoAfter,
    MaskImage,
    ClipPath,
    DataUri,
}

/// One discovered visual resource.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline payload: raw SVG markup or a truncated data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    /// Set when the URL existed but could not be resolved to absolute form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Asset {
    fn new(kind: AssetKind, selector: &str) -> Self {
        Asset {
            kind,
            url: None,
            code: None,
            selector: selector.to_string(),
            alt: None,
            width: None,
            height: None,
            background_size: None,
            font_family: None,
            media: None,
            mime_type: None,
            descriptor: None,
            error: None,
        }
    }
}

// Class-name prefixes of the common icon font libraries.
const ICON_CLASS_PREFIXES: &[&str] = &[
    "fa", "fas", "far", "fab", "fal", "fa-", "material-icons", "material-symbols",
    "glyphicon", "icon-", "bi-", "mdi", "mdi-",
];

struct Collector<'a> {
    document: &'a Html,
    engine: &'a StyleEngine,
    base_url: Option<&'a Url>,
    config: &'a CaptureConfig,
    out: Vec<Asset>,
    seen: HashSet<String>,
}

/// Collect every asset under `root`, deduplicated, at most
/// `config.max_assets` entries.
pub fn collect(
    document: &Html,
    engine: &StyleEngine,
    root: ElementRef,
    base_url: Option<&Url>,
    config: &CaptureConfig,
) -> Vec<Asset> {
    let mut collector = Collector {
        document,
        engine,
        base_url,
        config,
        out: Vec::new(),
        seen: HashSet::new(),
    };
    collector.visit(root);
    // Cap once at the end: closest-to-root in traversal order wins.
    collector.out.truncate(config.max_assets);
    collector.out
}

impl<'a> Collector<'a> {
    fn visit(&mut self, element: ElementRef<'a>) {
        let value = element.value();
        let tag = value.name().to_ascii_lowercase();
        if SKIP_TAGS.contains(&tag.as_str()) || crate::is_internal(value) {
            return;
        }
        let label = selector::resolve(element);
        let node = element.id();

        // 1. background-image layers from the resolved style
        if let Some(bg) = self.engine.resolved(self.document, node, "background-image", false) {
            let size = self.engine.resolved(self.document, node, "background-size", false);
            for layer in split_layers(&bg) {
                if let Some(url) = extract_url(&layer) {
                    let mut asset = Asset::new(AssetKind::BackgroundImage, &label);
                    asset.background_size = size.clone();
                    self.push_url(asset, &url);
                }
            }
        }

        // 2. tag-specific sources
        match tag.as_str() {
            "img" => self.visit_img(element, &label),
            "svg" => self.visit_svg(element, &label),
            "image" => {
                let href = value.attr("href").or_else(|| value.attr("xlink:href"));
                if let Some(href) = href {
                    self.push_url(Asset::new(AssetKind::SvgImage, &label), href);
                }
            }
            "source" => self.visit_source(element, &label),
            "video" => {
                if let Some(poster) = value.attr("poster") {
                    self.push_url(Asset::new(AssetKind::VideoPoster, &label), poster);
                }
                if let Some(src) = value.attr("src") {
                    self.push_url(Asset::new(AssetKind::VideoSource, &label), src);
                }
            }
            "audio" => {
                if let Some(src) = value.attr("src") {
                    self.push_url(Asset::new(AssetKind::AudioSource, &label), src);
                }
            }
            "iframe" => {
                if let Some(src) = value.attr("src") {
                    self.push_url(Asset::new(AssetKind::Iframe, &label), src);
                }
            }
            _ => {}
        }

        // 3. icon fonts by class prefix
        if let Some(class_attr) = value.attr("class") {
            if class_attr.split_whitespace().any(is_icon_class) {
                let mut asset = Asset::new(AssetKind::IconFont, &label);
                asset.font_family =
                    self.engine.resolved(self.document, node, "font-family", true);
                asset.code = Some(class_attr.to_string());
                let key = format!("icon-font:{}:{}", label, class_attr);
                if self.seen.insert(key) {
                    self.out.push(asset);
                }
            }
        }

        // 4. pseudo-element content images
        for (pseudo, kind) in
            [(Pseudo::Before, AssetKind::PseudoBefore), (Pseudo::After, AssetKind::PseudoAfter)]
        {
            if let Some(content) = self.engine.pseudo_resolved(node, pseudo, "content") {
                if let Some(url) = extract_url(&content) {
                    self.push_url(Asset::new(kind, &label), &url);
                }
            }
        }

        // 5. mask-image / clip-path url references
        if let Some(mask) = self.engine.resolved(self.document, node, "mask-image", false) {
            if let Some(url) = extract_url(&mask) {
                self.push_url(Asset::new(AssetKind::MaskImage, &label), &url);
            }
        }
        if let Some(clip) = self.engine.resolved(self.document, node, "clip-path", false) {
            if let Some(url) = extract_url(&clip) {
                self.push_url(Asset::new(AssetKind::ClipPath, &label), &url);
            }
        }

        for child in element.children().filter_map(ElementRef::wrap) {
            self.visit(child);
        }
    }

    fn visit_img(&mut self, element: ElementRef<'a>, label: &str) {
        let value = element.value();
        if let Some(src) = value.attr("src") {
            let mut asset = Asset::new(AssetKind::Img, label);
            asset.alt = value.attr("alt").map(str::to_string);
            asset.width = value.attr("width").map(str::to_string);
            asset.height = value.attr("height").map(str::to_string);
            self.push_url(asset, src);
        }
        if let Some(srcset) = value.attr("srcset") {
            for (url, descriptor) in parse_srcset(srcset) {
                let mut asset = Asset::new(AssetKind::ImgSrcset, label);
                asset.descriptor = descriptor;
                self.push_url(asset, &url);
            }
        }
    }

    fn visit_svg(&mut self, element: ElementRef<'a>, label: &str) {
        let markup = element.html();
        if markup.len() >= self.config.max_inline_svg_len {
            return;
        }
        if self.seen.insert(markup.clone()) {
            let mut asset = Asset::new(AssetKind::SvgInline, label);
            asset.code = Some(markup);
            self.out.push(asset);
        }
    }

    fn visit_source(&mut self, element: ElementRef<'a>, label: &str) {
        let value = element.value();
        let kind = element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| p.value().name().to_ascii_lowercase())
            .and_then(|parent| match parent.as_str() {
                "picture" => Some(AssetKind::PictureSource),
                "video" => Some(AssetKind::VideoSource),
                "audio" => Some(AssetKind::AudioSource),
                _ => None,
            });
        let Some(kind) = kind else { return };

        let url = value
            .attr("src")
            .map(str::to_string)
            .or_else(|| value.attr("srcset").and_then(|s| parse_srcset(s).into_iter().next().map(|(u, _)| u)));
        if let Some(url) = url {
            let mut asset = Asset::new(kind, label);
            asset.media = value.attr("media").map(str::to_string);
            asset.mime_type = value.attr("type").map(str::to_string);
            self.push_url(asset, &url);
        }
    }

    // Resolve, dedupe, and record one url-bearing asset.
    fn push_url(&mut self, mut asset: Asset, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        if raw.starts_with("data:") {
            let truncated = crate::truncate_chars(raw, self.config.max_data_uri_len);
            if self.seen.insert(truncated.clone()) {
                asset.kind = AssetKind::DataUri;
                asset.code = Some(truncated);
                self.out.push(asset);
            }
            return;
        }

        let resolved = match Url::parse(raw) {
            Ok(abs) => Ok(abs.to_string()),
            Err(_) => match self.base_url {
                Some(base) => base.join(raw).map(|u| u.to_string()).map_err(|e| e.to_string()),
                None => Err("no document base URL".to_string()),
            },
        };

        let final_url = match resolved {
            Ok(abs) => abs,
            Err(reason) => {
                // keep the raw value so consumers know the asset existed
                asset.error = Some(reason);
                raw.to_string()
            }
        };
        if self.seen.insert(final_url.clone()) {
            asset.url = Some(final_url);
            self.out.push(asset);
        }
    }
}

fn is_icon_class(class: &str) -> bool {
    ICON_CLASS_PREFIXES
        .iter()
        .any(|p| class == *p || (p.ends_with('-') && class.starts_with(p)))
}

// Split a multi-layer CSS value on commas that are not inside parentheses
// (data URIs contain commas inside `url(...)`).
fn split_layers(value: &str) -> Vec<String> {
    let mut layers = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in value.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                layers.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        layers.push(current.trim().to_string());
    }
    layers
}

// Pull the target out of a `url(...)` function, stripping quotes.
fn extract_url(value: &str) -> Option<String> {
    let start = value.find("url(")?;
    let rest = &value[start + 4..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim().trim_matches('"').trim_matches('\'');
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

// "a.png 1x, b.png 2x" -> [("a.png", Some("1x")), ("b.png", Some("2x"))]
fn parse_srcset(srcset: &str) -> Vec<(String, Option<String>)> {
    srcset
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?.to_string();
            let descriptor = parts.next().map(str::to_string);
            Some((url, descriptor))
        })
        .collect()
}
