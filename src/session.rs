//! Capture session: one loaded document plus its style engine, inspector
//! and message loop.
//!
//! A [`Session`] owns the parsed document, the resolved cascade, the
//! inspect-mode state machine and the bounds provider. Inbound control
//! messages are JSON objects discriminated by a `type` field; every request
//! gets exactly one JSON response, and element selection additionally emits
//! an `ELEMENT_SELECTED` notification.

use std::collections::BTreeMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::assets::{self, Asset};
use crate::bounds::{BoundsProvider, NoopBounds};
use crate::cascade::StyleEngine;
use crate::error::{Error, Result};
use crate::inspect::{InspectEvent, Inspector, OverlayBox, Tooltip};
use crate::markup;
use crate::selector;
use crate::structure::{self, DomNode};
use crate::style::{self, StyleMap};
use crate::{CaptureConfig, ElementSnapshot};

/// Inbound control messages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "TOGGLE_INSPECT_MODE")]
    ToggleInspectMode,
    #[serde(rename = "ENABLE_INSPECT_MODE")]
    EnableInspectMode,
    #[serde(rename = "DISABLE_INSPECT_MODE")]
    DisableInspectMode,
    #[serde(rename = "APPLY_STYLES")]
    ApplyStyles {
        #[serde(default)]
        selector: Option<String>,
        styles: BTreeMap<String, String>,
    },
    #[serde(rename = "GET_ELEMENT_STYLES")]
    GetElementStyles,
    #[serde(rename = "GET_ELEMENT_HTML")]
    GetElementHtml,
    #[serde(rename = "PING")]
    Ping,
}

/// Outbound replies. Untagged: the field shape identifies the reply.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Mode {
        success: bool,
        #[serde(rename = "isInspectMode")]
        is_inspect_mode: bool,
    },
    Styles {
        success: bool,
        styles: StyleMap,
        html: String,
        assets: Vec<Asset>,
        #[serde(rename = "domStructure")]
        dom_structure: Option<DomNode>,
    },
    Html {
        success: bool,
        html: String,
        #[serde(rename = "domStructure")]
        dom_structure: Option<DomNode>,
    },
    Ok { success: bool },
    Failure { success: bool, error: String },
}

impl Response {
    fn failure(err: Error) -> Self {
        Response::Failure { success: false, error: err.to_string() }
    }
}

/// Unsolicited outbound events.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "ELEMENT_SELECTED")]
    ElementSelected { data: ElementSnapshot },
}

pub struct Session {
    config: CaptureConfig,
    document: Html,
    base_url: Option<Url>,
    engine: StyleEngine,
    inspector: Inspector,
    bounds: Box<dyn BoundsProvider>,
}

impl Session {
    /// Build a session over already-parsed markup. Inline `<style>` blocks
    /// feed the cascade; linked stylesheets are only available through
    /// [`Session::load_url`].
    pub fn from_html(html: &str, base_url: Option<Url>, config: CaptureConfig) -> Session {
        let document = Html::parse_document(html);
        let sheets = inline_sheets(&document);
        let engine = StyleEngine::build(&document, &sheets);
        Session {
            config,
            document,
            base_url,
            engine,
            inspector: Inspector::new(),
            bounds: Box::new(NoopBounds::new()),
        }
    }

    /// Fetch a page over HTTP, along with its linked stylesheets, and build
    /// a session from it. Stylesheets that fail to fetch are skipped with a
    /// warning; the page itself must load.
    #[cfg(feature = "fetch")]
    pub fn load_url(url: &str, config: CaptureConfig) -> Result<Session> {
        use std::time::Duration;

        let base = Url::parse(url).map_err(|e| Error::LoadError(format!("{}: {}", url, e)))?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::NetworkError(e.to_string()))?;

        let body = client
            .get(base.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        let document = Html::parse_document(&body);

        let mut sheets = inline_sheets(&document);
        if let Ok(links) = Selector::parse("link[rel=\"stylesheet\"]") {
            for link in document.select(&links) {
                let Some(href) = link.value().attr("href") else { continue };
                let resolved = match base.join(href) {
                    Ok(u) => u,
                    Err(e) => {
                        log::warn!("skipping stylesheet {}: {}", href, e);
                        continue;
                    }
                };
                match client.get(resolved.clone()).send().and_then(|r| r.text()) {
                    Ok(css) => sheets.push(css),
                    Err(e) => log::warn!("skipping stylesheet {}: {}", resolved, e),
                }
            }
        }

        let engine = StyleEngine::build(&document, &sheets);
        log::info!("loaded {} with {} stylesheet(s)", base, sheets.len());
        Ok(Session {
            config,
            document,
            base_url: Some(base),
            engine,
            inspector: Inspector::new(),
            bounds: Box::new(NoopBounds::new()),
        })
    }

    /// Swap in a layout backend that can answer geometry queries.
    pub fn set_bounds_provider(&mut self, provider: Box<dyn BoundsProvider>) {
        self.bounds = provider;
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    /// First element matching a CSS selector.
    pub fn find(&self, css: &str) -> Result<NodeId> {
        let sel = Selector::parse(css).map_err(|_| Error::SelectorError(css.to_string()))?;
        self.document
            .select(&sel)
            .next()
            .map(|el| el.id())
            .ok_or_else(|| Error::NoMatch(css.to_string()))
    }

    fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.document.tree.get(node).and_then(ElementRef::wrap)
    }

    fn selected(&self) -> Result<NodeId> {
        self.inspector.selected().ok_or(Error::NoSelection)
    }

    /// Snapshot one element: label, styles, markup, assets, structure, text
    /// and geometry.
    pub fn capture(&self, target: NodeId) -> Result<ElementSnapshot> {
        let element = self
            .element(target)
            .ok_or_else(|| Error::Other("stale element reference".into()))?;

        let dom_structure =
            structure::extract(&self.document, &self.engine, element, self.config.max_depth);
        let html = dom_structure
            .as_ref()
            .map(|node| markup::to_markup(node, self.config.max_markup_len))
            .unwrap_or_default();

        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let text_content = (!text.is_empty())
            .then(|| crate::truncate_chars(&text, self.config.max_text_len));

        Ok(ElementSnapshot {
            selector: selector::resolve(element),
            path: selector::path(element, self.config.path_depth),
            tag_name: element.value().name().to_ascii_lowercase(),
            class_name: element.value().attr("class").unwrap_or("").to_string(),
            styles: style::snapshot(&self.document, &self.engine, target),
            html,
            assets: assets::collect(
                &self.document,
                &self.engine,
                element,
                self.base_url.as_ref(),
                &self.config,
            ),
            dom_structure,
            text_content,
            rect: self.bounds.bounds(target).unwrap_or_default(),
        })
    }

    /// Drive the inspector with an input event. Selection clicks return the
    /// `ELEMENT_SELECTED` notification to emit.
    pub fn dispatch_event(&mut self, event: InspectEvent) -> Result<Option<Notification>> {
        match event {
            InspectEvent::Enable => {
                self.inspector.enable();
                Ok(None)
            }
            InspectEvent::Disable => {
                self.inspector.disable();
                Ok(None)
            }
            InspectEvent::Toggle => {
                self.inspector.toggle();
                Ok(None)
            }
            InspectEvent::Escape => {
                self.inspector.escape();
                Ok(None)
            }
            InspectEvent::MouseMove { target, x, y } => {
                if self.inspector.hover(target) {
                    self.present_hover(target, x, y);
                }
                Ok(None)
            }
            InspectEvent::Click { target } => {
                if !self.inspector.begin_capture(target) {
                    return Ok(None);
                }
                match self.capture(target) {
                    Ok(snapshot) => {
                        self.inspector.complete_capture(target);
                        log::info!("captured {}", snapshot.selector);
                        Ok(Some(Notification::ElementSelected { data: snapshot }))
                    }
                    Err(err) => {
                        log::warn!("capture failed: {}", err);
                        self.inspector.abort_capture();
                        Err(err)
                    }
                }
            }
        }
    }

    fn present_hover(&mut self, target: NodeId, x: f64, y: f64) {
        // read everything off the element before touching the inspector
        let Some(element) = self.element(target) else { return };
        let tag_name = element.value().name().to_ascii_lowercase();
        let label = selector::resolve(element);
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let rect = self.bounds.bounds(target);

        self.inspector.set_overlay(OverlayBox {
            rect: rect.unwrap_or_default(),
            selected: false,
        });

        let (tx, ty) = Tooltip::place(x, y, self.config.viewport);
        self.inspector.set_tooltip(Tooltip {
            tag_name,
            selector: label,
            size_label: rect.map(|r| format!("{:.0}×{:.0}", r.width, r.height)),
            text_excerpt: (!text.is_empty())
                .then(|| crate::truncate_chars(&text, self.config.tooltip_text_len)),
            x: tx,
            y: ty,
        });
    }

    /// Handle one raw JSON message; malformed input degrades to a failure
    /// reply instead of an error.
    pub fn handle_message(&mut self, raw: &str) -> Response {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle_request(request),
            Err(err) => Response::failure(Error::MessageError(err.to_string())),
        }
    }

    pub fn handle_request(&mut self, request: Request) -> Response {
        match self.try_handle(request) {
            Ok(response) => response,
            Err(err) => Response::failure(err),
        }
    }

    fn try_handle(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::ToggleInspectMode => {
                let on = self.inspector.toggle();
                Ok(Response::Mode { success: true, is_inspect_mode: on })
            }
            Request::EnableInspectMode => {
                self.inspector.enable();
                Ok(Response::Mode { success: true, is_inspect_mode: true })
            }
            Request::DisableInspectMode => {
                self.inspector.disable();
                Ok(Response::Mode { success: true, is_inspect_mode: false })
            }
            Request::ApplyStyles { selector, styles } => {
                self.apply_styles(selector.as_deref(), &styles)?;
                Ok(Response::Ok { success: true })
            }
            Request::GetElementStyles => {
                let target = self.selected()?;
                let snapshot = self.capture(target)?;
                Ok(Response::Styles {
                    success: true,
                    styles: snapshot.styles,
                    html: snapshot.html,
                    assets: snapshot.assets,
                    dom_structure: snapshot.dom_structure,
                })
            }
            Request::GetElementHtml => {
                let target = self.selected()?;
                let snapshot = self.capture(target)?;
                Ok(Response::Html {
                    success: true,
                    html: snapshot.html,
                    dom_structure: snapshot.dom_structure,
                })
            }
            Request::Ping => Ok(Response::Ok { success: true }),
        }
    }

    /// Overlay style edits onto an element: the current selection when one
    /// exists, otherwise the first match of the given selector. Keys may be
    /// spelled either way; unknown camelCase keys are converted blindly.
    fn apply_styles(
        &mut self,
        css_selector: Option<&str>,
        styles: &BTreeMap<String, String>,
    ) -> Result<()> {
        let target = match self.inspector.selected() {
            Some(node) => node,
            None => {
                let sel = css_selector.ok_or(Error::NoSelection)?;
                self.find(sel)?
            }
        };
        for (name, value) in styles {
            let css = match style::property(name) {
                Some(prop) => prop.css.to_string(),
                None => camel_to_kebab(name),
            };
            self.engine.apply_inline(target, &css, value);
        }
        log::debug!("applied {} style(s)", styles.len());
        Ok(())
    }
}

fn inline_sheets(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("style") else { return Vec::new() };
    document
        .select(&sel)
        .map(|style| style.text().collect::<String>())
        .filter(|css| !css.trim().is_empty())
        .collect()
}

fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
