//! Overlay highlight strategy
//!
//! For rendering models that expose positioned, read-only text runs (a PDF
//! text layer). Each run holding at least one match on the visible page gets
//! an absolutely positioned element laid over it, rebuilt from the run's
//! text matrix. The underlying text layer is never touched.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use super::segments::{self, HighlightSpan, Segment, SegmentKind};
use super::{HighlightRenderer, PageHighlights};
use crate::config::HighlightConfig;
use crate::document::TextRun;
use crate::search::Match;

/// Positioned overlay for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayElement {
    pub item_index: usize,
    pub left: f64,
    pub top: f64,
    pub font_size: f64,
    pub font_family: String,
    pub scale_x: f64,
    pub rotation_deg: f64,
    pub skew_deg: f64,
    pub italic: bool,
    pub segments: Vec<Segment>,
}

impl OverlayElement {
    /// Build the overlay of a run; `None` when no match falls in it
    pub fn from_run(
        run: &TextRun,
        matches: &[Match],
        current: Option<usize>,
        config: &HighlightConfig,
    ) -> Option<Self> {
        let spans: Vec<HighlightSpan> = matches
            .iter()
            .filter(|m| m.page_number == run.page_number && m.item_index == run.item_index)
            .map(|m| HighlightSpan {
                range: m.range(),
                match_id: m.id,
                current: Some(m.id) == current,
            })
            .collect();
        if spans.is_empty() {
            return None;
        }

        let segments = segments::split(&run.text, &spans);
        if !segments.iter().any(Segment::is_highlight) {
            return None;
        }

        let transform = &run.transform;
        let (left, top) = transform.origin();
        let font_family = run
            .font
            .family
            .clone()
            .or_else(|| run.font.name.clone())
            .unwrap_or_else(|| config.fallback_font_family.clone());

        Some(Self {
            item_index: run.item_index,
            left,
            top,
            font_size: transform.font_size(),
            font_family,
            scale_x: transform.scale_x(),
            rotation_deg: transform.rotation_degrees(),
            skew_deg: transform.skew_degrees(),
            italic: transform.is_italic(),
            segments,
        })
    }

    /// Full text of the element (equals the run text)
    pub fn text(&self) -> String {
        segments::concat(&self.segments)
    }

    /// Number of highlighted segments
    pub fn highlight_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_highlight()).count()
    }

    /// Inline CSS placing the element over its run
    pub fn style(&self) -> String {
        let mut style = format!(
            "position: absolute; left: {}px; top: {}px; font-size: {}px; font-family: {};",
            self.left,
            self.top,
            self.font_size,
            css_font_family(&self.font_family)
        );

        let mut transform = format!("scaleX({})", self.scale_x);
        if self.rotation_deg != 0.0 {
            let _ = write!(transform, " rotate({}deg)", self.rotation_deg);
        }
        if self.italic {
            let _ = write!(transform, " skewX({}deg)", self.skew_deg);
        }
        let _ = write!(style, " transform: {};", transform);

        if self.italic {
            style.push_str(" font-style: italic;");
        }
        style
    }

    pub fn to_html(&self, config: &HighlightConfig) -> String {
        let mut html = format!(
            "<div style=\"{}\">",
            html_escape::encode_double_quoted_attribute(&self.style())
        );
        for segment in &self.segments {
            let text = html_escape::encode_text(&segment.text);
            match segment.kind {
                SegmentKind::Plain => html.push_str(&text),
                SegmentKind::Highlight { current, .. } => {
                    let class = if current {
                        &config.current_class
                    } else {
                        &config.match_class
                    };
                    let _ = write!(
                        html,
                        "<span class=\"{}\">{}</span>",
                        html_escape::encode_double_quoted_attribute(class),
                        text
                    );
                }
            }
        }
        html.push_str("</div>");
        html
    }
}

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// Font family list safe to place in a `style` attribute
///
/// Generic families stay bare; every other name is quoted after dropping
/// characters that could end the string or the declaration.
fn css_font_family(families: &str) -> String {
    let list: Vec<String> = families
        .split(',')
        .filter_map(|family| {
            let name: String = family
                .chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
                .collect();
            let name = name.trim();
            if name.is_empty() {
                None
            } else if GENERIC_FAMILIES.contains(&name) {
                Some(name.to_string())
            } else {
                Some(format!("'{}'", name))
            }
        })
        .collect();

    if list.is_empty() {
        "sans-serif".to_string()
    } else {
        list.join(", ")
    }
}

/// All overlay elements drawn for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayer {
    pub page_number: u32,
    pub elements: Vec<OverlayElement>,
}

impl OverlayLayer {
    pub fn highlight_count(&self) -> usize {
        self.elements.iter().map(OverlayElement::highlight_count).sum()
    }

    pub fn to_html(&self, config: &HighlightConfig) -> String {
        let mut html = String::from(
            "<div class=\"highlight-layer\" style=\"position: absolute; inset: 0; pointer-events: none;\">",
        );
        for element in &self.elements {
            html.push_str(&element.to_html(config));
        }
        html.push_str("</div>");
        html
    }
}

/// Overlay renderer keeping the layer currently drawn for each page
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    config: HighlightConfig,
    layers: BTreeMap<u32, OverlayLayer>,
}

impl OverlayRenderer {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            layers: BTreeMap::new(),
        }
    }

    /// Layer drawn on a page, if any
    pub fn layer(&self, page_number: u32) -> Option<&OverlayLayer> {
        self.layers.get(&page_number)
    }

    /// Markup of a page's layer, if any
    pub fn to_html(&self, page_number: u32) -> Option<String> {
        self.layers
            .get(&page_number)
            .map(|layer| layer.to_html(&self.config))
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }
}

impl HighlightRenderer for OverlayRenderer {
    fn render(&mut self, page: &PageHighlights<'_>) -> usize {
        self.layers.remove(&page.page_number);

        let elements: Vec<OverlayElement> = page
            .runs
            .iter()
            .filter_map(|run| {
                OverlayElement::from_run(run, page.matches, page.current, &self.config)
            })
            .collect();
        if elements.is_empty() {
            return 0;
        }

        let layer = OverlayLayer {
            page_number: page.page_number,
            elements,
        };
        let drawn = layer.highlight_count();
        tracing::debug!(page = page.page_number, highlights = drawn, "Rendered overlay layer");
        self.layers.insert(page.page_number, layer);
        drawn
    }

    fn clear(&mut self, page_number: u32) {
        self.layers.remove(&page_number);
    }

    fn highlight_count(&self, page_number: u32) -> usize {
        self.layers
            .get(&page_number)
            .map(OverlayLayer::highlight_count)
            .unwrap_or(0)
    }
}
