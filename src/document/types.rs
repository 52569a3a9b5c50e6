//! Core document types
//!
//! Positioned text as produced by a text provider, one run per extracted
//! text fragment on a page.

use serde::{Deserialize, Serialize};

/// Skew (in degrees) above which a run is rendered as italic
const ITALIC_SKEW_THRESHOLD_DEG: f64 = 1.0;

/// 2D text matrix `[a, b, c, d, e, f]`
///
/// `(a, b)` is the scaled x-axis of the glyph space, `(c, d)` the y-axis
/// (shear column) and `(e, f)` the origin of the run on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform(pub [f64; 6]);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity matrix positioned at the page origin
    pub fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    /// Unrotated text of the given font size at `(x, y)`
    pub fn at(x: f64, y: f64, font_size: f64) -> Self {
        Self([font_size, 0.0, 0.0, font_size, x, y])
    }

    /// Run origin (translation component)
    pub fn origin(&self) -> (f64, f64) {
        (self.0[4], self.0[5])
    }

    /// Font size: magnitude of the x-axis scale vector
    pub fn font_size(&self) -> f64 {
        self.0[0].hypot(self.0[1])
    }

    /// Horizontal stretch relative to the font size
    pub fn scale_x(&self) -> f64 {
        let size = self.font_size();
        if size == 0.0 {
            1.0
        } else {
            self.0[0] / size
        }
    }

    /// Baseline rotation in degrees
    pub fn rotation_degrees(&self) -> f64 {
        self.0[1].atan2(self.0[0]).to_degrees()
    }

    /// Shear of the y-axis away from the baseline normal, in degrees
    ///
    /// Zero for upright text; `[1, 0, tan φ, 1]` yields `φ`.
    pub fn skew_degrees(&self) -> f64 {
        let x_axis = self.0[1].atan2(self.0[0]).to_degrees();
        let y_axis = self.0[3].atan2(self.0[2]).to_degrees();
        normalize_degrees(90.0 - (y_axis - x_axis))
    }

    /// Whether the shear is strong enough to treat the run as italic
    pub fn is_italic(&self) -> bool {
        self.skew_degrees().abs() > ITALIC_SKEW_THRESHOLD_DEG
    }
}

fn normalize_degrees(mut deg: f64) -> f64 {
    while deg > 180.0 {
        deg -= 360.0;
    }
    while deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

/// Font information attached to a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDescriptor {
    /// Font resource name (e.g. `g_d0_f1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// CSS font family, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl FontDescriptor {
    pub fn family(family: &str) -> Self {
        Self {
            name: None,
            family: Some(family.to_string()),
        }
    }
}

/// One extracted unit of text on a page
///
/// Immutable once produced. Matches never span two runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Position of the run within its page
    pub item_index: usize,
    /// The text content
    pub text: String,
    /// Placement on the page
    #[serde(default)]
    pub transform: Transform,
    /// Font metadata
    #[serde(default)]
    pub font: FontDescriptor,
}

impl TextRun {
    /// Create an unpositioned run
    pub fn new(page_number: u32, item_index: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            item_index,
            text: text.into(),
            transform: Transform::identity(),
            font: FontDescriptor::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_font(mut self, font: FontDescriptor) -> Self {
        self.font = font;
        self
    }
}

/// Extraction status of a cached page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Pending,
    Loaded,
    Errored,
}
