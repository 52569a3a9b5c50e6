//! Highlight rendering
//!
//! Two strategies draw the matches of the visible page:
//! - [`OverlayRenderer`]: positioned elements over read-only text runs
//! - [`InPlaceRenderer`]: markers inserted into a mutable content tree
//!
//! Both keep the page's text unchanged: clearing a page always brings back
//! exactly what was there before it was rendered.

pub mod in_place;
pub mod overlay;
pub mod segments;
pub mod tree;

pub use in_place::InPlaceRenderer;
pub use overlay::{OverlayElement, OverlayLayer, OverlayRenderer};
pub use segments::{HighlightSpan, Segment, SegmentKind};
pub use tree::{ContentNode, ContentTree};

use crate::document::TextRun;
use crate::search::Match;

/// Everything needed to draw one page
#[derive(Debug, Clone, Copy)]
pub struct PageHighlights<'a> {
    pub page_number: u32,
    /// Runs of the page in item order
    pub runs: &'a [TextRun],
    /// Matches on the page
    pub matches: &'a [Match],
    /// Id of the current match, if it is on this page
    pub current: Option<usize>,
}

/// A highlight strategy bound to the host's rendering model
pub trait HighlightRenderer: Send {
    /// Draw a page's matches, replacing whatever was drawn there.
    /// Returns the number of highlights drawn.
    fn render(&mut self, page: &PageHighlights<'_>) -> usize;

    /// Remove every highlight from a page. Safe to call repeatedly.
    fn clear(&mut self, page_number: u32);

    /// Highlights currently drawn on a page
    fn highlight_count(&self, page_number: u32) -> usize;
}

/// Whether `name` can be emitted as an HTML tag or attribute name as is
pub(crate) fn is_markup_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
