//! Document traits
//!
//! The two external collaborators of the engine: where page text comes from
//! and where jumps and emphasis are sent.

use async_trait::async_trait;

use super::error::Result;
use super::types::TextRun;

/// Source of positioned page text
///
/// Implementations wrap a layout engine (PDF text layer, rendered DOCX tree,
/// ...). Each call may suspend; the cache guarantees at most one call per
/// page for the lifetime of a document session.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Number of pages in the document (0 while the document is not loaded)
    fn page_count(&self) -> u32;

    /// Extract the text runs of a page (1-indexed), in reading order
    async fn extract_page_text(&self, page_number: u32) -> Result<Vec<TextRun>>;
}

/// Rendering surface the engine drives
pub trait RenderSurface: Send + Sync {
    /// Bring a page (1-indexed) into view
    fn scroll_to_page(&self, page_number: u32);

    /// Apply or remove the transient emphasis drawn around a page after a jump
    fn set_page_emphasis(&self, _page_number: u32, _emphasized: bool) {}
}
