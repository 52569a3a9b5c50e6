//! Document error types
//!
//! Failures raised while obtaining a page's text. None of these are fatal to
//! a search: an errored page simply contributes zero matches.

use thiserror::Error;

/// Page text extraction error
///
/// `Clone` because one failed extraction is handed to every caller that was
/// waiting on the same coalesced request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Page content could not be parsed
    #[error("Parse error on page {page}: {reason}")]
    Parse { page: u32, reason: String },

    /// Page does not exist in the document
    #[error("Page not found: {0}")]
    PageNotFound(u32),

    /// Provider did not answer in time
    #[error("Text extraction for page {page} timed out after {secs} seconds")]
    Timeout { page: u32, secs: u64 },

    /// Any other provider failure
    #[error("Text provider error: {0}")]
    Provider(String),
}

impl ExtractionError {
    pub fn parse(page: u32, reason: impl Into<String>) -> Self {
        Self::Parse {
            page,
            reason: reason.into(),
        }
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;
