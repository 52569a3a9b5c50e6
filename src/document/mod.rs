//! Document abstraction
//!
//! Positioned page text, the collaborators that produce and display it, and
//! the per-session cache sitting between them.
//!
//! ```text
//! ┌──────────────┐  extract_page_text  ┌────────────────┐
//! │ TextProvider │ ◄────────────────── │ PageTextCache  │ ◄── search
//! └──────────────┘   (once per page)   └────────────────┘
//! ```

mod cache;
mod error;
mod provider;
mod traits;
mod types;

pub use cache::{CacheStats, PageRuns, PageTextCache, TEXT_TIMEOUT_SECS};
pub use error::{ExtractionError, Result};
pub use provider::{ContentTreeProvider, StaticTextProvider};
pub use traits::{RenderSurface, TextProvider};
pub use types::{FontDescriptor, PageStatus, TextRun, Transform};
