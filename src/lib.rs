//! Folio Search
//!
//! Search and highlighting for paginated documents whose text is exposed
//! page by page as positioned runs.
//!
//! # Modules
//!
//! - `document`: text runs, the text provider and render surface seams, and
//!   the per-session page text cache
//! - `search`: literal matching, the ordered match index and the search
//!   controller
//! - `highlight`: overlay and in-place highlight renderers
//! - `navigation`: clamped page jumps with transient emphasis
//! - `engine`: the handle given to the host

pub mod config;
pub mod document;
pub mod engine;
pub mod highlight;
pub mod navigation;
pub mod search;

pub use config::Config;
pub use engine::SearchHandle;
pub use search::{SearchStatus, SearchSummary};
