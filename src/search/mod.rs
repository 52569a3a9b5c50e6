//! Search
//!
//! Literal term matching over page text, the document-wide match index, and
//! the controller that ties them to the page cache, navigation and
//! highlighting.

pub mod controller;
pub mod index;
pub mod matcher;
pub mod session;

pub use controller::SearchController;
pub use index::MatchIndex;
pub use matcher::{scan, Match, TermMatcher};
pub use session::{SearchSession, SearchStatus, SearchSummary};
