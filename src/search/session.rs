//! Search session state
//!
//! A session is replaced wholesale by every new search. Its generation tags
//! all asynchronous work started on its behalf.

use serde::Serialize;

use super::index::MatchIndex;
use super::matcher::Match;

/// Lifecycle of a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Scanning,
    Ready,
    Empty,
}

/// What the host displays: `current / total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub match_count: usize,
    /// 1-based ordinal of the current match, 0 when there are no matches
    pub current_match_ordinal: usize,
}

/// State of one search invocation
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub term: String,
    pub generation: u64,
    pub matches: MatchIndex,
    pub current_index: usize,
    pub status: SearchStatus,
}

impl SearchSession {
    pub fn idle(generation: u64) -> Self {
        Self {
            term: String::new(),
            generation,
            matches: MatchIndex::default(),
            current_index: 0,
            status: SearchStatus::Idle,
        }
    }

    pub fn scanning(term: &str, generation: u64) -> Self {
        Self {
            term: term.to_string(),
            status: SearchStatus::Scanning,
            ..Self::idle(generation)
        }
    }

    /// Whether the session has finished scanning
    pub fn is_settled(&self) -> bool {
        matches!(self.status, SearchStatus::Ready | SearchStatus::Empty)
    }

    pub fn summary(&self) -> SearchSummary {
        if self.matches.is_empty() {
            SearchSummary::default()
        } else {
            SearchSummary {
                match_count: self.matches.len(),
                current_match_ordinal: self.current_index + 1,
            }
        }
    }

    pub fn current(&self) -> Option<&Match> {
        self.matches.get(self.current_index)
    }

    /// Replace the match list, keeping `current_index` in range
    pub fn set_matches(&mut self, matches: MatchIndex) {
        self.matches = matches;
        if self.current_index >= self.matches.len() {
            self.current_index = 0;
        }
    }

    /// Advance with wraparound; `None` when there are no matches
    pub fn step_forward(&mut self) -> Option<&Match> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.current_index = (self.current_index + 1) % len;
        self.current()
    }

    /// Retreat with wraparound; `None` when there are no matches
    pub fn step_back(&mut self) -> Option<&Match> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.current_index = (self.current_index + len - 1) % len;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextRun;
    use crate::search::matcher::TermMatcher;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn session_with(count: usize) -> SearchSession {
        let text = vec!["x"; count].join(" ");
        let matcher = TermMatcher::new("x", false).unwrap();
        let pages = BTreeMap::from([(1, Arc::new(vec![TextRun::new(1, 0, text)]))]);
        let mut session = SearchSession::scanning("x", 1);
        session.set_matches(MatchIndex::rebuild(&pages, &matcher));
        session
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let session = SearchSession::idle(0);
        assert_eq!(session.summary(), SearchSummary::default());
        assert_eq!(session.summary().current_match_ordinal, 0);
    }

    #[test]
    fn test_wraparound_law() {
        for len in 1..5 {
            for start in 0..len {
                let mut session = session_with(len);
                session.current_index = start;

                session.step_forward();
                session.step_back();
                assert_eq!(session.current_index, start);

                session.step_back();
                session.step_forward();
                assert_eq!(session.current_index, start);
            }
        }
    }

    #[test]
    fn test_step_wraps_at_ends() {
        let mut session = session_with(3);
        session.current_index = 2;
        assert_eq!(session.step_forward().map(|m| m.id), Some(0));
        assert_eq!(session.step_back().map(|m| m.id), Some(2));
    }

    #[test]
    fn test_step_on_empty_is_noop() {
        let mut session = SearchSession::idle(0);
        assert!(session.step_forward().is_none());
        assert!(session.step_back().is_none());
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_string(&session_with(2).summary()).unwrap();
        assert_eq!(json, r#"{"matchCount":2,"currentMatchOrdinal":1}"#);
    }
}
