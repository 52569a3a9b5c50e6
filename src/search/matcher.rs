//! Literal term matching
//!
//! The search term is escaped before being compiled, so characters such as
//! `.`, `*`, `(` or `\` are matched as themselves and never form a pattern.
//! Matching is per run: an occurrence split across two runs is not found.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::document::TextRun;

/// One occurrence of the term, in global scan order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Position in the match list (scan order)
    pub id: usize,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Run the occurrence lives in
    pub item_index: usize,
    /// Occurrence ordinal within the run
    pub local_match_index: usize,
    /// Byte offset of the occurrence in the run text
    pub start: usize,
    /// Byte length of the occurrence
    pub len: usize,
    /// The text as it appears in the run (original casing)
    pub matched_text: String,
}

impl Match {
    /// Total-order key: `(page, item, local ordinal)`
    pub fn key(&self) -> (u32, usize, usize) {
        (self.page_number, self.item_index, self.local_match_index)
    }

    /// Byte range of the occurrence in its run
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Compiled literal matcher for one term
#[derive(Debug, Clone)]
pub struct TermMatcher {
    term: String,
    case_sensitive: bool,
    regex: Regex,
}

impl TermMatcher {
    /// Compile a matcher. Returns `None` for an empty or whitespace-only term.
    pub fn new(term: &str, case_sensitive: bool) -> Option<Self> {
        if term.trim().is_empty() {
            return None;
        }

        let regex = match RegexBuilder::new(&regex::escape(term))
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                tracing::warn!(error = %e, "Search term could not be compiled");
                return None;
            }
        };

        Some(Self {
            term: term.to_string(),
            case_sensitive,
            regex,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Non-overlapping occurrences in `text`, left to right
    pub fn find_in<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Range<usize>> + 't {
        self.regex.find_iter(text).map(|m| m.range())
    }

    /// Append the matches of one run to `out`, numbering ids from `out.len()`
    pub fn scan_run(&self, run: &TextRun, out: &mut Vec<Match>) {
        for (local_match_index, range) in self.find_in(&run.text).enumerate() {
            out.push(Match {
                id: out.len(),
                page_number: run.page_number,
                item_index: run.item_index,
                local_match_index,
                start: range.start,
                len: range.len(),
                matched_text: run.text[range].to_string(),
            });
        }
    }
}

/// Scan runs for a term in `(page, item)` order
///
/// An empty or whitespace-only term yields no matches.
pub fn scan(runs: &[TextRun], term: &str, case_sensitive: bool) -> Vec<Match> {
    let Some(matcher) = TermMatcher::new(term, case_sensitive) else {
        return Vec::new();
    };

    let mut ordered: Vec<&TextRun> = runs.iter().collect();
    ordered.sort_by_key(|run| (run.page_number, run.item_index));

    let mut matches = Vec::new();
    for run in ordered {
        matcher.scan_run(run, &mut matches);
    }
    matches
}
