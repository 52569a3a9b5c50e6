//! Document-wide match index
//!
//! Pages can finish loading in any order, so the index is never appended
//! to. Every time a page arrives it is re-derived from all loaded pages in
//! page-number order, which keeps ids equal to list positions and the list
//! sorted by `(page, item, local ordinal)`.

use std::collections::BTreeMap;

use super::matcher::{Match, TermMatcher};
use crate::document::PageRuns;

/// Ordered list of all matches over the loaded pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchIndex {
    matches: Vec<Match>,
}

impl MatchIndex {
    /// Rebuild from every loaded page
    pub fn rebuild(pages: &BTreeMap<u32, PageRuns>, matcher: &TermMatcher) -> Self {
        let mut matches = Vec::new();
        for runs in pages.values() {
            let mut ordered: Vec<_> = runs.iter().collect();
            ordered.sort_by_key(|run| run.item_index);
            for run in ordered {
                matcher.scan_run(run, &mut matches);
            }
        }
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Match> {
        self.matches.get(index)
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    /// Matches of one page; contiguous because the list is page-ordered
    pub fn on_page(&self, page_number: u32) -> &[Match] {
        let start = self
            .matches
            .partition_point(|m| m.page_number < page_number);
        let end = self
            .matches
            .partition_point(|m| m.page_number <= page_number);
        &self.matches[start..end]
    }

    /// Number of matches on each page that has any
    pub fn page_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.matches {
            *counts.entry(m.page_number).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextRun;
    use std::sync::Arc;

    fn page(page: u32, texts: &[&str]) -> (u32, PageRuns) {
        let runs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextRun::new(page, i, *t))
            .collect();
        (page, Arc::new(runs))
    }

    #[test]
    fn test_rebuild_is_order_independent() {
        let matcher = TermMatcher::new("foo", false).unwrap();

        // Page 3 loaded first, page 1 later
        let mut pages = BTreeMap::new();
        let (n, runs) = page(3, &["foo"]);
        pages.insert(n, runs);
        let partial = MatchIndex::rebuild(&pages, &matcher);
        assert_eq!(partial.get(0).unwrap().page_number, 3);

        let (n, runs) = page(1, &["foo foo"]);
        pages.insert(n, runs);
        let full = MatchIndex::rebuild(&pages, &matcher);

        let keys: Vec<_> = full.iter().map(Match::key).collect();
        assert_eq!(keys, vec![(1, 0, 0), (1, 0, 1), (3, 0, 0)]);
        assert!(full.iter().enumerate().all(|(i, m)| m.id == i));
    }

    #[test]
    fn test_on_page_slices() {
        let matcher = TermMatcher::new("a", false).unwrap();
        let pages: BTreeMap<u32, PageRuns> =
            [page(1, &["a"]), page(2, &["b"]), page(3, &["a a", "a"])]
                .into_iter()
                .collect();
        let index = MatchIndex::rebuild(&pages, &matcher);

        assert_eq!(index.on_page(1).len(), 1);
        assert!(index.on_page(2).is_empty());
        assert_eq!(index.on_page(3).len(), 3);
        assert!(index.on_page(9).is_empty());
        assert_eq!(index.page_counts().get(&3), Some(&3));
    }
}
