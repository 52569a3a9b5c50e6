//! Search controller
//!
//! Drives one document session: `Idle → Scanning → {Ready, Empty}`. Every
//! `search()` starts a new generation; work belonging to an older generation
//! is dropped when it completes, so only the latest search ever reaches the
//! session or the highlights.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use super::index::MatchIndex;
use super::matcher::{Match, TermMatcher};
use super::session::{SearchSession, SearchStatus, SearchSummary};
use crate::config::SearchConfig;
use crate::document::PageTextCache;
use crate::highlight::{HighlightRenderer, PageHighlights};
use crate::navigation::NavigationController;

struct HighlightState<R> {
    renderer: R,
    /// Page the renderer last drew on
    rendered_page: Option<u32>,
}

pub struct SearchController<R> {
    cache: PageTextCache,
    navigation: Arc<NavigationController>,
    session: Mutex<SearchSession>,
    generation: AtomicU64,
    highlights: Mutex<HighlightState<R>>,
    case_sensitive: bool,
    max_in_flight: usize,
}

impl<R: HighlightRenderer> SearchController<R> {
    pub fn new(
        cache: PageTextCache,
        navigation: Arc<NavigationController>,
        renderer: R,
        config: &SearchConfig,
    ) -> Self {
        Self {
            cache,
            navigation,
            session: Mutex::new(SearchSession::idle(0)),
            generation: AtomicU64::new(0),
            highlights: Mutex::new(HighlightState {
                renderer,
                rendered_page: None,
            }),
            case_sensitive: config.case_sensitive,
            max_in_flight: config.max_concurrent_extractions.max(1),
        }
    }

    /// Search the whole document for `term`
    ///
    /// Resolves once every page is loaded or errored, or as soon as a newer
    /// search or a `clear()` supersedes this one. The summary returned is
    /// always that of the session current at return time.
    pub async fn search(&self, term: &str) -> SearchSummary {
        let term = term.trim();
        let Some(matcher) = TermMatcher::new(term, self.case_sensitive) else {
            self.clear();
            return SearchSummary::default();
        };

        let generation = {
            let mut session = self.session.lock();
            if session.term == term && session.is_settled() {
                tracing::trace!(term, "Search term unchanged");
                return session.summary();
            }
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *session = SearchSession::scanning(term, generation);
            generation
        };
        tracing::debug!(term, generation, "Search started");
        self.refresh_highlights();

        let cache = self.cache.clone();
        let mut arrivals = stream::iter(1..=cache.page_count())
            .map(move |page| {
                let cache = cache.clone();
                async move { (page, cache.get(page).await) }
            })
            .buffer_unordered(self.max_in_flight);

        while let Some((page, result)) = arrivals.next().await {
            if !self.is_current(generation) {
                tracing::trace!(page, generation, "Dropping stale page arrival");
                return self.summary();
            }
            if let Err(err) = &result {
                tracing::debug!(page, error = %err, "Page contributes no matches");
            }

            let index = MatchIndex::rebuild(&self.cache.loaded_pages(), &matcher);
            {
                let mut session = self.session.lock();
                if session.generation != generation {
                    return session.summary();
                }
                session.set_matches(index);
            }
            if page == self.navigation.current_page() {
                self.refresh_highlights();
            }
        }

        let first_page = {
            let mut session = self.session.lock();
            if session.generation != generation {
                return session.summary();
            }
            session.current_index = 0;
            session.status = if session.matches.is_empty() {
                SearchStatus::Empty
            } else {
                SearchStatus::Ready
            };
            tracing::info!(
                term,
                generation,
                matches = session.matches.len(),
                "Search complete"
            );
            session.current().map(|m| m.page_number)
        };

        if let Some(page) = first_page {
            self.navigation.go_to_page(page);
        }
        self.refresh_highlights();
        self.summary()
    }

    /// Select the next match, wrapping to the first
    pub fn next(&self) -> SearchSummary {
        self.step(SearchSession::step_forward)
    }

    /// Select the previous match, wrapping to the last
    pub fn previous(&self) -> SearchSummary {
        self.step(SearchSession::step_back)
    }

    fn step(&self, advance: fn(&mut SearchSession) -> Option<&Match>) -> SearchSummary {
        let (target, summary) = {
            let mut session = self.session.lock();
            let target = advance(&mut session).map(|m| m.page_number);
            (target, session.summary())
        };
        let Some(page) = target else {
            return summary;
        };

        if page != self.navigation.current_page() {
            self.navigation.go_to_page(page);
        }
        self.refresh_highlights();
        summary
    }

    /// Discard the session and remove all highlights
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        *self.session.lock() = SearchSession::idle(generation);

        let visible = self.navigation.current_page();
        let mut state = self.highlights.lock();
        if let Some(page) = state.rendered_page.take() {
            state.renderer.clear(page);
        }
        if visible > 0 {
            state.renderer.clear(visible);
        }
        tracing::debug!(generation, "Search cleared");
    }

    /// The host scrolled to another page
    pub fn on_visible_page_changed(&self, page_number: u32) {
        self.navigation.set_current_page(page_number);
        self.refresh_highlights();
    }

    pub fn summary(&self) -> SearchSummary {
        self.session.lock().summary()
    }

    pub fn status(&self) -> SearchStatus {
        self.session.lock().status
    }

    /// Term of the active session (empty when idle)
    pub fn term(&self) -> String {
        self.session.lock().term.clone()
    }

    pub fn matches(&self) -> Vec<Match> {
        self.session.lock().matches.as_slice().to_vec()
    }

    pub fn current_match(&self) -> Option<Match> {
        self.session.lock().current().cloned()
    }

    pub fn cache(&self) -> &PageTextCache {
        &self.cache
    }

    pub fn navigation(&self) -> &Arc<NavigationController> {
        &self.navigation
    }

    /// Access the renderer, e.g. to read back what was drawn
    pub fn highlights(&self) -> MappedMutexGuard<'_, R> {
        MutexGuard::map(self.highlights.lock(), |state| &mut state.renderer)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Redraw the visible page from the current session
    fn refresh_highlights(&self) {
        let page = self.navigation.current_page();
        let (matches, current) = {
            let session = self.session.lock();
            let current = session
                .current()
                .filter(|m| m.page_number == page)
                .map(|m| m.id);
            (session.matches.on_page(page).to_vec(), current)
        };
        let runs = self.cache.peek(page);

        let mut state = self.highlights.lock();
        if let Some(previous) = state.rendered_page.take() {
            if previous != page {
                state.renderer.clear(previous);
            }
        }
        if page == 0 {
            return;
        }
        if matches.is_empty() {
            state.renderer.clear(page);
            return;
        }

        let drawn = state.renderer.render(&PageHighlights {
            page_number: page,
            runs: runs.as_deref().map(Vec::as_slice).unwrap_or_default(),
            matches: &matches,
            current,
        });
        tracing::trace!(page, drawn, "Highlights refreshed");
        state.rendered_page = Some(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavigationConfig;
    use crate::document::{RenderSurface, StaticTextProvider};
    use crate::highlight::{OverlayRenderer, SegmentKind};

    struct NullSurface;

    impl RenderSurface for NullSurface {
        fn scroll_to_page(&self, _page_number: u32) {}
    }

    fn controller(pages: Vec<Vec<&str>>) -> SearchController<OverlayRenderer> {
        let provider = Arc::new(StaticTextProvider::from_texts(pages));
        let navigation = Arc::new(NavigationController::new(
            Arc::new(NullSurface),
            provider.clone(),
            &NavigationConfig::default(),
        ));
        SearchController::new(
            PageTextCache::new(provider),
            navigation,
            OverlayRenderer::default(),
            &SearchConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_builds_ordered_matches() {
        let ctl = controller(vec![vec!["one cat", "two cats"], vec!["cat"]]);
        let summary = ctl.search("cat").await;
        assert_eq!(summary.match_count, 3);
        assert_eq!(summary.current_match_ordinal, 1);
        assert_eq!(ctl.status(), SearchStatus::Ready);

        let keys: Vec<_> = ctl.matches().iter().map(Match::key).collect();
        assert_eq!(keys, vec![(1, 0, 0), (1, 1, 0), (2, 0, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_term_is_noop() {
        let ctl = controller(vec![vec!["a a a"]]);
        ctl.search("a").await;
        ctl.next();
        let summary = ctl.search("  a ").await;
        assert_eq!(summary.current_match_ordinal, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_term_clears() {
        let ctl = controller(vec![vec!["cat"]]);
        ctl.search("cat").await;
        assert_eq!(ctl.highlights().highlight_count(1), 1);

        let summary = ctl.search("   ").await;
        assert_eq!(summary, SearchSummary::default());
        assert_eq!(ctl.status(), SearchStatus::Idle);
        assert_eq!(ctl.highlights().highlight_count(1), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_without_matches_are_noops() {
        let ctl = controller(vec![vec!["nothing"]]);
        assert_eq!(ctl.search("zebra").await, SearchSummary::default());
        assert_eq!(ctl.status(), SearchStatus::Empty);
        assert_eq!(ctl.next(), SearchSummary::default());
        assert_eq!(ctl.previous(), SearchSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_match_is_styled_distinctly() {
        let ctl = controller(vec![vec!["at at"]]);
        ctl.search("at").await;
        ctl.next();

        let renderer = ctl.highlights();
        let layer = renderer.layer(1).unwrap();
        let currents: Vec<usize> = layer.elements[0]
            .segments
            .iter()
            .filter(|s| s.is_current())
            .map(|s| match s.kind {
                SegmentKind::Highlight { match_id, .. } => match_id,
                SegmentKind::Plain => usize::MAX,
            })
            .collect();
        assert_eq!(currents, vec![1]);
    }
}
