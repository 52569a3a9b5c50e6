//! Host-facing search handle
//!
//! A [`SearchHandle`] is the only thing a host keeps for an open document.
//! It bundles the operations the viewer UI binds to its search bar and page
//! controls, and hides the cache, sessions and timers behind them. Dropping
//! the last clone closes the session.

use std::sync::Arc;

use parking_lot::MappedMutexGuard;

use crate::config::Config;
use crate::document::{CacheStats, PageTextCache, RenderSurface, TextProvider};
use crate::highlight::HighlightRenderer;
use crate::navigation::NavigationController;
use crate::search::{Match, SearchController, SearchStatus, SearchSummary};

/// Capability object returned to the host for one open document
pub struct SearchHandle<R> {
    inner: Arc<SearchController<R>>,
}

impl<R> Clone for SearchHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: HighlightRenderer> SearchHandle<R> {
    /// Open a search session over a document
    pub fn open(
        provider: Arc<dyn TextProvider>,
        surface: Arc<dyn RenderSurface>,
        renderer: R,
        config: &Config,
    ) -> Self {
        let page_count = provider.page_count();
        let navigation = Arc::new(NavigationController::new(
            surface,
            provider.clone(),
            &config.navigation,
        ));
        let cache = PageTextCache::with_timeout(provider, config.search.extraction_timeout());
        tracing::info!(pages = page_count, "Opened document search session");

        Self {
            inner: Arc::new(SearchController::new(
                cache,
                navigation,
                renderer,
                &config.search,
            )),
        }
    }

    pub async fn search(&self, term: &str) -> SearchSummary {
        self.inner.search(term).await
    }

    pub fn next(&self) -> SearchSummary {
        self.inner.next()
    }

    pub fn previous(&self) -> SearchSummary {
        self.inner.previous()
    }

    pub fn clear(&self) {
        self.inner.clear()
    }

    pub fn on_visible_page_changed(&self, page_number: u32) {
        self.inner.on_visible_page_changed(page_number)
    }

    /// Jump to a page; returns the clamped target, `None` without pages
    pub fn go_to_page(&self, page_number: u32) -> Option<u32> {
        self.inner.navigation().go_to_page(page_number)
    }

    pub fn page_count(&self) -> u32 {
        self.inner.navigation().page_count()
    }

    pub fn visible_page(&self) -> u32 {
        self.inner.navigation().current_page()
    }

    pub fn summary(&self) -> SearchSummary {
        self.inner.summary()
    }

    pub fn status(&self) -> SearchStatus {
        self.inner.status()
    }

    pub fn matches(&self) -> Vec<Match> {
        self.inner.matches()
    }

    pub fn current_match(&self) -> Option<Match> {
        self.inner.current_match()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache().stats()
    }

    pub fn highlights(&self) -> MappedMutexGuard<'_, R> {
        self.inner.highlights()
    }
}
