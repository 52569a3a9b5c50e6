//! Page text cache with request coalescing
//!
//! Memoizes the text runs of each page for the lifetime of a document
//! session. Entries are never evicted and a loaded entry is never fetched
//! again.
//!
//! # Coalescing
//!
//! The first caller for an uncached page stores a shared extraction future
//! in the entry and every later caller awaits a clone of that same future,
//! so the provider sees at most one call per page regardless of how many
//! searches ask for it concurrently. Dropping a waiter does not cancel the
//! extraction: the next waiter resumes polling it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::{timeout, Duration};

use super::error::{ExtractionError, Result};
use super::traits::TextProvider;
use super::types::{PageStatus, TextRun};

/// Timeout for a single page text extraction
pub const TEXT_TIMEOUT_SECS: u64 = 15;

/// Runs of one page, shared between the cache and its readers
pub type PageRuns = Arc<Vec<TextRun>>;

type ExtractionFuture = Shared<BoxFuture<'static, Result<PageRuns>>>;

enum CacheEntry {
    Pending(ExtractionFuture),
    Loaded(PageRuns),
    Errored(ExtractionError),
}

impl CacheEntry {
    fn status(&self) -> PageStatus {
        match self {
            CacheEntry::Pending(_) => PageStatus::Pending,
            CacheEntry::Loaded(_) => PageStatus::Loaded,
            CacheEntry::Errored(_) => PageStatus::Errored,
        }
    }
}

/// Per-session page text cache
#[derive(Clone)]
pub struct PageTextCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    provider: Arc<dyn TextProvider>,
    entries: Mutex<HashMap<u32, CacheEntry>>,
    /// Number of provider calls actually issued
    extraction_calls: Arc<AtomicUsize>,
    extraction_timeout: Duration,
}

impl PageTextCache {
    /// Create a cache using the default extraction timeout
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self::with_timeout(provider, Duration::from_secs(TEXT_TIMEOUT_SECS))
    }

    /// Create a cache with a custom per-page extraction timeout
    pub fn with_timeout(provider: Arc<dyn TextProvider>, extraction_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                provider,
                entries: Mutex::new(HashMap::new()),
                extraction_calls: Arc::new(AtomicUsize::new(0)),
                extraction_timeout,
            }),
        }
    }

    /// Number of pages in the underlying document
    pub fn page_count(&self) -> u32 {
        self.inner.provider.page_count()
    }

    /// Get the runs of a page, extracting them on first access
    ///
    /// Concurrent callers for the same uncached page share one extraction.
    /// An errored page stays errored; it is not retried.
    pub async fn get(&self, page_number: u32) -> Result<PageRuns> {
        let request = {
            let mut entries = self.inner.entries.lock();
            match entries.get(&page_number) {
                Some(CacheEntry::Loaded(runs)) => {
                    tracing::trace!(page = page_number, "Page text cache hit");
                    return Ok(runs.clone());
                }
                Some(CacheEntry::Errored(err)) => return Err(err.clone()),
                Some(CacheEntry::Pending(request)) => {
                    tracing::trace!(page = page_number, "Joining in-flight extraction");
                    request.clone()
                }
                None => {
                    let request = self.extraction(page_number);
                    entries.insert(page_number, CacheEntry::Pending(request.clone()));
                    request
                }
            }
        };

        let result = request.await;
        self.settle(page_number, &result);
        result
    }

    /// Runs of a page if it is already loaded; never triggers extraction
    pub fn peek(&self, page_number: u32) -> Option<PageRuns> {
        match self.inner.entries.lock().get(&page_number) {
            Some(CacheEntry::Loaded(runs)) => Some(runs.clone()),
            _ => None,
        }
    }

    /// Status of a page entry, `None` if it was never requested
    pub fn status(&self, page_number: u32) -> Option<PageStatus> {
        self.inner
            .entries
            .lock()
            .get(&page_number)
            .map(CacheEntry::status)
    }

    /// All loaded pages, in page-number order
    pub fn loaded_pages(&self) -> BTreeMap<u32, PageRuns> {
        self.inner
            .entries
            .lock()
            .iter()
            .filter_map(|(page, entry)| match entry {
                CacheEntry::Loaded(runs) => Some((*page, runs.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of entries (any status)
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.inner.entries.lock();
        let mut stats = CacheStats {
            extraction_calls: self.inner.extraction_calls.load(Ordering::SeqCst),
            ..CacheStats::default()
        };
        for entry in entries.values() {
            match entry.status() {
                PageStatus::Pending => stats.pending += 1,
                PageStatus::Loaded => stats.loaded += 1,
                PageStatus::Errored => stats.errored += 1,
            }
        }
        stats
    }

    /// Build the shared extraction future for a page.
    ///
    /// Captures only the provider and counter, never the entry map, so an
    /// abandoned future cannot keep the cache alive.
    fn extraction(&self, page_number: u32) -> ExtractionFuture {
        let provider = self.inner.provider.clone();
        let calls = self.inner.extraction_calls.clone();
        let limit = self.inner.extraction_timeout;

        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(page = page_number, "Extracting page text");

            match timeout(limit, provider.extract_page_text(page_number)).await {
                Ok(Ok(runs)) => Ok(Arc::new(runs)),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(ExtractionError::Timeout {
                    page: page_number,
                    secs: limit.as_secs(),
                }),
            }
        }
        .boxed()
        .shared()
    }

    /// Move a pending entry to its final state. The first waiter to finish
    /// does the transition; later ones find it already settled.
    fn settle(&self, page_number: u32, result: &Result<PageRuns>) {
        let mut entries = self.inner.entries.lock();
        if !matches!(entries.get(&page_number), Some(CacheEntry::Pending(_))) {
            return;
        }

        let entry = match result {
            Ok(runs) => {
                tracing::debug!(page = page_number, runs = runs.len(), "Page text loaded");
                CacheEntry::Loaded(runs.clone())
            }
            Err(err) => {
                tracing::warn!(page = page_number, error = %err, "Page text extraction failed");
                CacheEntry::Errored(err.clone())
            }
        };
        entries.insert(page_number, entry);
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Pages whose runs are available
    pub loaded: usize,
    /// Pages with an extraction in flight
    pub pending: usize,
    /// Pages whose extraction failed
    pub errored: usize,
    /// Provider calls issued since the session opened
    pub extraction_calls: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Provider that counts calls per page and fails on a chosen page
    struct CountingProvider {
        pages: u32,
        failing_page: Option<u32>,
        delay: Duration,
        calls: Mutex<HashMap<u32, usize>>,
        total: AtomicUsize,
    }

    impl CountingProvider {
        fn new(pages: u32, delay_ms: u64) -> Self {
            Self {
                pages,
                failing_page: None,
                delay: Duration::from_millis(delay_ms),
                calls: Mutex::new(HashMap::new()),
                total: AtomicUsize::new(0),
            }
        }

        fn calls_for(&self, page: u32) -> usize {
            self.calls.lock().get(&page).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl TextProvider for CountingProvider {
        fn page_count(&self) -> u32 {
            self.pages
        }

        async fn extract_page_text(&self, page_number: u32) -> Result<Vec<TextRun>> {
            *self.calls.lock().entry(page_number).or_default() += 1;
            self.total.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.failing_page == Some(page_number) {
                return Err(ExtractionError::parse(page_number, "corrupt"));
            }
            Ok(vec![TextRun::new(page_number, 0, format!("page {}", page_number))])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_coalesce() {
        let provider = Arc::new(CountingProvider::new(3, 50));
        let cache = PageTextCache::new(provider.clone());

        let (a, b) = tokio::join!(cache.get(2), cache.get(2));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls_for(2), 1);
        assert_eq!(cache.stats().extraction_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_page_is_not_refetched() {
        let provider = Arc::new(CountingProvider::new(1, 10));
        let cache = PageTextCache::new(provider.clone());

        let first = cache.get(1).await.unwrap();
        let second = cache.get(1).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls_for(1), 1);
        assert_eq!(cache.status(1), Some(PageStatus::Loaded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errored_page_is_not_retried() {
        let mut provider = CountingProvider::new(2, 10);
        provider.failing_page = Some(2);
        let provider = Arc::new(provider);
        let cache = PageTextCache::new(provider.clone());

        assert!(cache.get(2).await.is_err());
        assert!(cache.get(2).await.is_err());
        assert_eq!(provider.calls_for(2), 1);
        assert_eq!(cache.status(2), Some(PageStatus::Errored));
        assert!(cache.peek(2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marks_page_errored() {
        let provider = Arc::new(CountingProvider::new(1, 5_000));
        let cache = PageTextCache::with_timeout(provider, Duration::from_secs(1));

        let err = cache.get(1).await.unwrap_err();
        assert_eq!(err, ExtractionError::Timeout { page: 1, secs: 1 });
        assert_eq!(cache.stats().errored, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_does_not_restart_extraction() {
        let provider = Arc::new(CountingProvider::new(1, 100));
        let cache = PageTextCache::new(provider.clone());

        // Poll once so the extraction starts, then abandon it
        let abandoned = tokio::time::timeout(Duration::from_millis(10), cache.get(1)).await;
        assert!(abandoned.is_err());
        assert_eq!(cache.status(1), Some(PageStatus::Pending));

        cache.get(1).await.unwrap();
        assert_eq!(provider.calls_for(1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_pages_are_ordered() {
        let provider = Arc::new(CountingProvider::new(3, 1));
        let cache = PageTextCache::new(provider);

        cache.get(3).await.unwrap();
        cache.get(1).await.unwrap();

        let pages: Vec<u32> = cache.loaded_pages().keys().copied().collect();
        assert_eq!(pages, vec![1, 3]);
        assert_eq!(cache.len(), 2);
    }
}
