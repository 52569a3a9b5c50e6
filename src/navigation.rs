//! Page navigation
//!
//! A jump scrolls the host's view to a page right away, then emphasizes the
//! target page once the scroll has had time to settle. A later jump
//! supersedes an earlier one: the earlier emphasis is cancelled and removed.
//!
//! The page count is read from the document on every use, so a handle opened
//! before the document finished loading starts navigating once it has.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::config::NavigationConfig;
use crate::document::{RenderSurface, TextProvider};

struct PendingJump {
    ticket: u64,
    target: u32,
    task: JoinHandle<()>,
}

/// Owns the "current page" of the view and the emphasis timer
pub struct NavigationController {
    surface: Arc<dyn RenderSurface>,
    document: Arc<dyn TextProvider>,
    /// Last page shown, 0 until the view has shown one
    current_page: AtomicU32,
    tickets: AtomicU64,
    pending: Arc<Mutex<Option<PendingJump>>>,
    settle_delay: Duration,
    emphasis: Duration,
}

impl NavigationController {
    pub fn new(
        surface: Arc<dyn RenderSurface>,
        document: Arc<dyn TextProvider>,
        config: &NavigationConfig,
    ) -> Self {
        Self {
            surface,
            document,
            current_page: AtomicU32::new(0),
            tickets: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(None)),
            settle_delay: config.settle_delay(),
            emphasis: config.emphasis(),
        }
    }

    /// Pages in the document right now (0 while it is not loaded)
    pub fn page_count(&self) -> u32 {
        self.document.page_count()
    }

    /// Page the view currently shows (0 when there is no document)
    ///
    /// A loaded document that has not been scrolled yet shows page 1.
    pub fn current_page(&self) -> u32 {
        match self.page_count() {
            0 => 0,
            count => self.current_page.load(Ordering::Acquire).clamp(1, count),
        }
    }

    /// Record a page change made by the user (scrolling, paging)
    pub fn set_current_page(&self, page_number: u32) {
        let count = self.page_count();
        if count == 0 {
            return;
        }
        self.current_page
            .store(page_number.clamp(1, count), Ordering::Release);
    }

    /// Target page of a jump whose emphasis has not finished yet
    pub fn pending_target(&self) -> Option<u32> {
        self.pending.lock().as_ref().map(|jump| jump.target)
    }

    /// Jump to a page, clamped to `[1, page_count]`
    ///
    /// Returns the page actually targeted, or `None` when the document has
    /// no pages. Emphasis is only scheduled when called inside a tokio
    /// runtime.
    pub fn go_to_page(&self, page_number: u32) -> Option<u32> {
        let count = self.page_count();
        if count == 0 {
            tracing::debug!(page = page_number, "Ignoring jump: document has no pages");
            return None;
        }
        let target = page_number.clamp(1, count);
        let ticket = self.tickets.fetch_add(1, Ordering::AcqRel) + 1;

        let superseded = self.pending.lock().take();
        if let Some(previous) = superseded {
            previous.task.abort();
            self.surface.set_page_emphasis(previous.target, false);
        }

        self.surface.scroll_to_page(target);
        self.current_page.store(target, Ordering::Release);
        tracing::debug!(page = target, requested = page_number, "Jumped to page");

        let Ok(handle) = Handle::try_current() else {
            tracing::trace!(page = target, "No runtime; skipping page emphasis");
            return Some(target);
        };
        let task = handle.spawn(emphasize(
            self.surface.clone(),
            self.pending.clone(),
            ticket,
            target,
            self.settle_delay,
            self.emphasis,
        ));

        let mut pending = self.pending.lock();
        // A newer jump may have landed between the two locks
        if self.tickets.load(Ordering::Acquire) == ticket {
            *pending = Some(PendingJump { ticket, target, task });
        } else {
            task.abort();
        }

        Some(target)
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if let Some(jump) = self.pending.lock().take() {
            jump.task.abort();
        }
    }
}

async fn emphasize(
    surface: Arc<dyn RenderSurface>,
    pending: Arc<Mutex<Option<PendingJump>>>,
    ticket: u64,
    target: u32,
    settle_delay: Duration,
    emphasis: Duration,
) {
    tokio::time::sleep(settle_delay).await;
    surface.set_page_emphasis(target, true);
    tokio::time::sleep(emphasis).await;
    surface.set_page_emphasis(target, false);

    let mut pending = pending.lock();
    if pending.as_ref().is_some_and(|jump| jump.ticket == ticket) {
        *pending = None;
    }
}
