//! Process-wide crawl state shared by every emission path

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Expected number of products on one search-results page
pub const PRODUCTS_PER_PAGE: u64 = 12;

/// Global emitted-item counter and the cap that aborts the crawl
#[derive(Debug)]
pub struct CrawlState {
    emitted_count: AtomicU64,
    emitted_count_limit: u64,
    aborted: AtomicBool,
}

impl CrawlState {
    /// Creates shared state with a cap of `max_page_count * PRODUCTS_PER_PAGE`
    pub fn new(max_page_count: u32) -> Arc<Self> {
        Self::with_limit(u64::from(max_page_count) * PRODUCTS_PER_PAGE)
    }

    /// Creates shared state with an explicit emission cap
    pub fn with_limit(emitted_count_limit: u64) -> Arc<Self> {
        Arc::new(Self {
            emitted_count: AtomicU64::new(0),
            emitted_count_limit,
            aborted: AtomicBool::new(false),
        })
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::SeqCst)
    }

    pub fn emitted_count_limit(&self) -> u64 {
        self.emitted_count_limit
    }

    /// Returns true once the emission cap has been reached
    pub fn is_limit_reached(&self) -> bool {
        self.emitted_count() >= self.emitted_count_limit
    }

    /// Returns true once the crawl has been aborted
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Returns true when no new fetch may be scheduled
    pub fn should_stop(&self) -> bool {
        self.is_aborted() || self.is_limit_reached()
    }

    /// Marks the crawl as aborted; returns true for the first caller only
    pub fn abort(&self) -> bool {
        !self.aborted.swap(true, Ordering::SeqCst)
    }

    /// Atomically claims one emission slot
    ///
    /// Succeeds only while the crawl is live and the counter is below the
    /// cap, so the counter can never pass the cap even with concurrent
    /// callers.
    pub fn try_claim_emission(&self) -> bool {
        if self.is_aborted() {
            return false;
        }

        let limit = self.emitted_count_limit;
        self.emitted_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                if count < limit {
                    Some(count + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }
}
