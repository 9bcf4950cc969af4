//! Cursor over the outer search-results pagination

/// Tracks which search-results page is in flight and whether to go on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current_page: u32,
    start_page: u32,
    max_page_count: u32,
}

impl PageCursor {
    /// Creates a cursor positioned on `start_page`
    ///
    /// `max_page_count` counts pages from `start_page`, so a budget of 1
    /// visits only the start page.
    pub fn new(start_page: u32, max_page_count: u32) -> Self {
        Self {
            current_page: start_page,
            start_page,
            max_page_count,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    pub fn max_page_count(&self) -> u32 {
        self.max_page_count
    }

    /// Returns true while the page budget allows a page after `page`
    pub fn has_budget_after(&self, page: u32) -> bool {
        // current - start < max - 1, rearranged to stay unsigned
        page.saturating_sub(self.start_page).saturating_add(1) < self.max_page_count
    }

    /// Decides the next page after `completed_page` finished
    ///
    /// Returns `None` when the page budget is spent or when the completed
    /// page produced no product references (end of search results).
    pub fn advance(&mut self, completed_page: u32, references_found: usize) -> Option<u32> {
        if references_found == 0 {
            tracing::info!("Search page {} was empty, pagination ends", completed_page);
            return None;
        }

        if !self.has_budget_after(completed_page) {
            tracing::info!(
                "Page budget of {} reached at page {}",
                self.max_page_count,
                completed_page
            );
            return None;
        }

        let next = completed_page + 1;
        self.current_page = next;
        Some(next)
    }
}
