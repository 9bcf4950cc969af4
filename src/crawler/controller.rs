//! Crawl controller - the stage dispatcher
//!
//! The controller is a pure state machine. Each handler takes one fetched
//! response and returns the actions that follow from it: more fetches,
//! records to emit, or an abort. It never performs I/O itself, which keeps
//! the pagination and termination rules testable without a network.
//!
//! Per product the phases are:
//!
//! ```text
//! AwaitingDetail --available--> AwaitingReviewPage(1) --full page--> AwaitingReviewPage(2) ...
//!       |                               |
//!       +--unavailable/failed--> Terminated <--short page (record emitted)
//! ```

use crate::config::SearchConfig;
use crate::crawler::assembler::assemble;
use crate::crawler::source::{DetailResponse, ProductDetail, ProductReference};
use crate::output::OutputRecord;
use crate::state::{
    CrawlState, PageCursor, ProductPhase, RawReview, ReviewAccumulator, ReviewPageOutcome,
};
use crate::ReaperError;
use std::collections::HashSet;
use std::sync::Arc;

/// Continuation state of one product's review chain
///
/// Moves into the fetch for the next review page and comes back out with
/// its response, so exactly one owner holds it at any time.
#[derive(Debug, Clone)]
pub struct ReviewChain {
    reference: ProductReference,
    detail: ProductDetail,
    accumulator: ReviewAccumulator,
    phase: ProductPhase,
}

impl ReviewChain {
    pub fn reference(&self) -> &ProductReference {
        &self.reference
    }

    pub fn accumulator(&self) -> &ReviewAccumulator {
        &self.accumulator
    }

    pub fn phase(&self) -> ProductPhase {
        self.phase
    }
}

/// Work the driver should carry out next
#[derive(Debug)]
pub enum CrawlAction {
    /// Fetch this search-results page
    FetchSearchPage(u32),

    /// Fetch this product's detail page
    FetchDetail(ProductReference),

    /// Fetch the review page the chain is waiting on
    FetchReviewPage(ReviewChain),

    /// Hand this record to the sink (its emission slot is already claimed)
    Emit(OutputRecord),

    /// A finished record that lost the race for the last emission slot
    Discard(OutputRecord),

    /// The emission cap is reached; stop scheduling anything
    Abort,
}

/// Drives the three nested paging loops
pub struct CrawlController {
    cursor: PageCursor,
    urls_only: bool,
    state: Arc<CrawlState>,

    /// Product ids already scheduled or emitted
    seen: HashSet<String>,
}

impl CrawlController {
    /// Creates a controller with explicit cursor and shared state
    pub fn new(cursor: PageCursor, urls_only: bool, state: Arc<CrawlState>) -> Self {
        Self {
            cursor,
            urls_only,
            state,
            seen: HashSet::new(),
        }
    }

    /// Creates a controller for the configured search
    pub fn from_config(search: &SearchConfig) -> Self {
        Self::new(
            PageCursor::new(search.start_page, search.total_page_count),
            search.urls_only,
            CrawlState::new(search.total_page_count),
        )
    }

    pub fn state(&self) -> &Arc<CrawlState> {
        &self.state
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn urls_only(&self) -> bool {
        self.urls_only
    }

    /// Number of distinct products scheduled or emitted so far
    pub fn products_seen(&self) -> usize {
        self.seen.len()
    }

    /// Actions that begin the crawl
    pub fn start(&self) -> Vec<CrawlAction> {
        if self.state.should_stop() {
            return vec![CrawlAction::Abort];
        }
        vec![CrawlAction::FetchSearchPage(self.cursor.current_page())]
    }

    /// Handles one completed search-results page
    ///
    /// In URL-only mode every reference becomes a record right away;
    /// otherwise each becomes a detail fetch. A product already listed on an
    /// earlier page, or earlier on this one, is skipped. The next search page
    /// follows when the cursor allows it.
    pub fn handle_search_page(
        &mut self,
        page_number: u32,
        references: Vec<ProductReference>,
    ) -> Vec<CrawlAction> {
        let found = references.len();
        let mut actions = Vec::with_capacity(found + 1);

        for reference in references {
            if !self.seen.insert(reference.product_id.clone()) {
                tracing::debug!("Product {} already scheduled, skipping", reference.product_id);
                continue;
            }

            if self.urls_only {
                let record = OutputRecord::url_only(reference.detail_url);
                if !self.push_emission(&mut actions, record) {
                    return actions;
                }
                continue;
            }

            if self.state.should_stop() {
                actions.push(CrawlAction::Abort);
                return actions;
            }
            actions.push(CrawlAction::FetchDetail(reference));
        }

        if self.state.should_stop() {
            actions.push(CrawlAction::Abort);
            return actions;
        }

        if let Some(next_page) = self.cursor.advance(page_number, found) {
            actions.push(CrawlAction::FetchSearchPage(next_page));
        }

        actions
    }

    /// Handles one product detail response
    ///
    /// Unavailable listings are dropped without error. A missing shop id or
    /// credential context fails this product only.
    pub fn handle_detail_response(
        &self,
        reference: ProductReference,
        response: DetailResponse,
    ) -> Result<Vec<CrawlAction>, ReaperError> {
        if self.state.should_stop() {
            return Ok(vec![CrawlAction::Abort]);
        }

        if response.is_unavailable() {
            tracing::debug!("Product {} is unavailable, dropping", reference.product_id);
            return Ok(Vec::new());
        }

        let shop_id = response.shop_id.ok_or_else(|| ReaperError::MissingField {
            product_id: reference.product_id.clone(),
            field: "shop_id",
        })?;
        let credentials = response
            .credentials
            .ok_or_else(|| ReaperError::MissingField {
                product_id: reference.product_id.clone(),
                field: "credential_context",
            })?;

        let phase = ProductPhase::AwaitingDetail.transition(ProductPhase::AwaitingReviewPage(1))?;
        let accumulator =
            ReviewAccumulator::new(reference.product_id.clone(), shop_id, credentials);

        tracing::debug!(
            "Product {} detail parsed, requesting review page 1",
            reference.product_id
        );

        Ok(vec![CrawlAction::FetchReviewPage(ReviewChain {
            reference,
            detail: response.fields,
            accumulator,
            phase,
        })])
    }

    /// Handles one review page for a chain
    ///
    /// A full page of this product's reviews asks for the next page; anything
    /// less finishes the chain and produces the product's record.
    pub fn handle_review_page(
        &self,
        chain: ReviewChain,
        raw_reviews: Vec<RawReview>,
    ) -> Result<Vec<CrawlAction>, ReaperError> {
        let ReviewChain {
            reference,
            detail,
            mut accumulator,
            phase,
        } = chain;

        match accumulator.absorb(raw_reviews) {
            ReviewPageOutcome::Continue { next_page } => {
                let phase = phase.transition(ProductPhase::AwaitingReviewPage(next_page))?;

                if self.state.should_stop() {
                    return Ok(vec![CrawlAction::Abort]);
                }

                Ok(vec![CrawlAction::FetchReviewPage(ReviewChain {
                    reference,
                    detail,
                    accumulator,
                    phase,
                })])
            }
            ReviewPageOutcome::Exhausted => {
                phase.transition(ProductPhase::Terminated)?;

                tracing::debug!(
                    "Product {} finished with {} reviews over {} pages",
                    reference.product_id,
                    accumulator.reviews_count(),
                    accumulator.page_number()
                );

                let mut actions = Vec::with_capacity(2);
                self.push_emission(&mut actions, assemble(detail, accumulator));
                Ok(actions)
            }
        }
    }

    /// Claims an emission slot for `record`; returns false once the cap is hit
    fn push_emission(&self, actions: &mut Vec<CrawlAction>, record: OutputRecord) -> bool {
        if self.state.try_claim_emission() {
            actions.push(CrawlAction::Emit(record));
            true
        } else {
            actions.push(CrawlAction::Discard(record));
            actions.push(CrawlAction::Abort);
            false
        }
    }
}
