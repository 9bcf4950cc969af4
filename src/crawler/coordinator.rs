//! Crawler coordinator - drives the crawl controller over a catalog source
//!
//! This module contains the main crawl loop, which:
//! - Turns controller actions into fetch tasks, bounded by a semaphore
//! - Feeds each completed fetch back into the controller
//! - Writes finished records to the sink
//! - Stops everything once the emission cap is hit
//! - Keeps crawl statistics

use crate::config::{CrawlerConfig, SearchConfig};
use crate::crawler::controller::{CrawlAction, CrawlController, ReviewChain};
use crate::crawler::source::{CatalogSource, DetailResponse, ProductReference};
use crate::output::{CrawlStatistics, RecordSink};
use crate::state::{CrawlState, RawReview};
use crate::ReaperError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A finished fetch, carrying whatever the controller needs to continue
enum FetchOutcome {
    SearchPage {
        page: u32,
        result: Result<Vec<ProductReference>, ReaperError>,
    },
    Detail {
        reference: ProductReference,
        result: Result<DetailResponse, ReaperError>,
    },
    ReviewPage {
        chain: ReviewChain,
        result: Result<Vec<RawReview>, ReaperError>,
    },
}

/// Main crawler coordinator structure
pub struct Coordinator<S, K> {
    source: Arc<S>,
    sink: K,
    controller: CrawlController,
    permits: Arc<Semaphore>,
    stats: CrawlStatistics,
}

impl<S, K> Coordinator<S, K>
where
    S: CatalogSource + 'static,
    K: RecordSink,
{
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `sink` - Where finished records go
    /// * `search` - Search term, page range, and URL-only mode
    /// * `crawler` - Concurrency limits
    pub fn new(source: S, sink: K, search: &SearchConfig, crawler: &CrawlerConfig) -> Self {
        Self::with_controller(
            source,
            sink,
            CrawlController::from_config(search),
            crawler.max_concurrent_requests as usize,
        )
    }

    /// Creates a coordinator around an already built controller
    pub fn with_controller(
        source: S,
        sink: K,
        controller: CrawlController,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            controller,
            permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            stats: CrawlStatistics::new(),
        }
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    pub fn state(&self) -> &Arc<CrawlState> {
        self.controller.state()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Runs the crawl until every pipeline ends or the cap aborts it
    ///
    /// Per-product failures are logged and counted. Only sink failures end
    /// the run with an error.
    pub async fn run(&mut self) -> Result<(), ReaperError> {
        let cursor = self.controller.cursor();
        tracing::info!(
            "Starting crawl at page {} for up to {} pages (cap {} records)",
            cursor.start_page(),
            cursor.max_page_count(),
            self.state().emitted_count_limit()
        );

        let mut tasks = JoinSet::new();
        let initial = self.controller.start();
        let mut aborted = self.apply(initial, &mut tasks)?;

        while !aborted {
            let Some(joined) = tasks.join_next().await else {
                break;
            };

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Fetch task ended abnormally: {}", e);
                    continue;
                }
            };

            let actions = self.handle_outcome(outcome);
            aborted = self.apply(actions, &mut tasks)?;
        }

        if aborted {
            tracing::info!(
                "Emission cap reached, cancelling {} outstanding fetches",
                tasks.len()
            );
            tasks.abort_all();
        }

        self.sink.finalize()?;
        self.stats.finish();

        tracing::info!(
            "Crawl completed: {} records emitted after {} fetches",
            self.stats.records_emitted,
            self.stats.total_fetches()
        );

        Ok(())
    }

    /// Updates statistics and asks the controller what comes next
    fn handle_outcome(&mut self, outcome: FetchOutcome) -> Vec<CrawlAction> {
        match outcome {
            FetchOutcome::SearchPage {
                page,
                result: Ok(references),
            } => {
                self.stats.search_pages_fetched += 1;
                self.stats.references_found += references.len() as u64;
                tracing::info!("Search page {} listed {} products", page, references.len());
                self.controller.handle_search_page(page, references)
            }
            FetchOutcome::SearchPage {
                page,
                result: Err(e),
            } => {
                self.stats.search_pages_failed += 1;
                tracing::warn!("Search page {} failed, ending pagination: {}", page, e);
                Vec::new()
            }
            FetchOutcome::Detail {
                reference,
                result: Ok(response),
            } => {
                self.stats.detail_fetches += 1;
                if response.is_unavailable() {
                    self.stats.products_unavailable += 1;
                }
                let product_id = reference.product_id.clone();
                match self.controller.handle_detail_response(reference, response) {
                    Ok(actions) => actions,
                    Err(e) => self.product_failed(&product_id, e),
                }
            }
            FetchOutcome::Detail {
                reference,
                result: Err(e),
            } => self.product_failed(&reference.product_id, e),
            FetchOutcome::ReviewPage {
                chain,
                result: Ok(reviews),
            } => {
                self.stats.review_fetches += 1;
                let product_id = chain.reference().product_id.clone();
                match self.controller.handle_review_page(chain, reviews) {
                    Ok(actions) => actions,
                    Err(e) => self.product_failed(&product_id, e),
                }
            }
            FetchOutcome::ReviewPage {
                chain,
                result: Err(e),
            } => self.product_failed(&chain.reference().product_id, e),
        }
    }

    fn product_failed(&mut self, product_id: &str, error: ReaperError) -> Vec<CrawlAction> {
        self.stats.products_failed += 1;
        tracing::warn!("Product {} dropped: {}", product_id, error);
        Vec::new()
    }

    /// Carries out controller actions; returns true once the crawl must stop
    fn apply(
        &mut self,
        actions: Vec<CrawlAction>,
        tasks: &mut JoinSet<FetchOutcome>,
    ) -> Result<bool, ReaperError> {
        for action in actions {
            match action {
                CrawlAction::FetchSearchPage(page) => self.spawn_search_page(tasks, page),
                CrawlAction::FetchDetail(reference) => self.spawn_detail(tasks, reference),
                CrawlAction::FetchReviewPage(chain) => self.spawn_review_page(tasks, chain),
                CrawlAction::Emit(record) => {
                    self.sink.emit(&record)?;
                    self.stats.records_emitted += 1;

                    if self.stats.records_emitted % 10 == 0 {
                        tracing::info!(
                            "Progress: {} records emitted, {} fetches in flight",
                            self.stats.records_emitted,
                            tasks.len()
                        );
                    }
                }
                CrawlAction::Discard(record) => {
                    self.stats.records_discarded += 1;
                    tracing::debug!(
                        "Discarding record for {} past the emission cap",
                        record.product_id.as_deref().unwrap_or(&record.url)
                    );
                }
                CrawlAction::Abort => {
                    if self.state().abort() {
                        tracing::info!(
                            "Emitted {} of {} records, aborting crawl",
                            self.state().emitted_count(),
                            self.state().emitted_count_limit()
                        );
                    }
                    self.stats.aborted_by_cap = true;
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn spawn_search_page(&self, tasks: &mut JoinSet<FetchOutcome>, page: u32) {
        let source = Arc::clone(&self.source);
        let permits = Arc::clone(&self.permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = source.fetch_search_page(page).await;
            FetchOutcome::SearchPage { page, result }
        });
    }

    fn spawn_detail(&self, tasks: &mut JoinSet<FetchOutcome>, reference: ProductReference) {
        let source = Arc::clone(&self.source);
        let permits = Arc::clone(&self.permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = source.fetch_product_detail(&reference).await;
            FetchOutcome::Detail { reference, result }
        });
    }

    fn spawn_review_page(&self, tasks: &mut JoinSet<FetchOutcome>, chain: ReviewChain) {
        let source = Arc::clone(&self.source);
        let permits = Arc::clone(&self.permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = source.fetch_review_page(chain.accumulator().request()).await;
            FetchOutcome::ReviewPage { chain, result }
        });
    }
}
