//! Integration tests for the crawl pipeline
//!
//! These tests drive the coordinator against a scripted in-memory catalog
//! and check which fetches happen and which records come out.

use async_trait::async_trait;
use listing_reaper::crawler::{
    Availability, CatalogSource, Coordinator, CrawlController, DetailResponse, ProductDetail,
    ProductReference,
};
use listing_reaper::output::{MemorySink, OutputRecord};
use listing_reaper::state::{
    CrawlState, CredentialContext, PageCursor, RawReview, ReviewPageRequest,
};
use listing_reaper::ReaperError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "http://shop.test";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fetch {
    Search(u32),
    Detail(String),
    Review(String, u32),
}

#[derive(Debug, Clone)]
enum DetailScript {
    Available { shop_id: String },
    Unavailable,
    MissingShop,
    Fails,
}

/// Catalog whose responses are fixed up front; records every fetch
#[derive(Default)]
struct ScriptedCatalog {
    search_pages: HashMap<u32, Vec<String>>,
    failing_search_pages: Vec<u32>,
    details: HashMap<String, DetailScript>,
    reviews: HashMap<(String, u32), Vec<RawReview>>,
    failing_reviews: Vec<String>,
    log: Mutex<Vec<Fetch>>,
}

impl ScriptedCatalog {
    fn with_search_page(mut self, page: u32, ids: &[&str]) -> Self {
        self.search_pages
            .insert(page, ids.iter().map(|id| id.to_string()).collect());
        self
    }

    fn with_failing_search_page(mut self, page: u32) -> Self {
        self.failing_search_pages.push(page);
        self
    }

    fn with_detail(mut self, id: &str, script: DetailScript) -> Self {
        self.details.insert(id.to_string(), script);
        self
    }

    fn with_available(self, id: &str) -> Self {
        self.with_detail(
            id,
            DetailScript::Available {
                shop_id: "shop-1".to_string(),
            },
        )
    }

    fn with_review_page(mut self, id: &str, page: u32, reviews: Vec<RawReview>) -> Self {
        self.reviews.insert((id.to_string(), page), reviews);
        self
    }

    fn with_failing_reviews(mut self, id: &str) -> Self {
        self.failing_reviews.push(id.to_string());
        self
    }

    fn fetches(&self) -> Vec<Fetch> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, matches: impl Fn(&Fetch) -> bool) -> usize {
        self.fetches().iter().filter(|f| matches(f)).count()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_search_page(&self, page: u32) -> Result<Vec<ProductReference>, ReaperError> {
        self.log.lock().unwrap().push(Fetch::Search(page));

        if self.failing_search_pages.contains(&page) {
            return Err(ReaperError::Status {
                url: format!("{}/search?page={}", BASE_URL, page),
                status: 503,
            });
        }

        Ok(self
            .search_pages
            .get(&page)
            .map(|ids| {
                ids.iter()
                    .map(|id| ProductReference::new(id.clone(), BASE_URL))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_product_detail(
        &self,
        reference: &ProductReference,
    ) -> Result<DetailResponse, ReaperError> {
        let id = reference.product_id.clone();
        self.log.lock().unwrap().push(Fetch::Detail(id.clone()));

        let fields = ProductDetail {
            title: Some(format!("Product {}", id)),
            price: Some("10.00".to_string()),
            url: format!("shop.test/listing/{}", id),
            favorited_by: Some(5),
            store_name: Some("TestShop".to_string()),
        };
        let credentials = Some(CredentialContext {
            csrf_token: format!("csrf-{}", id),
            session_cookie: Some("uaid=abc".to_string()),
        });

        match self.details.get(&id) {
            Some(DetailScript::Available { shop_id }) => Ok(DetailResponse {
                fields,
                availability: Availability::Available,
                shop_id: Some(shop_id.clone()),
                credentials,
            }),
            Some(DetailScript::Unavailable) => Ok(DetailResponse {
                fields,
                availability: Availability::Unavailable,
                shop_id: None,
                credentials: None,
            }),
            Some(DetailScript::MissingShop) => Ok(DetailResponse {
                fields,
                availability: Availability::Available,
                shop_id: None,
                credentials,
            }),
            Some(DetailScript::Fails) | None => Err(ReaperError::Status {
                url: reference.detail_url.clone(),
                status: 500,
            }),
        }
    }

    async fn fetch_review_page(
        &self,
        request: ReviewPageRequest<'_>,
    ) -> Result<Vec<RawReview>, ReaperError> {
        let id = request.product_id.to_string();
        self.log
            .lock()
            .unwrap()
            .push(Fetch::Review(id.clone(), request.page_number));

        assert_eq!(request.credentials.csrf_token, format!("csrf-{}", id));

        if self.failing_reviews.contains(&id) {
            return Err(ReaperError::HtmlParse {
                url: "review fragment".to_string(),
                message: "review has no product link".to_string(),
            });
        }

        Ok(self
            .reviews
            .get(&(id, request.page_number))
            .cloned()
            .unwrap_or_default())
    }
}

fn review(product_id: &str, reviewer: &str, rating: &str) -> RawReview {
    RawReview {
        review_product_id: product_id.to_string(),
        reviewer_id: reviewer.to_string(),
        rating: rating.to_string(),
    }
}

fn reviews_for(product_id: &str, count: usize) -> Vec<RawReview> {
    (0..count)
        .map(|i| review(product_id, &format!("user{}", i), "5"))
        .collect()
}

async fn crawl(
    catalog: ScriptedCatalog,
    start_page: u32,
    total_page_count: u32,
    urls_only: bool,
) -> (Vec<OutputRecord>, Coordinator<ScriptedCatalog, MemorySink>) {
    let state = CrawlState::new(total_page_count);
    crawl_with_state(catalog, start_page, total_page_count, urls_only, state).await
}

async fn crawl_with_state(
    catalog: ScriptedCatalog,
    start_page: u32,
    total_page_count: u32,
    urls_only: bool,
    state: Arc<CrawlState>,
) -> (Vec<OutputRecord>, Coordinator<ScriptedCatalog, MemorySink>) {
    let controller =
        CrawlController::new(PageCursor::new(start_page, total_page_count), urls_only, state);
    let mut coordinator = Coordinator::with_controller(catalog, MemorySink::new(), controller, 4);

    coordinator.run().await.expect("crawl should finish");
    assert!(coordinator.sink().is_finalized());

    let mut records = coordinator.sink().records().to_vec();
    records.sort_by(|a, b| a.url.cmp(&b.url));
    (records, coordinator)
}

fn find<'a>(records: &'a [OutputRecord], id: &str) -> &'a OutputRecord {
    records
        .iter()
        .find(|r| r.product_id.as_deref() == Some(id))
        .unwrap_or_else(|| panic!("no record for product {}", id))
}

#[tokio::test]
async fn test_two_products_with_three_reviews_each() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["A", "B"])
        .with_available("A")
        .with_available("B")
        .with_review_page(
            "A",
            1,
            vec![
                review("A", "alice", "5"),
                review("A", "bob", "4"),
                review("A", "carol", "3"),
            ],
        )
        .with_review_page("B", 1, reviews_for("B", 3));

    let (records, coordinator) = crawl(catalog, 1, 1, false).await;

    assert_eq!(records.len(), 2);

    let a = find(&records, "A");
    assert_eq!(a.reviews_count, Some(3));
    assert_eq!(
        a.reviewer_ids,
        Some(vec!["alice".into(), "bob".into(), "carol".into()])
    );
    assert_eq!(a.reviewer_ratings, Some(vec!["5".into(), "4".into(), "3".into()]));
    assert_eq!(a.title.as_deref(), Some("Product A"));
    assert_eq!(a.url, "shop.test/listing/A");

    let b = find(&records, "B");
    assert_eq!(b.reviews_count, Some(3));
    assert_eq!(b.reviewer_ids.as_ref().map(Vec::len), Some(3));

    // One review page each: three matches is not a full page.
    let stats = coordinator.stats();
    assert_eq!(stats.search_pages_fetched, 1);
    assert_eq!(stats.detail_fetches, 2);
    assert_eq!(stats.review_fetches, 2);
    assert_eq!(stats.records_emitted, 2);
    assert!(!stats.aborted_by_cap);
}

#[tokio::test]
async fn test_product_without_reviews() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["EMPTY"])
        .with_available("EMPTY");

    let (records, _) = crawl(catalog, 1, 1, false).await;

    let record = find(&records, "EMPTY");
    assert_eq!(record.reviews_count, Some(0));
    assert_eq!(record.reviewer_ids, Some(Vec::new()));
    assert_eq!(record.reviewer_ratings, Some(Vec::new()));
}

#[tokio::test]
async fn test_urls_only_skips_detail_and_reviews() {
    let catalog = ScriptedCatalog::default().with_search_page(1, &["1", "2", "3", "4", "5"]);

    let (records, coordinator) = crawl(catalog, 1, 1, true).await;

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(OutputRecord::is_url_only));
    assert_eq!(records[0].url, "http://shop.test/listing/1");

    let stats = coordinator.stats();
    assert_eq!(stats.detail_fetches, 0);
    assert_eq!(stats.review_fetches, 0);
}

#[tokio::test]
async fn test_review_chain_follows_full_pages() {
    let mut first = reviews_for("P", 4);
    first.push(review("SIBLING", "mallory", "1"));

    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["P"])
        .with_available("P")
        .with_review_page("P", 1, first)
        .with_review_page("P", 2, reviews_for("P", 4))
        .with_review_page("P", 3, reviews_for("P", 2));

    let (records, coordinator) = crawl(catalog, 1, 1, false).await;

    assert_eq!(records.len(), 1);
    let record = find(&records, "P");
    assert_eq!(record.reviews_count, Some(10));
    assert!(!record
        .reviewer_ids
        .as_ref()
        .unwrap()
        .contains(&"mallory".to_string()));
    assert_eq!(coordinator.stats().review_fetches, 3);
}

#[tokio::test]
async fn test_unavailable_product_is_dropped() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["GONE", "OK"])
        .with_detail("GONE", DetailScript::Unavailable)
        .with_available("OK");

    let (records, coordinator) = crawl(catalog, 1, 1, false).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_id.as_deref(), Some("OK"));
    assert_eq!(coordinator.stats().products_unavailable, 1);
    assert_eq!(coordinator.stats().products_failed, 0);
}

#[tokio::test]
async fn test_unavailable_product_never_requests_reviews() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["GONE"])
        .with_detail("GONE", DetailScript::Unavailable);

    let controller = CrawlController::new(PageCursor::new(1, 1), false, CrawlState::new(1));
    let catalog = Arc::new(catalog);
    let mut coordinator = Coordinator::with_controller(
        SharedCatalog(Arc::clone(&catalog)),
        MemorySink::new(),
        controller,
        2,
    );
    coordinator.run().await.unwrap();

    assert_eq!(coordinator.stats().products_unavailable, 1);
    assert_eq!(catalog.count(|f| matches!(f, Fetch::Review(..))), 0);
    assert!(coordinator.sink().records().is_empty());
}

#[tokio::test]
async fn test_failures_stay_with_their_product() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["BROKEN", "NOSHOP", "BADREVIEWS", "GOOD"])
        .with_detail("BROKEN", DetailScript::Fails)
        .with_detail("NOSHOP", DetailScript::MissingShop)
        .with_available("BADREVIEWS")
        .with_failing_reviews("BADREVIEWS")
        .with_available("GOOD")
        .with_review_page("GOOD", 1, reviews_for("GOOD", 1));

    let (records, coordinator) = crawl(catalog, 1, 1, false).await;

    assert_eq!(records.len(), 1);
    assert_eq!(find(&records, "GOOD").reviews_count, Some(1));
    assert_eq!(coordinator.stats().products_failed, 3);
}

#[tokio::test]
async fn test_pagination_respects_page_budget() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_search_page(3, &["1"])
            .with_search_page(4, &["2"])
            .with_search_page(5, &["3"]),
    );

    let controller = CrawlController::new(PageCursor::new(3, 2), true, CrawlState::new(2));
    let mut coordinator = Coordinator::with_controller(
        SharedCatalog(Arc::clone(&catalog)),
        MemorySink::new(),
        controller,
        2,
    );
    coordinator.run().await.unwrap();

    assert_eq!(catalog.fetches(), vec![Fetch::Search(3), Fetch::Search(4)]);
    assert_eq!(coordinator.sink().records().len(), 2);
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_search_page(1, &["1"])
            .with_search_page(3, &["3"]),
    );

    let controller = CrawlController::new(PageCursor::new(1, 10), true, CrawlState::new(10));
    let mut coordinator = Coordinator::with_controller(
        SharedCatalog(Arc::clone(&catalog)),
        MemorySink::new(),
        controller,
        2,
    );
    coordinator.run().await.unwrap();

    assert_eq!(catalog.fetches(), vec![Fetch::Search(1), Fetch::Search(2)]);
}

#[tokio::test]
async fn test_search_failure_ends_pagination() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_search_page(1, &["1"])
            .with_failing_search_page(2)
            .with_search_page(3, &["3"]),
    );

    let controller = CrawlController::new(PageCursor::new(1, 5), true, CrawlState::new(5));
    let mut coordinator = Coordinator::with_controller(
        SharedCatalog(Arc::clone(&catalog)),
        MemorySink::new(),
        controller,
        2,
    );
    coordinator.run().await.unwrap();

    assert_eq!(catalog.count(|f| matches!(f, Fetch::Search(_))), 2);
    assert_eq!(coordinator.stats().search_pages_failed, 1);
    assert_eq!(coordinator.sink().records().len(), 1);
}

#[tokio::test]
async fn test_emission_cap_stops_crawl() {
    let ids = ["1", "2", "3", "4", "5"];
    let mut catalog = ScriptedCatalog::default().with_search_page(1, &ids);
    for id in ids {
        catalog = catalog.with_available(id);
    }

    let (records, coordinator) =
        crawl_with_state(catalog, 1, 1, false, CrawlState::with_limit(2)).await;

    assert_eq!(records.len(), 2);
    assert_eq!(coordinator.state().emitted_count(), 2);
    assert!(coordinator.state().is_aborted());
    assert!(coordinator.stats().aborted_by_cap);
}

#[tokio::test]
async fn test_cap_applies_to_url_only_records() {
    let ids: Vec<String> = (0..20).map(|i| i.to_string()).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let catalog = ScriptedCatalog::default().with_search_page(1, &id_refs);

    let (records, coordinator) = crawl(catalog, 1, 1, true).await;

    assert_eq!(records.len(), 12);
    assert_eq!(coordinator.stats().records_discarded, 1);
    assert!(coordinator.stats().aborted_by_cap);
}

#[tokio::test]
async fn test_product_listed_on_two_pages_is_crawled_once() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_search_page(1, &["1", "2"])
            .with_search_page(2, &["1"])
            .with_available("1")
            .with_available("2")
            .with_review_page("1", 1, reviews_for("1", 2)),
    );

    let controller = CrawlController::new(PageCursor::new(1, 2), false, CrawlState::new(2));
    let mut coordinator = Coordinator::with_controller(
        SharedCatalog(Arc::clone(&catalog)),
        MemorySink::new(),
        controller,
        4,
    );
    coordinator.run().await.unwrap();

    let mut ids: Vec<_> = coordinator
        .sink()
        .records()
        .iter()
        .filter_map(|r| r.product_id.clone())
        .collect();
    ids.sort();
    assert_eq!(ids, ["1", "2"]);
    assert_eq!(coordinator.state().emitted_count(), 2);
    assert_eq!(
        catalog.count(|f| matches!(f, Fetch::Detail(id) if id == "1")),
        1
    );
    assert_eq!(
        catalog.count(|f| matches!(f, Fetch::Review(id, _) if id == "1")),
        1
    );
}

#[tokio::test]
async fn test_url_only_product_listed_twice_is_emitted_once() {
    let catalog = ScriptedCatalog::default()
        .with_search_page(1, &["1", "2"])
        .with_search_page(2, &["2", "3"]);

    let (records, coordinator) = crawl(catalog, 1, 2, true).await;

    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "http://shop.test/listing/1",
            "http://shop.test/listing/2",
            "http://shop.test/listing/3"
        ]
    );
    assert_eq!(coordinator.stats().records_emitted, 3);
}

/// Lets a test keep a handle on the catalog's fetch log
struct SharedCatalog(Arc<ScriptedCatalog>);

#[async_trait]
impl CatalogSource for SharedCatalog {
    async fn fetch_search_page(&self, page: u32) -> Result<Vec<ProductReference>, ReaperError> {
        self.0.fetch_search_page(page).await
    }

    async fn fetch_product_detail(
        &self,
        reference: &ProductReference,
    ) -> Result<DetailResponse, ReaperError> {
        self.0.fetch_product_detail(reference).await
    }

    async fn fetch_review_page(
        &self,
        request: ReviewPageRequest<'_>,
    ) -> Result<Vec<RawReview>, ReaperError> {
        self.0.fetch_review_page(request).await
    }
}
