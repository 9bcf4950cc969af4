//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageCursor`: Position and budget of the outer search-results loop
//! - `ReviewAccumulator`: Per-product review state carried across review pages
//! - `ProductPhase`: Where a single product is in its fetch pipeline
//! - `CrawlState`: Global emitted-item counter, cap, and abort flag

mod crawl_state;
mod page_cursor;
mod product_phase;
mod review_accumulator;

// Re-export main types
pub use crawl_state::{CrawlState, PRODUCTS_PER_PAGE};
pub use page_cursor::PageCursor;
pub use product_phase::ProductPhase;
pub use review_accumulator::{
    CredentialContext, RawReview, ReviewAccumulator, ReviewPageOutcome, ReviewPageRequest,
    REVIEWS_PER_PAGE,
};
