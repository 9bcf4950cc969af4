//! The seam between the crawl core and whatever fetches pages
//!
//! The controller never touches HTTP or markup. It consumes the typed values
//! defined here, produced by a [`CatalogSource`] implementation.

use crate::state::{CredentialContext, RawReview, ReviewPageRequest};
use crate::ReaperError;
use async_trait::async_trait;

/// A product found on a search-results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReference {
    /// Listing identifier
    pub product_id: String,

    /// Detail page URL derived from the identifier
    pub detail_url: String,
}

impl ProductReference {
    /// Derives the reference for `product_id` under `base_url`
    pub fn new(product_id: impl Into<String>, base_url: &str) -> Self {
        let product_id = product_id.into();
        let detail_url = format!("{}/listing/{}", base_url.trim_end_matches('/'), product_id);
        Self {
            product_id,
            detail_url,
        }
    }
}

/// Fields read from a product detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDetail {
    pub title: Option<String>,
    pub price: Option<String>,
    pub url: String,
    pub favorited_by: Option<u32>,
    pub store_name: Option<String>,
}

/// Whether a listing can still be bought
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Everything a detail fetch yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailResponse {
    pub fields: ProductDetail,
    pub availability: Availability,

    /// Shop owning the listing; needed to address the review feed
    pub shop_id: Option<String>,

    /// Material needed to repeat review-feed requests for this product
    pub credentials: Option<CredentialContext>,
}

impl DetailResponse {
    pub fn is_unavailable(&self) -> bool {
        self.availability == Availability::Unavailable
    }
}

/// Source of search pages, product details, and review pages
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches one search-results page; an empty list means no more results
    async fn fetch_search_page(&self, page: u32) -> Result<Vec<ProductReference>, ReaperError>;

    /// Fetches and reads a product's detail page
    async fn fetch_product_detail(
        &self,
        reference: &ProductReference,
    ) -> Result<DetailResponse, ReaperError>;

    /// Fetches one page of the shop review feed, unfiltered
    async fn fetch_review_page(
        &self,
        request: ReviewPageRequest<'_>,
    ) -> Result<Vec<RawReview>, ReaperError>;
}
