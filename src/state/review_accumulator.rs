//! Per-product review accumulation across review-feed pages
//!
//! A review page holds a fixed number of reviews for the whole shop, so a
//! page can mix this product's reviews with reviews of sibling listings.
//! Only reviews whose own product id matches are kept.

/// Number of reviews the shop review feed returns per page
pub const REVIEWS_PER_PAGE: usize = 4;

/// Header and cookie material needed to repeat a review-page request
///
/// Owned by exactly one accumulator and never shared between products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialContext {
    /// CSRF token sent as the `x-csrf-token` header
    pub csrf_token: String,

    /// Session cookie as a `name=value` pair, if the detail response set one
    pub session_cookie: Option<String>,
}

/// One review as parsed out of a review page, before filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReview {
    /// Product id the review belongs to
    pub review_product_id: String,

    /// Reviewer identity (profile token, or "inactive")
    pub reviewer_id: String,

    /// Rating value as published
    pub rating: String,
}

/// Everything a fetcher needs to request one review page
#[derive(Debug, Clone, Copy)]
pub struct ReviewPageRequest<'a> {
    pub product_id: &'a str,
    pub shop_id: &'a str,
    pub credentials: &'a CredentialContext,
    pub page_number: u32,
}

/// What a processed review page means for the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPageOutcome {
    /// A full page matched; the next page should be fetched
    Continue { next_page: u32 },

    /// Fewer than a full page matched; the chain is finished
    Exhausted,
}

/// Mutable review state carried through one product's review chain
#[derive(Debug, Clone)]
pub struct ReviewAccumulator {
    product_id: String,
    shop_id: String,
    credentials: CredentialContext,
    page_number: u32,
    reviewer_ids: Vec<String>,
    reviewer_ratings: Vec<String>,
}

impl ReviewAccumulator {
    /// Creates an accumulator positioned on review page 1
    pub fn new(
        product_id: impl Into<String>,
        shop_id: impl Into<String>,
        credentials: CredentialContext,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            shop_id: shop_id.into(),
            credentials,
            page_number: 1,
            reviewer_ids: Vec::new(),
            reviewer_ratings: Vec::new(),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn reviewer_ids(&self) -> &[String] {
        &self.reviewer_ids
    }

    pub fn reviewer_ratings(&self) -> &[String] {
        &self.reviewer_ratings
    }

    /// Number of reviews collected so far
    pub fn reviews_count(&self) -> usize {
        self.reviewer_ratings.len()
    }

    /// Builds the request for the page this accumulator is waiting on
    pub fn request(&self) -> ReviewPageRequest<'_> {
        ReviewPageRequest {
            product_id: &self.product_id,
            shop_id: &self.shop_id,
            credentials: &self.credentials,
            page_number: self.page_number,
        }
    }

    /// Folds one fetched review page into the accumulator
    ///
    /// Reviews for other products are dropped before counting. When exactly
    /// [`REVIEWS_PER_PAGE`] reviews matched, the page number moves forward and
    /// the chain continues; any smaller count ends it.
    pub fn absorb(&mut self, raw_reviews: Vec<RawReview>) -> ReviewPageOutcome {
        let mut matched = 0;

        for review in raw_reviews {
            if review.review_product_id != self.product_id {
                continue;
            }
            matched += 1;
            self.reviewer_ids.push(review.reviewer_id);
            self.reviewer_ratings.push(review.rating);
        }

        debug_assert_eq!(self.reviewer_ids.len(), self.reviewer_ratings.len());

        tracing::debug!(
            "Product {} review page {}: {} matching reviews",
            self.product_id,
            self.page_number,
            matched
        );

        // NOTE: a feed whose matches land on a full page every time never
        // reaches Exhausted here; the chain then ends only on a fetch failure.
        if matched == REVIEWS_PER_PAGE {
            self.page_number += 1;
            ReviewPageOutcome::Continue {
                next_page: self.page_number,
            }
        } else {
            ReviewPageOutcome::Exhausted
        }
    }

    /// Consumes the accumulator, returning `(reviewer_ids, reviewer_ratings)`
    pub fn into_reviews(self) -> (Vec<String>, Vec<String>) {
        (self.reviewer_ids, self.reviewer_ratings)
    }
}
