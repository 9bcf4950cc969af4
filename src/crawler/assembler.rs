//! Folds a finished review chain into one output record

use crate::crawler::source::ProductDetail;
use crate::output::OutputRecord;
use crate::state::ReviewAccumulator;

/// Merges detail-page fields with the accumulated reviews
///
/// Only call this once the accumulator's review chain is exhausted.
pub fn assemble(detail: ProductDetail, accumulator: ReviewAccumulator) -> OutputRecord {
    let product_id = accumulator.product_id().to_string();
    let (reviewer_ids, reviewer_ratings) = accumulator.into_reviews();
    let reviews_count = reviewer_ratings.len();

    OutputRecord {
        product_id: Some(product_id),
        title: detail.title,
        price: detail.price,
        url: detail.url,
        favorited_by: detail.favorited_by,
        store_name: detail.store_name,
        reviewer_ids: Some(reviewer_ids),
        reviewer_ratings: Some(reviewer_ratings),
        reviews_count: Some(reviews_count),
    }
}
