//! HTML and JSON extraction for search, detail, and review responses
//!
//! This module reads:
//! - Product ids from search-results markup
//! - Title, price, favorites, store name, shop id, and CSRF token from a
//!   listing page
//! - Individual reviews from the review-feed JSON payload

use crate::crawler::source::{Availability, DetailResponse, ProductDetail, ProductReference};
use crate::state::{CredentialContext, RawReview};
use crate::ReaperError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

/// Marker text of the "listing no longer available" page
const UNAVAILABLE_MARKER: &str = "Darn";

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("price pattern should compile"));

static COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("count pattern should compile"));

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("hardcoded selector should parse")
}

static LISTING_LINK: LazyLock<Selector> =
    LazyLock::new(|| css("div[data-search-results] li a[class*='listing-link']"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| css("h2"));
static TITLE_META: LazyLock<Selector> = LazyLock::new(|| css("meta[property='og:title']"));
static IMAGE_META: LazyLock<Selector> = LazyLock::new(|| css("[property='og:image']"));
static CSRF_INPUT: LazyLock<Selector> = LazyLock::new(|| css("[name='_nnc']"));
static PRICE_TEXT: LazyLock<Selector> =
    LazyLock::new(|| css("div[data-buy-box-region*='price'] p"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a"));
static STORE_SPAN: LazyLock<Selector> = LazyLock::new(|| css("div#listing-page-cart span"));
static REVIEW_REGION: LazyLock<Selector> = LazyLock::new(|| {
    css("div[data-appears-component-name='listing_page_reviews'] div[data-review-region]")
});
static REVIEW_LINK: LazyLock<Selector> = LazyLock::new(|| css("a[data-review-link]"));
static REVIEW_USERNAME: LazyLock<Selector> = LazyLock::new(|| css("a[data-review-username]"));
static REVIEW_RATING: LazyLock<Selector> = LazyLock::new(|| css("input[name='rating']"));

/// Extracts product references from a search-results page
///
/// Links are read from listing cards inside the search results container.
/// The product id is the path segment following `listing`.
pub fn parse_search_results(html: &str, base_url: &Url) -> Vec<ProductReference> {
    let document = Html::parse_document(html);
    let base = base_url.as_str().trim_end_matches('/');

    document
        .select(&LISTING_LINK)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| listing_id_from_href(href, base_url))
        .map(|id| ProductReference::new(id, base))
        .collect()
}

/// Resolves a listing link and returns its product id
fn listing_id_from_href(href: &str, base_url: &Url) -> Option<String> {
    let url = base_url.join(href.trim()).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "listing")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Reads a product detail page
///
/// # Arguments
///
/// * `html` - The detail page body
/// * `product_id` - Id of the product the page belongs to
/// * `page_url` - URL the page was fetched from
/// * `session_cookie` - Session cookie set by the response, as `name=value`
pub fn parse_product_detail(
    html: &str,
    product_id: &str,
    page_url: &Url,
    session_cookie: Option<String>,
) -> DetailResponse {
    let document = Html::parse_document(html);

    let availability = if has_unavailable_marker(&document) {
        Availability::Unavailable
    } else {
        Availability::Available
    };

    let fields = ProductDetail {
        title: attr_value(&document, &TITLE_META, "content"),
        price: extract_price(&document),
        url: canonical_listing_url(page_url, product_id),
        favorited_by: extract_favorited_by(&document),
        store_name: extract_store_name(&document),
    };

    let shop_id = attr_value(&document, &IMAGE_META, "content")
        .and_then(|image_url| image_url.split('/').nth(3).map(str::to_string))
        .filter(|id| !id.is_empty());

    let credentials = attr_value(&document, &CSRF_INPUT, "value")
        .filter(|token| !token.is_empty())
        .map(|csrf_token| CredentialContext {
            csrf_token,
            session_cookie,
        });

    DetailResponse {
        fields,
        availability,
        shop_id,
        credentials,
    }
}

fn has_unavailable_marker(document: &Html) -> bool {
    document
        .select(&HEADING)
        .any(|heading| element_text(&heading).contains(UNAVAILABLE_MARKER))
}

/// `host[:port]/listing/{id}`, without the scheme
fn canonical_listing_url(page_url: &Url, product_id: &str) -> String {
    let host = page_url.host_str().unwrap_or_default();
    match page_url.port() {
        Some(port) => format!("{}:{}/listing/{}", host, port, product_id),
        None => format!("{}/listing/{}", host, product_id),
    }
}

fn extract_price(document: &Html) -> Option<String> {
    document
        .select(&PRICE_TEXT)
        .flat_map(|paragraph| paragraph.text())
        .find_map(first_decimal)
}

fn extract_favorited_by(document: &Html) -> Option<u32> {
    document
        .select(&ANCHOR)
        .flat_map(|link| link.text())
        .filter(|text| text.contains(" favorites"))
        .find_map(|text| first_integer(text).and_then(|n| n.parse().ok()))
}

fn extract_store_name(document: &Html) -> Option<String> {
    document
        .select(&STORE_SPAN)
        .flat_map(|span| span.text())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

fn attr_value(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn first_decimal(text: &str) -> Option<String> {
    PRICE_PATTERN.find(text).map(|m| m.as_str().to_string())
}

fn first_integer(text: &str) -> Option<&str> {
    COUNT_PATTERN.find(text).map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    output: ReviewOutput,
}

#[derive(Debug, Deserialize)]
struct ReviewOutput {
    reviews: String,
}

/// Parses the review-feed JSON response into raw reviews
///
/// The payload wraps an HTML fragment under `output.reviews`. Reviews for
/// every listing of the shop are returned; filtering happens later.
pub fn parse_review_payload(body: &str) -> Result<Vec<RawReview>, ReaperError> {
    let payload: ReviewPayload = serde_json::from_str(body)?;
    parse_review_fragment(&payload.output.reviews)
}

/// Parses the reviews HTML fragment
///
/// A review whose product link is missing makes the whole page unreadable,
/// since it could not be attributed to any product.
pub fn parse_review_fragment(html: &str) -> Result<Vec<RawReview>, ReaperError> {
    let fragment = Html::parse_fragment(html);
    let mut reviews = Vec::new();

    for review in fragment.select(&REVIEW_REGION) {
        let region = review.value().attr("data-review-region").unwrap_or_default();
        if !region.chars().any(|c| c.is_alphanumeric() || c == '_') {
            continue;
        }

        let review_product_id = review
            .select(&REVIEW_LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| href.split('/').nth(2))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ReaperError::HtmlParse {
                url: "review fragment".to_string(),
                message: format!("review '{}' has no product link", region),
            })?
            .to_string();

        let reviewer_id = match review
            .select(&REVIEW_USERNAME)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            Some(profile) => reviewer_from_profile(profile),
            None => "inactive".to_string(),
        };

        let rating = review
            .select(&REVIEW_RATING)
            .next()
            .and_then(|input| input.value().attr("value"))
            .unwrap_or_default()
            .to_string();

        reviews.push(RawReview {
            review_product_id,
            reviewer_id,
            rating,
        });
    }

    Ok(reviews)
}

/// User token from a reviewer profile link such as `/people/abc123?ref=...`
fn reviewer_from_profile(profile: &str) -> String {
    profile
        .split('?')
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
        .filter(|token| !token.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
