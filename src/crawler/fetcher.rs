//! HTTP implementation of the catalog source
//!
//! This module handles all HTTP traffic for the crawler, including:
//! - Building the HTTP client with a proper user agent string
//! - GET requests for search-results and listing pages
//! - Keeping cookies from every response in a shared jar
//! - Capturing the session cookie set by a listing page
//! - Form POSTs to the review feed with the listing's CSRF token
//! - Mapping non-success responses to errors

use crate::config::{Config, UserAgentConfig};
use crate::crawler::parser::{parse_product_detail, parse_review_payload, parse_search_results};
use crate::crawler::source::{CatalogSource, DetailResponse, ProductReference};
use crate::state::{RawReview, ReviewPageRequest};
use crate::ReaperError;
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Component the review feed endpoint is asked to render
const REVIEWS_API_SPEC: &str = "Etsy\\Web\\ListingPage\\Reviews\\ApiSpec";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout applied to every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use listing_reaper::config::UserAgentConfig;
/// use listing_reaper::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ListingReaper".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .cookie_store(true)
        .build()
}

/// Catalog source backed by the live site
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
    search_term: String,
    review_endpoint: Url,
}

impl HttpCatalogSource {
    /// Creates a source for `search_term` against `base_url`
    ///
    /// `review_endpoint` is a path resolved against the base URL.
    pub fn new(
        client: Client,
        base_url: Url,
        search_term: impl Into<String>,
        review_endpoint: &str,
    ) -> Result<Self, ReaperError> {
        let review_endpoint = base_url.join(review_endpoint)?;
        Ok(Self {
            client,
            base_url,
            search_term: search_term.into(),
            review_endpoint,
        })
    }

    /// Creates a source from the full configuration
    pub fn from_config(config: &Config) -> Result<Self, ReaperError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let base_url = Url::parse(&config.site.base_url)?;
        Self::new(
            client,
            base_url,
            config.search.term.clone(),
            &config.site.review_endpoint,
        )
    }

    /// URL of the search-results page `page`
    pub fn search_url(&self, page: u32) -> Result<Url, ReaperError> {
        let mut url = self.base_url.join("/search")?;
        url.query_pairs_mut()
            .append_pair("q", &self.search_term)
            .append_pair("ref", "pagination")
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn review_endpoint(&self) -> &Url {
        &self.review_endpoint
    }
}

/// Sends the request and rejects non-success statuses
async fn send_checked(
    request: reqwest::RequestBuilder,
    url: &Url,
) -> Result<Response, ReaperError> {
    let response = request.send().await.map_err(|source| ReaperError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReaperError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

async fn read_body(response: Response, url: &Url) -> Result<String, ReaperError> {
    response.text().await.map_err(|source| ReaperError::Http {
        url: url.to_string(),
        source,
    })
}

/// `name=value` part of the first Set-Cookie header
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .map(str::to_string)
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_search_page(&self, page: u32) -> Result<Vec<ProductReference>, ReaperError> {
        let url = self.search_url(page)?;
        tracing::debug!("Fetching search page {}: {}", page, url);

        let response = send_checked(self.client.get(url.clone()), &url).await?;
        let body = read_body(response, &url).await?;

        Ok(parse_search_results(&body, &self.base_url))
    }

    async fn fetch_product_detail(
        &self,
        reference: &ProductReference,
    ) -> Result<DetailResponse, ReaperError> {
        let url = Url::parse(&reference.detail_url)?;
        tracing::debug!("Fetching product {}: {}", reference.product_id, url);

        let response = send_checked(self.client.get(url.clone()), &url).await?;
        let cookie = session_cookie(&response);
        let body = read_body(response, &url).await?;

        Ok(parse_product_detail(
            &body,
            &reference.product_id,
            &url,
            cookie,
        ))
    }

    async fn fetch_review_page(
        &self,
        request: ReviewPageRequest<'_>,
    ) -> Result<Vec<RawReview>, ReaperError> {
        let url = &self.review_endpoint;
        tracing::debug!(
            "Fetching review page {} for product {}",
            request.page_number,
            request.product_id
        );

        let page = request.page_number.to_string();
        let form = [
            ("specs[reviews][]", REVIEWS_API_SPEC),
            ("specs[reviews][1][listing_id]", request.product_id),
            ("specs[reviews][1][shop_id]", request.shop_id),
            ("specs[reviews][1][render_complete]", "true"),
            ("specs[reviews][1][active_tab]", "same_listing_reviews"),
            ("specs[reviews][1][should_lazy_load_images]", "false"),
            ("specs[reviews][1][page]", page.as_str()),
        ];

        let mut builder = self
            .client
            .post(url.clone())
            .header("x-csrf-token", request.credentials.csrf_token.as_str())
            .form(&form);
        // The listing's own cookie wins over whatever the jar holds for the host
        if let Some(cookie) = &request.credentials.session_cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }

        let response = send_checked(builder, url).await?;
        let body = read_body(response, url).await?;

        parse_review_payload(&body)
    }
}
