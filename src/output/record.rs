use serde::Serialize;

/// One finished product record handed to a sink
///
/// URL-only records carry just `url`; every other field is skipped when
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorited_by: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_ratings: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<usize>,
}

impl OutputRecord {
    /// Creates a record holding only a detail URL
    pub fn url_only(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns true if this record carries nothing but a URL
    pub fn is_url_only(&self) -> bool {
        self.product_id.is_none() && self.reviews_count.is_none()
    }
}
