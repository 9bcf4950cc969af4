/// Product phase definitions for tracking one product's pipeline
///
/// Each product moves through the detail fetch, then zero or more review
/// pages in strict order, and finally terminates.
use crate::ReaperError;
use std::fmt;

/// Represents where a single product is in its fetch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductPhase {
    /// Detail page has been requested, response not yet processed
    AwaitingDetail,

    /// Review page `n` has been requested, response not yet processed
    AwaitingReviewPage(u32),

    /// Record emitted, or product dropped
    Terminated,
}

impl ProductPhase {
    /// Returns true once the product needs no further fetches
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns the review page being waited on, if any
    pub fn review_page(&self) -> Option<u32> {
        match self {
            Self::AwaitingReviewPage(page) => Some(*page),
            _ => None,
        }
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// Legal steps:
    /// - detail → review page 1, or detail → terminated (unavailable, failed, cap)
    /// - review page n → review page n+1, or review page n → terminated
    pub fn can_transition_to(&self, next: ProductPhase) -> bool {
        match (self, next) {
            (Self::AwaitingDetail, Self::AwaitingReviewPage(1)) => true,
            (Self::AwaitingDetail, Self::Terminated) => true,
            (Self::AwaitingReviewPage(n), Self::AwaitingReviewPage(m)) => m == n + 1,
            (Self::AwaitingReviewPage(_), Self::Terminated) => true,
            _ => false,
        }
    }

    /// Performs a checked transition
    pub fn transition(self, next: ProductPhase) -> Result<ProductPhase, ReaperError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ReaperError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingDetail => "awaiting_detail",
            Self::AwaitingReviewPage(_) => "awaiting_review_page",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ProductPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingReviewPage(page) => write!(f, "{}({})", self.as_str(), page),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}
