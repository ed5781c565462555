//! Error types for the feed module

use thiserror::Error;

/// Errors that can occur while fetching or extracting the feed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Network failure, timeout or non-2xx status from the remote page
    #[error("Request failed: {message}")]
    Transport {
        /// Human-readable cause
        message: String,
    },

    /// The page parsed but no anchor survived filtering
    #[error("No articles found")]
    NoArticlesFound,

    /// Section-scoped extraction could not find the named section
    #[error("{section} section not found")]
    SectionNotFound {
        /// Heading label that was searched for
        section: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The refresh task died before producing a result
    #[error("Refresh aborted: {0}")]
    RefreshAborted(String),
}

impl FeedError {
    pub fn transport(msg: impl Into<String>) -> Self {
        FeedError::Transport {
            message: msg.into(),
        }
    }

    /// True for failures that mean "the page had nothing for us"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FeedError::NoArticlesFound | FeedError::SectionNotFound { .. }
        )
    }
}
