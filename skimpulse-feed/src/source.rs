//! Article source abstraction
//!
//! The cache refreshes through [`ArticleSource`] so it never needs to know
//! whether articles come from the live site or a test double.

use async_trait::async_trait;
use skimpulse_core::ArticleList;
use tracing::debug;

use crate::error::FeedError;
use crate::extractor::{Extractor, ExtractorConfig};
use crate::fetcher::{Fetcher, FetcherConfig};

/// Something that can produce a fresh article list
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch and extract one article list
    async fn fetch_articles(&self) -> Result<ArticleList, FeedError>;
}

/// The live skimfeed.com source: fetch the page, then extract
#[derive(Debug, Clone)]
pub struct SkimfeedSource {
    fetcher: Fetcher,
    extractor: Extractor,
}

impl SkimfeedSource {
    pub fn new(fetcher: Fetcher, extractor: Extractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Build both halves from configuration
    pub fn from_config(
        fetcher: FetcherConfig,
        extractor: ExtractorConfig,
    ) -> Result<Self, FeedError> {
        Ok(Self::new(Fetcher::new(fetcher)?, Extractor::new(extractor)?))
    }
}

#[async_trait]
impl ArticleSource for SkimfeedSource {
    async fn fetch_articles(&self) -> Result<ArticleList, FeedError> {
        let html = self.fetcher.fetch().await?;
        debug!("Extracting articles from {}", self.fetcher.url());
        self.extractor.extract(&html)
    }
}
