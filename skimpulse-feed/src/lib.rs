//! Skimfeed client for headline aggregation
//!
//! This crate provides the pieces that turn the skimfeed.com front page
//! into an article list:
//! - Fetcher: one outbound GET with a browser user-agent and a timeout
//! - Extractor: anchor matching, denylist filtering and URL resolution
//! - Source: the async seam the cache refreshes through

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod source;

pub use error::FeedError;
pub use extractor::{
    default_denylist, section_denylist, ExtractScope, Extractor, ExtractorConfig,
};
pub use fetcher::{Fetcher, FetcherConfig};
pub use source::{ArticleSource, SkimfeedSource};
