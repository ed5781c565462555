//! Business logic services for Skimpulse
//!
//! This crate provides the service layer between the HTTP routes and the
//! skimfeed source: the TTL article cache with single-flight refresh, and
//! the per-client request rate limiter.

pub mod article_cache;
pub mod rate_limiter;

pub use article_cache::{ArticleCache, CacheStatus, DEFAULT_CACHE_TTL};
pub use rate_limiter::{RateDecision, RateLimiter, RateLimiterStats};
