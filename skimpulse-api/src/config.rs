//! Server configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use skimpulse_core::MAX_ARTICLES;
use skimpulse_feed::extractor::{DEFAULT_BASE_URL, DEFAULT_LINK_PREFIX};
use skimpulse_feed::fetcher::{BROWSER_USER_AGENT, DEFAULT_TIMEOUT};
use skimpulse_feed::{
    default_denylist, section_denylist, ExtractScope, ExtractorConfig, FetcherConfig,
};
use skimpulse_services::rate_limiter::DEFAULT_REQUESTS_PER_WINDOW;
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WEB_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_MINUTES: u64 = 5;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_APP_VERSION: &str = "1.0.0";
const DEFAULT_UPDATE_MESSAGE: &str =
    "A new version of Skimpulse is available. Please update to continue using the app.";

/// Mobile app update policy echoed by `/api/version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConfig {
    pub minimum_version: String,
    pub latest_version: String,
    pub force_update: bool,
    pub update_url: Option<String>,
    pub update_message: String,
}

/// Where and how to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Page URL, also the base for relative article links
    pub url: String,
    pub timeout: Duration,
    /// Restrict extraction to the section with this heading
    pub section: Option<String>,
    pub emit_rank: bool,
}

/// Static web app hosting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub dir: PathBuf,
    pub port: u16,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Deployment label reported by `/health`
    pub environment: String,
    pub cache_ttl: Duration,
    /// Requests per client IP per minute on `/api`; 0 disables limiting
    pub rate_limit_per_minute: u32,
    /// Key rate limits on the first `X-Forwarded-For` entry instead of the peer
    pub trust_proxy: bool,
    pub version: VersionConfig,
    pub feed: FeedConfig,
    pub web: Option<WebConfig>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Blank values count as unset. Values that fail to parse are logged
    /// and replaced with the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let ttl_minutes: u64 = parse_or(&get, "CACHE_TTL_MINUTES", DEFAULT_CACHE_TTL_MINUTES);

        let section = get("SKIMFEED_SECTION");
        // Section lists are ranked unless explicitly turned off
        let emit_rank = parse_or(&get, "SKIMFEED_RANKING", section.is_some());

        let web = get("WEB_DIR").map(|dir| WebConfig {
            dir: PathBuf::from(dir),
            port: parse_or(&get, "WEB_PORT", DEFAULT_WEB_PORT),
        });

        Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT),
            environment: get("APP_ENV")
                .or_else(|| get("NODE_ENV"))
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            cache_ttl: Duration::from_secs(ttl_minutes.saturating_mul(60)),
            rate_limit_per_minute: parse_or(
                &get,
                "RATE_LIMIT_PER_MINUTE",
                DEFAULT_REQUESTS_PER_WINDOW,
            ),
            trust_proxy: parse_or(&get, "TRUST_PROXY", false),
            version: VersionConfig {
                minimum_version: get("MINIMUM_APP_VERSION")
                    .unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
                latest_version: get("LATEST_APP_VERSION")
                    .unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
                force_update: get("FORCE_UPDATE").as_deref() == Some("true"),
                update_url: get("UPDATE_URL"),
                update_message: get("UPDATE_MESSAGE")
                    .unwrap_or_else(|| DEFAULT_UPDATE_MESSAGE.to_string()),
            },
            feed: FeedConfig {
                url: get("SKIMFEED_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(parse_or(
                    &get,
                    "FETCH_TIMEOUT_SECS",
                    DEFAULT_TIMEOUT.as_secs(),
                )),
                section,
                emit_rank,
            },
            web,
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            url: self.feed.url.clone(),
            timeout: self.feed.timeout,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            base_url: self.feed.url.clone(),
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            denylist: match self.feed.section {
                Some(_) => section_denylist(),
                None => default_denylist(),
            },
            scope: match &self.feed.section {
                Some(label) => ExtractScope::named_section(label.clone()),
                None => ExtractScope::WholePage,
            },
            emit_rank: self.feed.emit_rank,
            max_articles: MAX_ARTICLES,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
    }
}
