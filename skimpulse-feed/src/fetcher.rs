//! Outbound HTTP fetch of the skimfeed front page

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::error::FeedError;
use crate::extractor::DEFAULT_BASE_URL;

/// Desktop browser identity; the site rejects default client user-agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Page to download
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Downloads the raw page HTML
///
/// A single attempt per call. Retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    /// Create a new fetcher
    pub fn new(config: FetcherConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| FeedError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the page body
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<String, FeedError> {
        info!("Fetching {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::transport(format!("Failed to fetch {}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::transport(format!(
                "Failed to fetch {}: HTTP {}",
                self.url, status
            )));
        }

        let html = response.text().await.map_err(|e| {
            FeedError::transport(format!("Failed to read response from {}: {}", self.url, e))
        })?;

        debug!("Fetched {} bytes", html.len());
        Ok(html)
    }
}
