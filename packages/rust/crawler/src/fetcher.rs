//! Single-shot document retrieval.
//!
//! A [`Fetcher`] performs exactly one GET per call: no retries, no caching,
//! redirects only as the transport follows them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::debug;
use url::Url;

use billtrack_shared::{BilltrackError, CrawlConfig, Result};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("billtrack/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects the transport follows.
const MAX_REDIRECTS: usize = 5;

/// Per-call fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Send `Cache-Control: no-cache` / `Pragma: no-cache`.
    pub no_cache: bool,
}

/// Retrieves a document body as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body.
    ///
    /// Fails with [`BilltrackError::Network`] on timeout, connection failure,
    /// or a non-success status.
    async fn fetch(&self, url: &Url, opts: FetchOptions) -> Result<String>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured per-request timeout.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        Self::with_timeout(config.timeout)
    }

    /// Build a fetcher with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| BilltrackError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, opts: FetchOptions) -> Result<String> {
        debug!(%url, no_cache = opts.no_cache, "fetching document");

        let mut request = self.client.get(url.as_str());
        if opts.no_cache {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| BilltrackError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BilltrackError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| BilltrackError::Network(format!("{url}: body read failed: {e}")))
    }
}
