//! HTTP client with retry and rate limiting
//!
//! Fetches fully-built URLs and returns whatever page the server finally
//! produced. Transient failures (connect errors, timeouts, retryable
//! statuses) are retried with exponential backoff; once retries are
//! exhausted a response is still returned so the crawl layer can classify
//! it rather than treat it as a fault.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries per request
    pub max_retries: u32,
    /// Initial delay for backoff (doubles per attempt)
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("zoho-export/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&HttpConfig> for HttpClientConfig {
    fn from(settings: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            rate_limit: Some(RateLimiterConfig::new(
                settings.requests_per_second,
                settings.burst_size,
            )),
            ..Self::default()
        }
    }
}

/// A completed response: transport status plus raw body text
///
/// Deliberately not parsed here; the classifier owns the decision of
/// whether the body is usable.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create a client from the export config's HTTP tuning
    pub fn from_settings(settings: &HttpConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from(settings))
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Fetch a URL, retrying transient failures.
    ///
    /// Returns `Ok` for any response the server completed, including non-200
    /// statuses after retries are exhausted. Returns `Err` only when no
    /// response could be obtained at all.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    debug!("GET {} -> {}", url, status.as_u16());
                    let body = match response.text().await {
                        Ok(body) => body,
                        Err(e) => {
                            warn!("Body read failed for {url}: {e}");
                            String::new()
                        }
                    };
                    return Ok(FetchedPage {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request error ({e}), attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: self.config.timeout.as_millis() as u64,
                        });
                    }
                    return Err(Error::Http(e));
                }
            }
        }
    }

    /// Exponential backoff delay for a given attempt, capped
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.config.initial_backoff * factor, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Check if an HTTP status is worth another attempt
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
