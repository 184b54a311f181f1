use anyhow::{anyhow, Context, Result};
use crypto_analytics_core::BinanceConfig;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;

pub struct BinanceClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl BinanceClient {
    /// Builds a client with the configured timeout, identification headers and rate limit.
    ///
    /// # Errors
    /// Returns an error if the user agent is not a valid header value, the rate
    /// limit is zero, or the TLS backend cannot be initialised.
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for {}", config.api_url);
        }

        let http_client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        let per_second = NonZeroU32::new(config.rate_limit_per_second)
            .ok_or_else(|| anyhow!("Rate limit must be > 0"))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            http_client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET request and decodes the JSON body.
    ///
    /// # Errors
    /// Returns an error on transport failure, timeout, a non-success status or
    /// a body that is not JSON.
    pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Failed to send request to Binance API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Binance API error ({}): {}", status, error_text));
        }

        let json = response
            .json()
            .await
            .context("Failed to parse Binance API response")?;
        Ok(json)
    }
}
