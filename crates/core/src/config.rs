use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub binance: BinanceConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub api_url: String,
    /// Only pairs quoted in this asset are tracked.
    pub quote_asset: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_per_second: u32,
    /// Disables TLS certificate verification. Leave off outside of testing.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of assets tracked per cycle.
    pub limit: usize,
    /// Pause after a cycle that published data.
    pub poll_interval_ms: u64,
    /// Pause after a cycle that returned nothing. Flat and unlimited while running.
    pub retry_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Daily candles requested for charts.
    pub history_days: usize,
    /// Points per asset used for correlation.
    pub correlation_window: usize,
    /// Print a trend report every N published cycles while streaming.
    pub trend_every: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Persistence is disabled when unset.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.binance.com".to_string(),
            quote_asset: "USDT".to_string(),
            timeout_secs: 5,
            user_agent: concat!("crypto-analytics/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit_per_second: 20,
            accept_invalid_certs: false,
        }
    }
}

impl BinanceConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            poll_interval_ms: 200,
            retry_interval_ms: 1000,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_days: 30,
            correlation_window: 30,
            trend_every: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.binance.api_url, "https://api.binance.com");
        assert_eq!(config.binance.quote_asset, "USDT");
        assert_eq!(config.binance.timeout(), Duration::from_secs(5));
        assert!(!config.binance.accept_invalid_certs);
        assert_eq!(config.ingest.limit, 50);
        assert_eq!(config.ingest.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.ingest.retry_interval(), Duration::from_secs(1));
        assert_eq!(config.analytics.correlation_window, 30);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"ingest": {"limit": 10}}"#).unwrap();

        assert_eq!(config.ingest.limit, 10);
        assert_eq!(config.ingest.poll_interval_ms, 200);
        assert_eq!(config.binance.quote_asset, "USDT");
    }
}
