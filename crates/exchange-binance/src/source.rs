use crate::client::BinanceClient;
use crate::normalize::{normalize_klines, normalize_tickers};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use crypto_analytics_core::{AssetSnapshot, BinanceConfig, MarketDataSource, PricePoint};
use serde_json::Value;

/// Largest number of candles Binance returns for one klines request.
pub const MAX_KLINES: usize = 1000;

const TICKER_ENDPOINT: &str = "/api/v3/ticker/24hr";
const KLINES_ENDPOINT: &str = "/api/v3/klines";

/// Binance spot market data, normalized into ranked snapshots and daily series.
pub struct BinanceMarketData {
    client: BinanceClient,
    quote_asset: String,
}

impl BinanceMarketData {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        Ok(Self {
            client: BinanceClient::new(config)?,
            quote_asset: config.quote_asset.trim().to_uppercase(),
        })
    }

    /// Points the source at a different API root (used for mock servers).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be rebuilt.
    pub fn with_base_url(config: &BinanceConfig, base_url: impl Into<String>) -> Result<Self> {
        let config = BinanceConfig {
            api_url: base_url.into(),
            ..config.clone()
        };
        Self::new(&config)
    }

    #[must_use]
    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    async fn get_array(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Vec<Value>> {
        match self.client.get(endpoint, query).await? {
            Value::Array(items) => Ok(items),
            other => Err(anyhow!(
                "Expected JSON array from {}, got {}",
                endpoint,
                json_kind(&other)
            )),
        }
    }

    /// Fetches the full 24h ticker list.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not an array.
    pub async fn try_fetch_snapshot(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
        let raw = self.get_array(TICKER_ENDPOINT, &[]).await?;
        let observed_at = Utc::now();
        let snapshots = normalize_tickers(&raw, &self.quote_asset, limit, observed_at);

        tracing::debug!(
            "Normalized {} of {} tickers (limit {})",
            snapshots.len(),
            raw.len(),
            limit
        );
        Ok(snapshots)
    }

    /// Fetches daily candles for `asset_id`, clamped to [`MAX_KLINES`].
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not an array.
    pub async fn try_fetch_historical(
        &self,
        asset_id: &str,
        count: usize,
    ) -> Result<Vec<PricePoint>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pair = asset_id.trim().to_uppercase();
        let limit = count.min(MAX_KLINES);
        let query = [
            ("symbol", pair.clone()),
            ("interval", "1d".to_string()),
            ("limit", limit.to_string()),
        ];

        let raw = self.get_array(KLINES_ENDPOINT, &query).await?;
        Ok(normalize_klines(&raw, &pair))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl MarketDataSource for BinanceMarketData {
    async fn fetch_snapshot(&self, limit: usize) -> Vec<AssetSnapshot> {
        match self.try_fetch_snapshot(limit).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::warn!("Snapshot fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_historical(&self, asset_id: &str, count: usize) -> Vec<PricePoint> {
        match self.try_fetch_historical(asset_id, count).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("History fetch for {} failed: {:#}", asset_id, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_asset_normalized() {
        let config = BinanceConfig {
            quote_asset: " usdt ".to_string(),
            ..BinanceConfig::default()
        };
        let source = BinanceMarketData::new(&config).unwrap();
        assert_eq!(source.quote_asset(), "USDT");
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!({})), "object");
        assert_eq!(json_kind(&json!([])), "array");
        assert_eq!(json_kind(&json!(null)), "null");
    }

    #[tokio::test]
    async fn test_zero_count_skips_request() {
        // Unroutable base URL: any request would fail, so an empty Ok proves none was made.
        let source =
            BinanceMarketData::with_base_url(&BinanceConfig::default(), "http://127.0.0.1:9")
                .unwrap();
        let points = source.try_fetch_historical("BTCUSDT", 0).await.unwrap();
        assert!(points.is_empty());
    }
}
