//! Binance spot market data.
//!
//! [`BinanceMarketData`] implements [`crypto_analytics_core::MarketDataSource`]
//! on top of the public `ticker/24hr` and `klines` endpoints.

pub mod client;
pub mod normalize;
pub mod source;

pub use client::BinanceClient;
pub use normalize::{normalize_klines, normalize_tickers, pair_for, Parsed, SkipReason};
pub use source::{BinanceMarketData, MAX_KLINES};
