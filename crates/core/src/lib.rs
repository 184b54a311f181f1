//! Core types, traits and configuration for the crypto analytics workspace.

pub mod category;
pub mod config;
pub mod config_loader;
pub mod models;
pub mod traits;

pub use category::{classify, Category};
pub use config::{AnalyticsConfig, AppConfig, BinanceConfig, DatabaseConfig, IngestConfig};
pub use config_loader::ConfigLoader;
pub use models::{
    AssetSnapshot, AssetSnapshotDraft, ModelError, PricePoint, PricePointDraft, SupplyInfo,
    MAX_SYMBOL_LEN,
};
pub use traits::{MarketDataSource, SnapshotStore};
