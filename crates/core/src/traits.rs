use crate::models::{AssetSnapshot, PricePoint};
use anyhow::Result;
use async_trait::async_trait;

/// Source of ranked market snapshots and historical series.
///
/// Implementations absorb transport and parse failures: an unavailable source
/// yields an empty list, and malformed records are dropped individually.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Returns up to `limit` assets ranked 1..N by descending quote volume.
    async fn fetch_snapshot(&self, limit: usize) -> Vec<AssetSnapshot>;

    /// Returns up to `count` most recent daily points, oldest first.
    async fn fetch_historical(&self, asset_id: &str, count: usize) -> Vec<PricePoint>;
}

/// Storage collaborator for snapshots and price history.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Saves or replaces the snapshot with the same id.
    async fn upsert_snapshot(&self, snapshot: &AssetSnapshot) -> Result<()>;

    /// Appends points, returning how many were stored.
    async fn append_price_points(&self, points: &[PricePoint]) -> Result<u64>;

    /// Returns the last `limit` points for an asset, oldest first.
    async fn recent_points(&self, asset_id: &str, limit: usize) -> Result<Vec<PricePoint>>;

    /// Returns up to `limit` stored snapshots ordered by rank.
    async fn list_snapshots(&self, limit: usize) -> Result<Vec<AssetSnapshot>>;
}
