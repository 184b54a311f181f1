//! In-process [`SnapshotStore`] for tests and runs without a database.

use anyhow::Result;
use async_trait::async_trait;
use crypto_analytics_core::{AssetSnapshot, PricePoint, SnapshotStore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Snapshots keyed by id and per-asset point series kept in time order.
///
/// Appending a point whose timestamp already exists for that asset is ignored,
/// matching the database's `ON CONFLICT DO NOTHING`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<String, AssetSnapshot>>,
    points: RwLock<HashMap<String, Vec<PricePoint>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<AssetSnapshot> {
        self.snapshots.read().get(id).cloned()
    }

    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }

    #[must_use]
    pub fn point_count(&self, asset_id: &str) -> usize {
        self.points.read().get(asset_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn upsert_snapshot(&self, snapshot: &AssetSnapshot) -> Result<()> {
        self.snapshots
            .write()
            .insert(snapshot.id().to_string(), snapshot.clone());
        Ok(())
    }

    async fn append_price_points(&self, points: &[PricePoint]) -> Result<u64> {
        let mut series = self.points.write();
        let mut inserted = 0u64;

        for point in points {
            let entries = series.entry(point.asset_id().to_string()).or_default();
            if let Err(pos) = entries.binary_search_by_key(&point.timestamp(), PricePoint::timestamp)
            {
                entries.insert(pos, point.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn recent_points(&self, asset_id: &str, limit: usize) -> Result<Vec<PricePoint>> {
        let series = self.points.read();
        let Some(entries) = series.get(asset_id) else {
            return Ok(Vec::new());
        };
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }

    async fn list_snapshots(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
        let mut snapshots: Vec<AssetSnapshot> = self.snapshots.read().values().cloned().collect();
        snapshots.sort_by(|a, b| a.rank().cmp(&b.rank()).then_with(|| a.id().cmp(b.id())));
        snapshots.truncate(limit);
        Ok(snapshots)
    }
}
