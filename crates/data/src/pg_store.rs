//! PostgreSQL-backed [`SnapshotStore`].

use anyhow::Result;
use async_trait::async_trait;
use crypto_analytics_core::{AssetSnapshot, PricePoint, SnapshotStore};

use crate::database::DatabaseClient;
use crate::records::{PricePointRecord, SnapshotRecord};
use crate::repositories::Repositories;

/// Store over the `asset_snapshots` and `price_points` tables.
///
/// Rows that fail model validation on read are logged and skipped.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    repos: Repositories,
}

impl PgSnapshotStore {
    #[must_use]
    pub fn new(client: &DatabaseClient) -> Self {
        Self {
            repos: Repositories::new(client.pool().clone()),
        }
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn valid_rows<R, T>(rows: Vec<R>, kind: &str) -> Vec<T>
where
    T: TryFrom<R>,
    T::Error: std::fmt::Display,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("Skipping corrupt {} row: {}", kind, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn upsert_snapshot(&self, snapshot: &AssetSnapshot) -> Result<()> {
        self.repos
            .snapshots
            .upsert(&SnapshotRecord::from(snapshot))
            .await
    }

    async fn append_price_points(&self, points: &[PricePoint]) -> Result<u64> {
        let records: Vec<PricePointRecord> = points.iter().map(PricePointRecord::from).collect();
        self.repos.price_points.insert_batch(&records).await
    }

    async fn recent_points(&self, asset_id: &str, limit: usize) -> Result<Vec<PricePoint>> {
        let rows = self
            .repos
            .price_points
            .query_latest(asset_id, sql_limit(limit))
            .await?;
        Ok(valid_rows(rows, "price point"))
    }

    async fn list_snapshots(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
        let rows = self.repos.snapshots.list_by_rank(sql_limit(limit)).await?;
        Ok(valid_rows(rows, "snapshot"))
    }
}
