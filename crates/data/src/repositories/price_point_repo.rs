//! Daily price point repository.
//!
//! Provides batch insert and latest-N queries for per-asset price series.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::records::PricePointRecord;

/// Repository for the `price_points` table.
#[derive(Debug, Clone)]
pub struct PricePointRepository {
    pool: PgPool,
}

impl PricePointRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of points in one transaction.
    ///
    /// Uses ON CONFLICT DO NOTHING to handle duplicates gracefully.
    ///
    /// # Returns
    /// The number of records actually inserted (excluding duplicates).
    ///
    /// # Errors
    /// Returns an error if the database transaction fails.
    pub async fn insert_batch(&self, records: &[PricePointRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let mut inserted = 0u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO price_points (asset_id, timestamp, price, volume, market_cap)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (asset_id, timestamp) DO NOTHING
                "#,
            )
            .bind(&record.asset_id)
            .bind(record.timestamp)
            .bind(record.price)
            .bind(record.volume)
            .bind(record.market_cap)
            .execute(&mut *tx)
            .await
            .context("Failed to insert price point")?;

            inserted += result.rows_affected();
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(inserted)
    }

    /// Queries the latest `limit` points for an asset, oldest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn query_latest(&self, asset_id: &str, limit: i64) -> Result<Vec<PricePointRecord>> {
        let mut records = sqlx::query_as::<_, PricePointRecord>(
            r#"
            SELECT asset_id, timestamp, price, volume, market_cap
            FROM price_points
            WHERE asset_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(asset_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query price points")?;

        records.reverse();
        Ok(records)
    }
}
