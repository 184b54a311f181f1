//! Asset snapshot repository.
//!
//! One row per exchange pair; every write replaces the stored row wholesale.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::records::SnapshotRecord;

/// Repository for the `asset_snapshots` table.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or fully replaces the row with the same id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn upsert(&self, record: &SnapshotRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO asset_snapshots (
                id, symbol, name, current_price, rank, total_volume,
                price_change_24h, price_change_pct_24h, category,
                market_cap, circulating_supply, total_supply, max_supply, observed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                symbol = EXCLUDED.symbol,
                name = EXCLUDED.name,
                current_price = EXCLUDED.current_price,
                rank = EXCLUDED.rank,
                total_volume = EXCLUDED.total_volume,
                price_change_24h = EXCLUDED.price_change_24h,
                price_change_pct_24h = EXCLUDED.price_change_pct_24h,
                category = EXCLUDED.category,
                market_cap = EXCLUDED.market_cap,
                circulating_supply = EXCLUDED.circulating_supply,
                total_supply = EXCLUDED.total_supply,
                max_supply = EXCLUDED.max_supply,
                observed_at = EXCLUDED.observed_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.symbol)
        .bind(&record.name)
        .bind(record.current_price)
        .bind(record.rank)
        .bind(record.total_volume)
        .bind(record.price_change_24h)
        .bind(record.price_change_pct_24h)
        .bind(&record.category)
        .bind(record.market_cap)
        .bind(record.circulating_supply)
        .bind(record.total_supply)
        .bind(record.max_supply)
        .bind(record.observed_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert snapshot {}", record.id))?;

        Ok(())
    }

    /// Queries up to `limit` snapshots ordered by rank.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_by_rank(&self, limit: i64) -> Result<Vec<SnapshotRecord>> {
        let records = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            SELECT id, symbol, name, current_price, rank, total_volume,
                   price_change_24h, price_change_pct_24h, category,
                   market_cap, circulating_supply, total_supply, max_supply, observed_at
            FROM asset_snapshots
            ORDER BY rank ASC, id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list snapshots")?;

        Ok(records)
    }
}
