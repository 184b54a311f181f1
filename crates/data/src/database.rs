use anyhow::{Context, Result};
use crypto_analytics_core::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

const CREATE_SNAPSHOTS: &str = r"
    CREATE TABLE IF NOT EXISTS asset_snapshots (
        id TEXT PRIMARY KEY,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        current_price NUMERIC NOT NULL,
        rank INTEGER NOT NULL,
        total_volume NUMERIC NOT NULL,
        price_change_24h NUMERIC,
        price_change_pct_24h NUMERIC,
        category TEXT NOT NULL,
        market_cap NUMERIC,
        circulating_supply NUMERIC,
        total_supply NUMERIC,
        max_supply NUMERIC,
        observed_at TIMESTAMPTZ NOT NULL
    )
";

const CREATE_PRICE_POINTS: &str = r"
    CREATE TABLE IF NOT EXISTS price_points (
        asset_id TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        price NUMERIC NOT NULL,
        volume NUMERIC NOT NULL,
        market_cap NUMERIC,
        PRIMARY KEY (asset_id, timestamp)
    )
";

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the configured `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if no URL is configured or the connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .context("No database URL configured")?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Creates the snapshot and price tables if they are missing.
    ///
    /// # Errors
    /// Returns an error if a DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for ddl in [CREATE_SNAPSHOTS, CREATE_PRICE_POINTS] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .context("Failed to create table")?;
        }
        tracing::debug!("Database schema ready");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
