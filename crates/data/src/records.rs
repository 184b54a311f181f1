//! Row types for the snapshot and price tables.
//!
//! Rows are converted into validated models on read, so a corrupted row surfaces
//! as a [`ModelError`] instead of entering analytics.

use chrono::{DateTime, Utc};
use crypto_analytics_core::{
    classify, AssetSnapshot, AssetSnapshotDraft, Category, ModelError, PricePoint, SupplyInfo,
};
use rust_decimal::Decimal;

/// Row of `asset_snapshots`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SnapshotRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub rank: i32,
    pub total_volume: Decimal,
    pub price_change_24h: Option<Decimal>,
    pub price_change_pct_24h: Option<Decimal>,
    pub category: String,
    pub market_cap: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    pub max_supply: Option<Decimal>,
    pub observed_at: DateTime<Utc>,
}

impl From<&AssetSnapshot> for SnapshotRecord {
    fn from(snapshot: &AssetSnapshot) -> Self {
        let supply = snapshot.supply();
        Self {
            id: snapshot.id().to_string(),
            symbol: snapshot.symbol().to_string(),
            name: snapshot.name().to_string(),
            current_price: snapshot.current_price(),
            rank: i32::try_from(snapshot.rank()).unwrap_or(i32::MAX),
            total_volume: snapshot.total_volume(),
            price_change_24h: Some(snapshot.price_change_24h()),
            price_change_pct_24h: Some(snapshot.price_change_pct_24h()),
            category: snapshot.category().as_str().to_string(),
            market_cap: supply.market_cap,
            circulating_supply: supply.circulating_supply,
            total_supply: supply.total_supply,
            max_supply: supply.max_supply,
            observed_at: snapshot.observed_at(),
        }
    }
}

impl TryFrom<SnapshotRecord> for AssetSnapshot {
    type Error = ModelError;

    /// Missing change figures read as zero. An unrecognised category label is
    /// re-derived from the symbol.
    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        let category = record
            .category
            .parse::<Category>()
            .unwrap_or_else(|_| classify(&record.symbol));

        AssetSnapshotDraft {
            id: record.id,
            symbol: record.symbol,
            name: record.name,
            current_price: record.current_price,
            rank: u32::try_from(record.rank).unwrap_or(0),
            total_volume: record.total_volume,
            price_change_24h: record.price_change_24h.unwrap_or(Decimal::ZERO),
            price_change_pct_24h: record.price_change_pct_24h.unwrap_or(Decimal::ZERO),
            category,
            observed_at: record.observed_at,
            supply: SupplyInfo {
                market_cap: record.market_cap,
                circulating_supply: record.circulating_supply,
                total_supply: record.total_supply,
                max_supply: record.max_supply,
            },
        }
        .build()
    }
}

/// Row of `price_points`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PricePointRecord {
    pub asset_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
    pub market_cap: Option<Decimal>,
}

impl From<&PricePoint> for PricePointRecord {
    fn from(point: &PricePoint) -> Self {
        Self {
            asset_id: point.asset_id().to_string(),
            timestamp: point.timestamp(),
            price: point.price(),
            volume: point.volume(),
            market_cap: point.market_cap(),
        }
    }
}

impl TryFrom<PricePointRecord> for PricePoint {
    type Error = ModelError;

    fn try_from(record: PricePointRecord) -> Result<Self, Self::Error> {
        let point = PricePoint::new(record.asset_id, record.timestamp, record.price, record.volume)?;
        match record.market_cap {
            Some(cap) => point.with_market_cap(cap),
            None => Ok(point),
        }
    }
}
