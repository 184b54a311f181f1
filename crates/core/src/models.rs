//! Market data models.
//!
//! Both models are validated at construction and immutable afterwards: fields are
//! private and deserialization goes through the same checks as the constructors.
//! Prices and volumes use `rust_decimal::Decimal` for financial precision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;

/// Longest ticker accepted for a snapshot symbol.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Rejection raised when raw input would violate a model invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required text field was empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The symbol exceeded [`MAX_SYMBOL_LEN`] characters.
    #[error("symbol '{symbol}' is longer than {max} characters")]
    SymbolTooLong { symbol: String, max: usize },

    /// A price, volume or supply figure was below zero.
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    /// Ranks start at 1.
    #[error("rank must be a positive integer")]
    ZeroRank,
}

fn require_text(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::EmptyField(field));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: Decimal) -> Result<(), ModelError> {
    if value < Decimal::ZERO {
        return Err(ModelError::Negative { field, value });
    }
    Ok(())
}

fn require_optional_non_negative(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<(), ModelError> {
    value.map_or(Ok(()), |v| require_non_negative(field, v))
}

/// Supply and market-cap figures.
///
/// The source exchange does not publish these, so they stay `None` unless a
/// collaborator that knows them fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyInfo {
    pub market_cap: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    pub max_supply: Option<Decimal>,
}

impl SupplyInfo {
    fn validate(&self) -> Result<(), ModelError> {
        require_optional_non_negative("market_cap", self.market_cap)?;
        require_optional_non_negative("circulating_supply", self.circulating_supply)?;
        require_optional_non_negative("total_supply", self.total_supply)?;
        require_optional_non_negative("max_supply", self.max_supply)
    }
}

/// Unvalidated field set for an [`AssetSnapshot`].
///
/// Fill it in from raw input, then call [`AssetSnapshotDraft::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshotDraft {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub rank: u32,
    pub total_volume: Decimal,
    pub price_change_24h: Decimal,
    pub price_change_pct_24h: Decimal,
    pub category: Category,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub supply: SupplyInfo,
}

impl AssetSnapshotDraft {
    /// Validates the draft and produces an immutable snapshot.
    ///
    /// The symbol is trimmed and upper-cased.
    ///
    /// # Errors
    /// Returns [`ModelError`] if a text field is empty, the symbol is too long,
    /// a price/volume/supply figure is negative, or the rank is zero.
    pub fn build(self) -> Result<AssetSnapshot, ModelError> {
        require_text("id", &self.id)?;
        require_text("symbol", &self.symbol)?;
        require_text("name", &self.name)?;

        let symbol = self.symbol.trim().to_uppercase();
        if symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(ModelError::SymbolTooLong {
                symbol,
                max: MAX_SYMBOL_LEN,
            });
        }

        require_non_negative("current_price", self.current_price)?;
        require_non_negative("total_volume", self.total_volume)?;
        if self.rank == 0 {
            return Err(ModelError::ZeroRank);
        }
        self.supply.validate()?;

        Ok(AssetSnapshot {
            id: self.id,
            symbol,
            name: self.name,
            current_price: self.current_price,
            rank: self.rank,
            total_volume: self.total_volume,
            price_change_24h: self.price_change_24h,
            price_change_pct_24h: self.price_change_pct_24h,
            category: self.category,
            observed_at: self.observed_at,
            supply: self.supply,
        })
    }
}

/// One asset at one observation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssetSnapshotDraft")]
pub struct AssetSnapshot {
    id: String,
    symbol: String,
    name: String,
    current_price: Decimal,
    rank: u32,
    total_volume: Decimal,
    price_change_24h: Decimal,
    price_change_pct_24h: Decimal,
    category: Category,
    observed_at: DateTime<Utc>,
    supply: SupplyInfo,
}

impl TryFrom<AssetSnapshotDraft> for AssetSnapshot {
    type Error = ModelError;

    fn try_from(draft: AssetSnapshotDraft) -> Result<Self, Self::Error> {
        draft.build()
    }
}

impl AssetSnapshot {
    /// Exchange-native identifier (e.g. "BTCUSDT").
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Uppercase ticker (e.g. "BTC").
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn current_price(&self) -> Decimal {
        self.current_price
    }

    /// Dense rank by descending 24h quote volume within one fetch.
    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// 24h traded volume in the quote currency.
    #[must_use]
    pub fn total_volume(&self) -> Decimal {
        self.total_volume
    }

    #[must_use]
    pub fn price_change_24h(&self) -> Decimal {
        self.price_change_24h
    }

    #[must_use]
    pub fn price_change_pct_24h(&self) -> Decimal {
        self.price_change_pct_24h
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyInfo {
        &self.supply
    }

    /// Returns the editable field set, e.g. to re-rank or re-validate.
    #[must_use]
    pub fn into_draft(self) -> AssetSnapshotDraft {
        AssetSnapshotDraft {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            current_price: self.current_price,
            rank: self.rank,
            total_volume: self.total_volume,
            price_change_24h: self.price_change_24h,
            price_change_pct_24h: self.price_change_pct_24h,
            category: self.category,
            observed_at: self.observed_at,
            supply: self.supply,
        }
    }
}

/// Unvalidated field set for a [`PricePoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePointDraft {
    pub asset_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub market_cap: Option<Decimal>,
}

impl TryFrom<PricePointDraft> for PricePoint {
    type Error = ModelError;

    fn try_from(draft: PricePointDraft) -> Result<Self, Self::Error> {
        let point = PricePoint::new(draft.asset_id, draft.timestamp, draft.price, draft.volume)?;
        match draft.market_cap {
            Some(cap) => point.with_market_cap(cap),
            None => Ok(point),
        }
    }
}

/// One asset's price and volume at one historical instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PricePointDraft")]
pub struct PricePoint {
    asset_id: String,
    timestamp: DateTime<Utc>,
    price: Decimal,
    volume: Decimal,
    market_cap: Option<Decimal>,
}

impl PricePoint {
    /// Creates a validated price point with unknown market cap.
    ///
    /// # Errors
    /// Returns [`ModelError`] if `asset_id` is empty or `price`/`volume` is negative.
    pub fn new(
        asset_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        price: Decimal,
        volume: Decimal,
    ) -> Result<Self, ModelError> {
        let asset_id = asset_id.into();
        require_text("asset_id", &asset_id)?;
        require_non_negative("price", price)?;
        require_non_negative("volume", volume)?;

        Ok(Self {
            asset_id,
            timestamp,
            price,
            volume,
            market_cap: None,
        })
    }

    /// Attaches a known market cap.
    ///
    /// # Errors
    /// Returns [`ModelError::Negative`] if `market_cap` is below zero.
    pub fn with_market_cap(mut self, market_cap: Decimal) -> Result<Self, ModelError> {
        require_non_negative("market_cap", market_cap)?;
        self.market_cap = Some(market_cap);
        Ok(self)
    }

    #[must_use]
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Close price of the candle.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub fn volume(&self) -> Decimal {
        self.volume
    }

    #[must_use]
    pub fn market_cap(&self) -> Option<Decimal> {
        self.market_cap
    }
}
