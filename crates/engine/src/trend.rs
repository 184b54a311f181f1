//! Market trend report over one snapshot batch.

use chrono::{DateTime, Utc};
use crypto_analytics_core::AssetSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of assets listed on each side of the report.
pub const TOP_MOVERS: usize = 5;

/// One asset in the gainers or losers list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    pub symbol: String,
    pub price: Decimal,
    pub change_pct: Decimal,
}

impl From<&AssetSnapshot> for TrendEntry {
    fn from(snapshot: &AssetSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol().to_string(),
            price: snapshot.current_price(),
            change_pct: snapshot.price_change_pct_24h(),
        }
    }
}

/// Aggregate view of a snapshot batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub total_assets: usize,
    /// Sum of 24h quote volume across every input snapshot.
    pub total_volume: Decimal,
    /// Largest 24h percentage moves, best first.
    pub top_gainers: Vec<TrendEntry>,
    /// Smallest 24h percentage moves, worst first.
    pub top_losers: Vec<TrendEntry>,
    pub generated_at: DateTime<Utc>,
}

impl TrendReport {
    #[must_use]
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            total_assets: 0,
            total_volume: Decimal::ZERO,
            top_gainers: Vec::new(),
            top_losers: Vec::new(),
            generated_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_assets == 0
    }
}

/// Builds a trend report stamped with the current time.
#[must_use]
pub fn analyze_trend(snapshots: &[AssetSnapshot]) -> TrendReport {
    analyze_trend_at(snapshots, Utc::now())
}

/// Builds a trend report stamped with `generated_at`.
///
/// Gainers and losers come from stable sorts of a borrowed copy, so equal
/// moves keep their rank order. Volume overflow yields the empty report.
#[must_use]
pub fn analyze_trend_at(snapshots: &[AssetSnapshot], generated_at: DateTime<Utc>) -> TrendReport {
    if snapshots.is_empty() {
        return TrendReport::empty(generated_at);
    }

    let Some(total_volume) = snapshots
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.total_volume()))
    else {
        tracing::error!(
            "Total volume overflowed across {} snapshots; returning empty report",
            snapshots.len()
        );
        return TrendReport::empty(generated_at);
    };

    let mut ordered: Vec<&AssetSnapshot> = snapshots.iter().collect();

    ordered.sort_by(|a, b| b.price_change_pct_24h().cmp(&a.price_change_pct_24h()));
    let top_gainers = ordered
        .iter()
        .take(TOP_MOVERS)
        .map(|s| TrendEntry::from(*s))
        .collect();

    ordered.sort_by(|a, b| a.price_change_pct_24h().cmp(&b.price_change_pct_24h()));
    let top_losers = ordered
        .iter()
        .take(TOP_MOVERS)
        .map(|s| TrendEntry::from(*s))
        .collect();

    TrendReport {
        total_assets: snapshots.len(),
        total_volume,
        top_gainers,
        top_losers,
        generated_at,
    }
}
