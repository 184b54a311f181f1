//! Price history for charts and on-demand correlation.

use chrono::{DateTime, Duration, Utc};
use crypto_analytics_core::{AssetSnapshot, MarketDataSource, PricePoint, SnapshotStore};
use rust_decimal::Decimal;

/// Where a resolved series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    /// Candles fetched from the exchange.
    Live,
    /// Points previously written to the store.
    Stored,
    /// Synthesized at the snapshot's current price. Never persist these.
    Flat,
    /// Nothing was available.
    Missing,
}

/// Resolves up to `days` daily points for `asset_id`, oldest first.
///
/// Tries the live source, then the store's most recent points, then (when a
/// `fallback` snapshot is given) a flat series at the snapshot's current
/// price. Store errors are logged and treated as an empty result.
pub async fn resolve_history(
    source: &dyn MarketDataSource,
    store: Option<&dyn SnapshotStore>,
    asset_id: &str,
    days: usize,
    fallback: Option<&AssetSnapshot>,
) -> (HistorySource, Vec<PricePoint>) {
    if days == 0 {
        return (HistorySource::Missing, Vec::new());
    }

    let live = source.fetch_historical(asset_id, days).await;
    if !live.is_empty() {
        return (HistorySource::Live, live);
    }

    if let Some(store) = store {
        match store.recent_points(asset_id, days).await {
            Ok(points) if !points.is_empty() => {
                tracing::debug!("Using {} stored points for {}", points.len(), asset_id);
                return (HistorySource::Stored, points);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Stored history for {} unavailable: {:#}", asset_id, e),
        }
    }

    match fallback {
        Some(snapshot) => {
            tracing::debug!("No history for {}; using flat series", asset_id);
            (HistorySource::Flat, flat_series(snapshot, days, Utc::now()))
        }
        None => (HistorySource::Missing, Vec::new()),
    }
}

/// `days` daily points ending at `end`, all at the snapshot's current price.
#[must_use]
pub fn flat_series(snapshot: &AssetSnapshot, days: usize, end: DateTime<Utc>) -> Vec<PricePoint> {
    (0..days)
        .rev()
        .filter_map(|back| {
            let offset = Duration::days(i64::try_from(back).ok()?);
            PricePoint::new(
                snapshot.id(),
                end - offset,
                snapshot.current_price(),
                Decimal::ZERO,
            )
            .ok()
        })
        .collect()
}
