//! Daily price history for one asset.

use anyhow::{bail, Result};
use clap::Args;
use crypto_analytics_binance::pair_for;
use crypto_analytics_core::{MarketDataSource, PricePoint, SnapshotStore};
use crypto_analytics_engine::{resolve_history, HistorySource};

use super::context::{AppContext, GlobalArgs};
use crate::format::{format_price, format_volume};

/// Arguments for the history command.
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Ticker or pair (e.g., "BTC" or "BTCUSDT")
    pub symbol: String,

    /// Number of daily points (defaults to analytics.history_days)
    #[arg(short, long)]
    pub days: Option<usize>,

    /// Store the fetched points in the database (exchange candles only)
    #[arg(long, default_value = "false")]
    pub save: bool,
}

/// Runs the history command.
///
/// Falls back to stored points, then to a flat series at the current price,
/// when the exchange returns no candles.
///
/// # Errors
/// Returns an error if setup fails, `--save` is given without a database, or
/// storing fails.
pub async fn run_history(global: &GlobalArgs, args: HistoryArgs) -> Result<()> {
    let ctx = AppContext::init(global).await?;
    if args.save && ctx.store.is_none() {
        bail!("--save requires a database URL (--db-url or DATABASE_URL)");
    }

    let pair = pair_for(&args.symbol, &ctx.config.binance.quote_asset);
    let days = args.days.unwrap_or(ctx.config.analytics.history_days);

    // Unbounded so pairs outside the streaming top-N still get a fallback price.
    let current = ctx
        .source
        .fetch_snapshot(usize::MAX)
        .await
        .into_iter()
        .find(|s| s.id() == pair);

    let (origin, points) = resolve_history(
        ctx.source.as_ref(),
        ctx.store_ref(),
        &pair,
        days,
        current.as_ref(),
    )
    .await;

    if points.is_empty() {
        bail!("No history available for {}", pair);
    }

    if let Some(snapshot) = &current {
        println!(
            "{} (rank {}, {}): {}",
            snapshot.symbol(),
            snapshot.rank(),
            snapshot.category(),
            format_price(snapshot.current_price())
        );
    }
    println!("{} - Last {} days", pair, points.len());
    match origin {
        HistorySource::Stored => println!("  (exchange unavailable; showing stored points)"),
        HistorySource::Flat => println!("  (no candles available; flat at current price)"),
        HistorySource::Live | HistorySource::Missing => {}
    }
    for point in &points {
        println!(
            "  {}  {:>16}  {:>20}",
            point.timestamp().format("%Y-%m-%d"),
            format_price(point.price()),
            format_volume(point.volume())
        );
    }

    if let (true, Some(store)) = (args.save, ctx.store_ref()) {
        let inserted = save_points(store, origin, &points).await?;
        tracing::info!("Stored {} new points for {}", inserted, pair);
    }

    Ok(())
}

/// Appends exchange candles to `store`. Stored and synthesized series are
/// never written back.
async fn save_points(
    store: &dyn SnapshotStore,
    origin: HistorySource,
    points: &[PricePoint],
) -> Result<u64> {
    if origin != HistorySource::Live {
        tracing::warn!("Not saving {:?} history; only exchange candles are stored", origin);
        return Ok(0);
    }
    store.append_price_points(points).await
}
