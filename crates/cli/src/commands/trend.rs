//! One-shot trend report.

use anyhow::{bail, Result};
use clap::Args;
use crypto_analytics_core::MarketDataSource;
use crypto_analytics_engine::analyze_trend;

use super::context::{AppContext, GlobalArgs};
use crate::format::{render_table, render_trend};

/// Arguments for the trend command.
#[derive(Args, Debug, Clone)]
pub struct TrendArgs {
    /// Number of assets to rank (defaults to ingest.limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Print the report as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Also print the ranked table
    #[arg(long, default_value = "false")]
    pub table: bool,
}

/// Runs the trend command.
///
/// # Errors
/// Returns an error if setup fails or the source returns no data.
pub async fn run_trend(global: &GlobalArgs, args: TrendArgs) -> Result<()> {
    let ctx = AppContext::init(global).await?;
    let limit = args.limit.unwrap_or(ctx.config.ingest.limit);

    let snapshots = ctx.source.fetch_snapshot(limit).await;
    if snapshots.is_empty() {
        bail!("No market data available from {}", ctx.config.binance.api_url);
    }

    let report = analyze_trend(&snapshots);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.table {
        println!("{}", render_table(&snapshots, &[]));
    }
    print!("{}", render_trend(&report));
    Ok(())
}
