//! Pearson correlation between two assets' daily closes.

use anyhow::Result;
use clap::Args;
use crypto_analytics_binance::pair_for;
use crypto_analytics_engine::correlate_assets;

use super::context::{AppContext, GlobalArgs};

/// Arguments for the correlate command.
#[derive(Args, Debug, Clone)]
pub struct CorrelateArgs {
    /// First ticker or pair
    pub first: String,

    /// Second ticker or pair
    pub second: String,

    /// Daily points per asset (defaults to analytics.correlation_window)
    #[arg(short, long)]
    pub window: Option<usize>,
}

fn describe(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        a if a > 0.0 => "weak",
        _ => "none",
    }
}

/// Runs the correlate command.
///
/// # Errors
/// Returns an error if setup fails.
pub async fn run_correlate(global: &GlobalArgs, args: CorrelateArgs) -> Result<()> {
    let ctx = AppContext::init(global).await?;
    let quote = &ctx.config.binance.quote_asset;
    let first = pair_for(&args.first, quote);
    let second = pair_for(&args.second, quote);
    let window = args.window.unwrap_or(ctx.config.analytics.correlation_window);

    let r = correlate_assets(ctx.source.as_ref(), ctx.store_ref(), &first, &second, window).await;

    println!(
        "{} / {} correlation over {} days: {:+.4} ({})",
        first,
        second,
        window,
        r,
        describe(r)
    );
    Ok(())
}
