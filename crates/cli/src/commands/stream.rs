//! Live streaming of ranked snapshots.
//!
//! Runs the ingestion loop until Ctrl+C (or `--duration-secs`), printing the
//! ranked table with session moves after every batch and a trend report every
//! `trend_every` batches.

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use crypto_analytics_core::{AssetSnapshot, MarketDataSource};
use crypto_analytics_engine::{analyze_trend, SessionTracker};
use crypto_analytics_ingest::{
    FanoutConsumer, IngestEvent, IngestionLoop, PersistingConsumer, SnapshotConsumer,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::context::{AppContext, GlobalArgs};
use crate::format::{render_table, render_trend};

/// Arguments for the stream command.
#[derive(Args, Debug, Clone)]
pub struct StreamArgs {
    /// Number of assets to track (defaults to ingest.limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Upsert every batch into the database
    #[arg(long, default_value = "false")]
    pub persist: bool,

    /// Print a trend report every N batches (0 disables; defaults to analytics.trend_every)
    #[arg(long)]
    pub trend_every: Option<u64>,

    /// Stop automatically after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Only log batch summaries instead of printing tables
    #[arg(long, default_value = "false")]
    pub quiet: bool,
}

/// Prints each batch and tracks session moves.
struct DashboardConsumer {
    session: Mutex<SessionTracker>,
    batches: AtomicU64,
    trend_every: u64,
    quiet: bool,
}

impl DashboardConsumer {
    fn new(trend_every: u64, quiet: bool) -> Self {
        Self {
            session: Mutex::new(SessionTracker::new()),
            batches: AtomicU64::new(0),
            trend_every,
            quiet,
        }
    }
}

#[async_trait]
impl SnapshotConsumer for DashboardConsumer {
    async fn consume(&self, snapshots: &[AssetSnapshot]) -> Result<()> {
        let batch = self.batches.fetch_add(1, Ordering::Relaxed) + 1;
        let changes = self.session.lock().observe(snapshots);

        if self.quiet {
            if let Some(top) = snapshots.first() {
                tracing::info!(
                    "Batch {}: {} assets, #1 {} at {}",
                    batch,
                    snapshots.len(),
                    top.symbol(),
                    top.current_price()
                );
            }
        } else {
            println!(
                "LIVE: {} | Tracking {} assets | Batch {}",
                chrono::Utc::now().format("%H:%M:%S"),
                snapshots.len(),
                batch
            );
            println!("{}", render_table(snapshots, &changes));
        }

        if self.trend_every > 0 && batch % self.trend_every == 0 {
            print!("{}", render_trend(&analyze_trend(snapshots)));
        }
        Ok(())
    }
}

async fn log_events(mut events: mpsc::Receiver<IngestEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            IngestEvent::Started { limit } => tracing::info!("Streaming top {} assets", limit),
            IngestEvent::Empty { cycle } => {
                tracing::warn!("Cycle {}: no data from source, retrying", cycle);
            }
            IngestEvent::ConsumerFailed { error } => {
                tracing::error!("Batch handling failed: {}", error);
            }
            IngestEvent::Published { .. } | IngestEvent::Stopped { .. } => {}
        }
    }
}

/// Runs the stream command.
///
/// # Errors
/// Returns an error if setup fails or `--persist` is given without a database.
pub async fn run_stream(global: &GlobalArgs, args: StreamArgs) -> Result<()> {
    let ctx = AppContext::init(global).await?;

    let mut ingest = ctx.config.ingest.clone();
    if let Some(limit) = args.limit {
        ingest.limit = limit;
    }
    let trend_every = args.trend_every.unwrap_or(ctx.config.analytics.trend_every);

    let mut consumer = FanoutConsumer::new().with(Arc::new(DashboardConsumer::new(
        trend_every,
        args.quiet,
    )));
    if args.persist {
        let Some(store) = ctx.store.clone() else {
            bail!("--persist requires a database URL (--db-url or DATABASE_URL)");
        };
        consumer = consumer.with(Arc::new(PersistingConsumer::new(store)));
    }

    let (events_tx, events_rx) = mpsc::channel(64);
    tokio::spawn(log_events(events_rx));

    let source: Arc<dyn MarketDataSource> = ctx.source.clone();
    let ingestion = IngestionLoop::new(source, &ingest).with_events(events_tx);
    ingestion.start(Arc::new(consumer));

    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                }
                () = tokio::time::sleep(Duration::from_secs(secs)) => {
                    tracing::info!("Stream duration elapsed, shutting down");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            tracing::info!("Received Ctrl+C, shutting down");
        }
    }

    if let Some(stats) = ingestion.stop().await {
        println!(
            "Stream stopped: {} cycles, {} batches, {} empty, {} consumer failures",
            stats.cycles, stats.published, stats.empty_cycles, stats.consumer_failures
        );
    }
    Ok(())
}
