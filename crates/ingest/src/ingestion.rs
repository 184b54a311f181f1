//! Background polling of a [`MarketDataSource`].
//!
//! One poll task fetches snapshots on a fixed interval and hands each non-empty
//! batch to a separate consumer task through a channel of capacity 1. A slow
//! consumer therefore delays the next poll, but cancellation is awaited
//! alongside every fetch, hand-off and sleep, so `stop()` is never blocked by it.
//!
//! Retries are flat-interval and unlimited while running. There is no
//! exponential backoff and no failure cap.

use crate::consumer::SnapshotConsumer;
use crate::events::{IngestEvent, IngestStats};
use crypto_analytics_core::{AssetSnapshot, IngestConfig, MarketDataSource};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Observable lifecycle of an [`IngestionLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

struct RunningLoop {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<IngestStats>,
    consumer_failures: Arc<AtomicU64>,
}

/// Owns the poll/cancel lifecycle.
///
/// # Example
///
/// ```ignore
/// let ingestion = IngestionLoop::new(source, &config.ingest);
/// ingestion.start(Arc::new(PersistingConsumer::new(store)));
/// // ...
/// let stats = ingestion.stop().await;
/// ```
///
/// Dropping a running loop drops its cancel signal, which stops the poll task
/// at its next await point.
pub struct IngestionLoop {
    source: Arc<dyn MarketDataSource>,
    limit: usize,
    poll_interval: Duration,
    retry_interval: Duration,
    events: Option<mpsc::Sender<IngestEvent>>,
    running: Mutex<Option<RunningLoop>>,
}

impl IngestionLoop {
    pub fn new(source: Arc<dyn MarketDataSource>, config: &IngestConfig) -> Self {
        Self {
            source,
            limit: config.limit,
            poll_interval: config.poll_interval(),
            retry_interval: config.retry_interval(),
            events: None,
            running: Mutex::new(None),
        }
    }

    /// Sets a channel for status events. Delivery is best-effort: events are
    /// dropped when the channel is full.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::Sender<IngestEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        match self.running.lock().as_ref() {
            Some(running) if !running.handle.is_finished() => LoopState::Running,
            _ => LoopState::Idle,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Starts polling, delivering each non-empty batch to `consumer`.
    ///
    /// Returns `false` without spawning anything if the loop is already running.
    pub fn start(&self, consumer: Arc<dyn SnapshotConsumer>) -> bool {
        let mut slot = self.running.lock();
        if let Some(running) = slot.as_ref() {
            if !running.handle.is_finished() {
                tracing::debug!("Ingestion loop already running; start ignored");
                return false;
            }
        }

        let (cancel, cancel_rx) = watch::channel(false);
        let (batch_tx, batch_rx) = mpsc::channel(1);
        let consumer_failures = Arc::new(AtomicU64::new(0));

        tokio::spawn(consume_batches(
            consumer,
            batch_rx,
            Arc::clone(&consumer_failures),
            self.events.clone(),
        ));

        let task = PollTask {
            source: Arc::clone(&self.source),
            limit: self.limit,
            poll_interval: self.poll_interval,
            retry_interval: self.retry_interval,
            events: self.events.clone(),
        };
        let handle = tokio::spawn(task.run(batch_tx, cancel_rx));

        *slot = Some(RunningLoop {
            cancel,
            handle,
            consumer_failures,
        });
        true
    }

    /// Stops polling and waits for the poll task to exit.
    ///
    /// Returns the run's statistics, or `None` if the loop was not running.
    /// Batches already handed off are still delivered to the consumer.
    pub async fn stop(&self) -> Option<IngestStats> {
        let running = self.running.lock().take()?;
        // Err only if the task already exited and dropped its receiver.
        let _ = running.cancel.send(true);

        match running.handle.await {
            Ok(mut stats) => {
                stats.consumer_failures = running.consumer_failures.load(Ordering::Relaxed);
                tracing::info!(
                    "Ingestion stopped after {} cycles ({} published, {} empty)",
                    stats.cycles,
                    stats.published,
                    stats.empty_cycles
                );
                Some(stats)
            }
            Err(e) => {
                tracing::error!("Ingestion task failed: {}", e);
                None
            }
        }
    }
}

struct PollTask {
    source: Arc<dyn MarketDataSource>,
    limit: usize,
    poll_interval: Duration,
    retry_interval: Duration,
    events: Option<mpsc::Sender<IngestEvent>>,
}

impl PollTask {
    async fn run(
        self,
        batch_tx: mpsc::Sender<Vec<AssetSnapshot>>,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> IngestStats {
        let mut stats = IngestStats::default();
        let mut consumer_gone = false;

        tracing::info!(
            "Ingestion started (limit: {}, poll: {:?}, retry: {:?})",
            self.limit,
            self.poll_interval,
            self.retry_interval
        );
        emit(&self.events, IngestEvent::Started { limit: self.limit });

        loop {
            if *cancel_rx.borrow() {
                break;
            }
            stats.cycle_started();
            let cycle = stats.cycles;

            let snapshots = tokio::select! {
                biased;
                () = cancelled(&mut cancel_rx) => break,
                snapshots = self.source.fetch_snapshot(self.limit) => snapshots,
            };

            if snapshots.is_empty() {
                stats.cycle_empty();
                tracing::warn!(
                    "No market data in cycle {}; retrying in {:?}",
                    cycle,
                    self.retry_interval
                );
                emit(&self.events, IngestEvent::Empty { cycle });
                if sleep_or_cancel(self.retry_interval, &mut cancel_rx).await {
                    break;
                }
                continue;
            }

            let assets = snapshots.len();
            if !consumer_gone {
                tokio::select! {
                    biased;
                    () = cancelled(&mut cancel_rx) => break,
                    sent = batch_tx.send(snapshots) => {
                        if sent.is_ok() {
                            stats.batch_published();
                            tracing::debug!("Cycle {}: published {} assets", cycle, assets);
                            emit(&self.events, IngestEvent::Published { cycle, assets });
                        } else {
                            tracing::error!("Consumer task exited; batches are no longer delivered");
                            consumer_gone = true;
                        }
                    }
                }
            }

            if sleep_or_cancel(self.poll_interval, &mut cancel_rx).await {
                break;
            }
        }

        emit(
            &self.events,
            IngestEvent::Stopped {
                cycles: stats.cycles,
                published: stats.published,
            },
        );
        stats
    }
}

async fn consume_batches(
    consumer: Arc<dyn SnapshotConsumer>,
    mut batch_rx: mpsc::Receiver<Vec<AssetSnapshot>>,
    failures: Arc<AtomicU64>,
    events: Option<mpsc::Sender<IngestEvent>>,
) {
    while let Some(batch) = batch_rx.recv().await {
        // Each batch runs in its own task so a panicking consumer only loses that batch.
        let task_consumer = Arc::clone(&consumer);
        let outcome = tokio::spawn(async move { task_consumer.consume(&batch).await }).await;

        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => format!("{e:#}"),
            Err(e) => format!("consumer task aborted: {e}"),
        };
        failures.fetch_add(1, Ordering::Relaxed);
        tracing::error!("Snapshot consumer failed: {}", error);
        emit(&events, IngestEvent::ConsumerFailed { error });
    }
    tracing::debug!("Consumer task finished");
}

/// Resolves once a stop is requested or the loop handle is gone.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    let _ = cancel_rx.wait_for(|stop| *stop).await;
}

/// Sleeps for `duration`; returns `true` if cancelled first.
async fn sleep_or_cancel(duration: Duration, cancel_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        () = cancelled(cancel_rx) => true,
        () = tokio::time::sleep(duration) => false,
    }
}

fn emit(events: &Option<mpsc::Sender<IngestEvent>>, event: IngestEvent) {
    if let Some(tx) = events {
        if let Err(e) = tx.try_send(event) {
            tracing::trace!("Dropped ingestion event: {}", e);
        }
    }
}
