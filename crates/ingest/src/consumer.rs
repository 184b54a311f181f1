//! Receivers for the batches the ingestion loop publishes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crypto_analytics_core::{AssetSnapshot, SnapshotStore};
use std::sync::Arc;

/// Receives each non-empty, ranked snapshot batch.
///
/// Errors are logged and counted by the loop; they never stop it.
#[async_trait]
pub trait SnapshotConsumer: Send + Sync {
    async fn consume(&self, snapshots: &[AssetSnapshot]) -> Result<()>;
}

/// Adapts a synchronous closure.
pub struct FnConsumer<F>(F);

impl<F> FnConsumer<F>
where
    F: Fn(&[AssetSnapshot]) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> SnapshotConsumer for FnConsumer<F>
where
    F: Fn(&[AssetSnapshot]) -> Result<()> + Send + Sync,
{
    async fn consume(&self, snapshots: &[AssetSnapshot]) -> Result<()> {
        (self.0)(snapshots)
    }
}

/// Delivers every batch to several consumers in order.
#[derive(Default)]
pub struct FanoutConsumer {
    consumers: Vec<Arc<dyn SnapshotConsumer>>,
}

impl FanoutConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, consumer: Arc<dyn SnapshotConsumer>) -> Self {
        self.consumers.push(consumer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

#[async_trait]
impl SnapshotConsumer for FanoutConsumer {
    async fn consume(&self, snapshots: &[AssetSnapshot]) -> Result<()> {
        let mut failures = Vec::new();
        for consumer in &self.consumers {
            if let Err(e) = consumer.consume(snapshots).await {
                failures.push(format!("{e:#}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} of {} consumers failed: {}",
                failures.len(),
                self.consumers.len(),
                failures.join("; ")
            ))
        }
    }
}

/// Shortest and longest id accepted for storage.
pub const STORABLE_ID_LEN: std::ops::RangeInclusive<usize> = 5..=64;

/// Storage ids are ASCII alphanumeric, 5 to 64 characters after trimming.
#[must_use]
pub fn is_storable_id(id: &str) -> bool {
    let id = id.trim();
    STORABLE_ID_LEN.contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Upserts each snapshot into a [`SnapshotStore`] by id.
pub struct PersistingConsumer {
    store: Arc<dyn SnapshotStore>,
}

impl PersistingConsumer {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SnapshotConsumer for PersistingConsumer {
    async fn consume(&self, snapshots: &[AssetSnapshot]) -> Result<()> {
        let mut saved = 0usize;
        let mut failed = 0usize;

        for snapshot in snapshots {
            if !is_storable_id(snapshot.id()) {
                tracing::error!("Refusing to store snapshot with invalid id {:?}", snapshot.id());
                continue;
            }
            match self.store.upsert_snapshot(snapshot).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::error!("Failed to store {}: {:#}", snapshot.id(), e);
                    failed += 1;
                }
            }
        }

        tracing::debug!("Stored {} of {} snapshots", saved, snapshots.len());
        if failed > 0 {
            return Err(anyhow!("{failed} of {} snapshots failed to store", snapshots.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crypto_analytics_core::{classify, AssetSnapshotDraft, PricePoint, SupplyInfo};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(id: &str, symbol: &str, rank: u32) -> AssetSnapshot {
        AssetSnapshotDraft {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: dec!(1),
            rank,
            total_volume: dec!(1),
            price_change_24h: Decimal::ZERO,
            price_change_pct_24h: Decimal::ZERO,
            category: classify(symbol),
            observed_at: Utc.with_ymd_and_hms(2026, 1, 30, 12, 0, 0).unwrap(),
            supply: SupplyInfo::default(),
        }
        .build()
        .unwrap()
    }

    /// Records upserted ids; fails on ids listed in `reject`.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<String>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl SnapshotStore for RecordingStore {
        async fn upsert_snapshot(&self, snapshot: &AssetSnapshot) -> Result<()> {
            if self.reject.iter().any(|id| id == snapshot.id()) {
                return Err(anyhow!("constraint violation"));
            }
            self.saved.lock().push(snapshot.id().to_string());
            Ok(())
        }

        async fn append_price_points(&self, _points: &[PricePoint]) -> Result<u64> {
            Ok(0)
        }

        async fn recent_points(&self, _asset_id: &str, _limit: usize) -> Result<Vec<PricePoint>> {
            Ok(Vec::new())
        }

        async fn list_snapshots(&self, _limit: usize) -> Result<Vec<AssetSnapshot>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_is_storable_id() {
        assert!(is_storable_id("BTCUSDT"));
        assert!(is_storable_id("  ETHUSDT "));
        assert!(is_storable_id("A1B2C"));
        assert!(!is_storable_id("BTC"));
        assert!(!is_storable_id("BTC-USDT"));
        assert!(!is_storable_id("BTC USDT"));
        assert!(!is_storable_id(&"A".repeat(65)));
        assert!(is_storable_id(&"A".repeat(64)));
    }

    #[tokio::test]
    async fn test_fn_consumer_invokes_closure() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let consumer = FnConsumer::new(move |batch: &[AssetSnapshot]| {
            counter.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        });

        consumer
            .consume(&[snapshot("BTCUSDT", "BTC", 1), snapshot("ETHUSDT", "ETH", 2)])
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persisting_consumer_skips_invalid_ids() {
        let store = Arc::new(RecordingStore::default());
        let consumer = PersistingConsumer::new(store.clone());

        consumer
            .consume(&[
                snapshot("BTCUSDT", "BTC", 1),
                snapshot("X-1", "X", 2),
                snapshot("ETHUSDT", "ETH", 3),
            ])
            .await
            .unwrap();

        assert_eq!(*store.saved.lock(), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn test_persisting_consumer_continues_after_failure() {
        let store = Arc::new(RecordingStore {
            reject: vec!["BTCUSDT".to_string()],
            ..RecordingStore::default()
        });
        let consumer = PersistingConsumer::new(store.clone());

        let result = consumer
            .consume(&[snapshot("BTCUSDT", "BTC", 1), snapshot("ETHUSDT", "ETH", 2)])
            .await;

        assert!(result.is_err());
        assert_eq!(*store.saved.lock(), vec!["ETHUSDT"]);
    }

    #[tokio::test]
    async fn test_fanout_runs_all_consumers_despite_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&calls);
        let last = Arc::clone(&calls);

        let fanout = FanoutConsumer::new()
            .with(Arc::new(FnConsumer::new(move |_: &[AssetSnapshot]| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })))
            .with(Arc::new(FnConsumer::new(|_: &[AssetSnapshot]| {
                Err(anyhow!("table render failed"))
            })))
            .with(Arc::new(FnConsumer::new(move |_: &[AssetSnapshot]| {
                last.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })));

        assert_eq!(fanout.len(), 3);
        let err = fanout
            .consume(&[snapshot("BTCUSDT", "BTC", 1)])
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("table render failed"));
    }

    #[tokio::test]
    async fn test_empty_fanout_succeeds() {
        let fanout = FanoutConsumer::new();
        assert!(fanout.is_empty());
        assert!(fanout.consume(&[]).await.is_ok());
    }
}
