//! Status events and statistics for the ingestion loop.

use chrono::{DateTime, Utc};

/// Events emitted by the ingestion loop for monitoring.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    /// Poll task started
    Started { limit: usize },
    /// A non-empty batch was handed to the consumer
    Published { cycle: u64, assets: usize },
    /// The source returned nothing this cycle
    Empty { cycle: u64 },
    /// The consumer rejected a batch
    ConsumerFailed { error: String },
    /// Poll task exited after a stop request
    Stopped { cycles: u64, published: u64 },
}

/// Statistics for one run of the ingestion loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    /// Fetch cycles started
    pub cycles: u64,
    /// Batches handed to the consumer
    pub published: u64,
    /// Cycles where the source returned nothing
    pub empty_cycles: u64,
    /// Batches the consumer reported as failed
    pub consumer_failures: u64,
    /// Time of last successful hand-off
    pub last_published_at: Option<DateTime<Utc>>,
}

impl IngestStats {
    pub fn cycle_started(&mut self) {
        self.cycles += 1;
    }

    pub fn batch_published(&mut self) {
        self.published += 1;
        self.last_published_at = Some(Utc::now());
    }

    pub fn cycle_empty(&mut self) {
        self.empty_cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = IngestStats::default();

        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.published, 0);
        assert_eq!(stats.empty_cycles, 0);
        assert_eq!(stats.consumer_failures, 0);
        assert!(stats.last_published_at.is_none());
    }

    #[test]
    fn test_stats_counters() {
        let mut stats = IngestStats::default();

        stats.cycle_started();
        stats.batch_published();
        stats.cycle_started();
        stats.cycle_empty();

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.empty_cycles, 1);
        assert!(stats.last_published_at.is_some());
    }
}
