//! Snapshot ingestion: a cancellable poll loop and the consumers it feeds.

pub mod consumer;
pub mod events;
pub mod ingestion;

pub use consumer::{
    is_storable_id, FanoutConsumer, FnConsumer, PersistingConsumer, SnapshotConsumer,
};
pub use events::{IngestEvent, IngestStats};
pub use ingestion::{IngestionLoop, LoopState};
