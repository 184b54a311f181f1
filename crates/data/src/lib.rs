//! Storage for market snapshots and price history.
//!
//! This crate provides:
//! - [`MemoryStore`], an in-process store for tests and offline runs
//! - [`PgSnapshotStore`] over `PostgreSQL` via typed repositories
//! - Row types that convert into validated models

pub mod database;
pub mod memory_store;
pub mod pg_store;
pub mod records;
pub mod repositories;

pub use database::DatabaseClient;
pub use memory_store::MemoryStore;
pub use pg_store::PgSnapshotStore;
pub use records::{PricePointRecord, SnapshotRecord};
pub use repositories::{PricePointRepository, Repositories, SnapshotRepository};
