//! Database repositories for snapshots and price history.

pub mod price_point_repo;
pub mod snapshot_repo;

pub use price_point_repo::PricePointRepository;
pub use snapshot_repo::SnapshotRepository;

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub snapshots: SnapshotRepository,
    pub price_points: PricePointRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            snapshots: SnapshotRepository::new(pool.clone()),
            price_points: PricePointRepository::new(pool),
        }
    }
}
