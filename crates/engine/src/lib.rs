//! Analytics over market snapshots and price series.

pub mod correlation;
pub mod history;
pub mod session;
pub mod trend;

pub use correlation::{correlate, correlate_assets, correlate_series, DEFAULT_WINDOW};
pub use history::{flat_series, resolve_history, HistorySource};
pub use session::{Direction, SessionChange, SessionTracker};
pub use trend::{analyze_trend, analyze_trend_at, TrendEntry, TrendReport, TOP_MOVERS};
