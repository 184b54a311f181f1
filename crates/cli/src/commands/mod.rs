//! CLI commands for crypto market analytics.

pub mod context;
pub mod correlate;
pub mod history;
pub mod stream;
pub mod trend;

pub use context::GlobalArgs;
pub use correlate::{run_correlate, CorrelateArgs};
pub use history::{run_history, HistoryArgs};
pub use stream::{run_stream, StreamArgs};
pub use trend::{run_trend, TrendArgs};
