//! Shared utilities: tracing setup and lock-free counters.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, init_tracing, subscriber, LogFormat};
pub use stats::StatsCounter;
