//! Structured logging initialisation via `tracing`.
//!
//! Nodes log either as plain text for a terminal ([`LogFormat::Human`]) or as
//! one JSON object per line for a log collector ([`LogFormat::Json`]).
//!
//! `RUST_LOG`, when set, overrides the configured filter level.

use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    /// Parse `"human"` / `"json"` (case-insensitive). Anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Build a subscriber for `format`, filtered at `level` (e.g. `"info"`,
/// `"debug,powgate_authorization=trace"`) unless `RUST_LOG` is set.
pub fn subscriber(format: LogFormat, level: &str) -> Box<dyn Subscriber + Send + Sync> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Human => {
            Box::new(registry.with(fmt::layer().with_target(true).with_thread_ids(true)))
        }
        LogFormat::Json => {
            Box::new(registry.with(fmt::layer().json().with_target(true).with_thread_ids(true)))
        }
    }
}

/// Install [`subscriber`] as the global default.
///
/// Fails if a global subscriber has already been set.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), TryInitError> {
    subscriber(format, level).try_init()
}

/// Initialize the tracing subscriber with sensible defaults.
///
/// Respects `RUST_LOG`; safe to call more than once (later calls are no-ops),
/// which makes it usable from tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
