//! Per-connection replay protection.
//!
//! Each connection accepts a given message counter at most once. The guard is
//! shared by every receive path of a node and owned by whoever owns the
//! connection lifecycle, which must call [`ReplayGuard::release`] on teardown.

use std::collections::HashSet;

use dashmap::DashMap;

/// Message counters already consumed, keyed by connection id.
///
/// The outer map is sharded, so connections on different shards never contend.
/// Within one connection, [`try_consume`](Self::try_consume) holds the shard
/// lock across the membership test and the insert.
#[derive(Debug, Default)]
pub struct ReplayGuard {
    counters: DashMap<String, HashSet<u32>>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `counter` for `connection_id`.
    ///
    /// Returns `true` if the counter was fresh. Returns `false` if it was
    /// already recorded; of any number of concurrent calls with the same pair,
    /// exactly one returns `true`.
    pub fn try_consume(&self, connection_id: &str, counter: u32) -> bool {
        if let Some(mut seen) = self.counters.get_mut(connection_id) {
            return seen.insert(counter);
        }
        self.counters
            .entry(connection_id.to_owned())
            .or_default()
            .insert(counter)
    }

    /// Whether `counter` has been consumed on `connection_id`.
    pub fn contains(&self, connection_id: &str, counter: u32) -> bool {
        self.counters
            .get(connection_id)
            .is_some_and(|seen| seen.contains(&counter))
    }

    /// Forget everything recorded for a closed connection.
    ///
    /// Returns the number of counters released.
    pub fn release(&self, connection_id: &str) -> usize {
        self.counters
            .remove(connection_id)
            .map_or(0, |(_, seen)| seen.len())
    }

    /// Number of connections with at least one consumed counter.
    pub fn connection_count(&self) -> usize {
        self.counters.len()
    }

    /// Number of counters consumed on `connection_id`.
    pub fn counter_count(&self, connection_id: &str) -> usize {
        self.counters.get(connection_id).map_or(0, |seen| seen.len())
    }
}
