//! Network load: the back-pressure signal difficulty is derived from.

use serde::{Deserialize, Serialize};

/// A point-in-time estimate of how busy the local node is, nominally in `[0, 1]`.
///
/// The raw value is kept as observed. Consumers that need a bounded value
/// (the difficulty calculator) clamp it themselves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkLoad {
    value: f64,
}

impl NetworkLoad {
    /// An idle node.
    pub const IDLE: Self = Self { value: 0.0 };
    /// A saturated node.
    pub const SATURATED: Self = Self { value: 1.0 };

    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for NetworkLoad {
    fn default() -> Self {
        Self::IDLE
    }
}

/// The receiver's current load together with the one it held before.
///
/// Load updates reach peers asynchronously, so a sender may still be minting
/// against the previous value. `previous` stays `None` until the first
/// transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkLoadSnapshot {
    current: NetworkLoad,
    previous: Option<NetworkLoad>,
}

impl NetworkLoadSnapshot {
    pub fn new(current: NetworkLoad) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    /// Record a newly observed load. The old current value becomes `previous`.
    pub fn update(&mut self, load: NetworkLoad) {
        self.previous = Some(self.current);
        self.current = load;
    }

    pub fn current(&self) -> NetworkLoad {
        self.current
    }

    pub fn previous(&self) -> Option<NetworkLoad> {
        self.previous
    }
}
