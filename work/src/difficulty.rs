//! Adaptive difficulty from message cost and receiver load.
//!
//! Difficulty scales linearly with both the declared cost of a message kind and
//! the receiver's current network load. Cheap messages to an idle node cost
//! [`MIN_DIFFICULTY`]; expensive messages to a saturated node cost
//! [`MAX_DIFFICULTY`].

use powgate_types::NetworkLoad;

/// 2^7. About 3 ms on an old CPU.
pub const MIN_DIFFICULTY: f64 = 128.0;
/// 2^16. About one second on an old CPU.
pub const MAX_DIFFICULTY: f64 = 65536.0;

const FACTOR_FLOOR: f64 = 0.01;
const FACTOR_CEILING: f64 = 1.0;

/// Maps `(cost factor, load)` to a bounded target difficulty.
///
/// Sender and receiver must use the same bounds, or verification will disagree
/// with minting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyCalculator {
    min_difficulty: f64,
    max_difficulty: f64,
}

impl DifficultyCalculator {
    pub fn new(min_difficulty: f64, max_difficulty: f64) -> Self {
        Self {
            min_difficulty,
            max_difficulty,
        }
    }

    /// `max * cost * load`, with cost and load each floored at 0.01 and capped
    /// at 1, and the result bounded to `[min, max]`.
    ///
    /// Zero, negative and NaN inputs are treated as the floor.
    pub fn calculate(&self, cost_factor: f64, load: &NetworkLoad) -> f64 {
        let cost_factor = bounded(FACTOR_FLOOR, FACTOR_CEILING, cost_factor);
        let load_value = bounded(FACTOR_FLOOR, FACTOR_CEILING, load.value());
        let difficulty = self.max_difficulty * cost_factor * load_value;
        bounded(self.min_difficulty, self.max_difficulty, difficulty)
    }

    pub fn min_difficulty(&self) -> f64 {
        self.min_difficulty
    }

    pub fn max_difficulty(&self) -> f64 {
        self.max_difficulty
    }
}

impl Default for DifficultyCalculator {
    fn default() -> Self {
        Self::new(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }
}

// `f64::clamp` panics on inverted bounds and passes NaN through; this does neither.
fn bounded(lower: f64, upper: f64, value: f64) -> f64 {
    value.max(lower).min(upper)
}
