//! Difficulty adjudication against fluctuating load.
//!
//! Load updates reach peers asynchronously, so the receiver's load may have
//! moved between mint and verify. A proof is accepted if it pays for the
//! current load, for the previous load, or falls short of either by no more
//! than the tolerance band. Anything else was minted against a load the
//! receiver never had.

use powgate_types::NetworkLoad;
use powgate_work::DifficultyCalculator;

use crate::AuthorizationConfig;

/// Outcome of comparing a provided difficulty with what the receiver expects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjudication {
    /// At or above the difficulty for the current load.
    MeetsCurrent,
    /// Below current, but at or above the difficulty for the previous load.
    MeetsPrevious,
    /// Below both, but within tolerance of the current expectation.
    WithinCurrentTolerance { missing: f64 },
    /// Below both, but within tolerance of the previous expectation.
    WithinPreviousTolerance { missing: f64 },
    /// Outside every band.
    Insufficient { expected: f64, provided: f64 },
}

impl Adjudication {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Insufficient { .. })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DifficultyAdjudicator {
    calculator: DifficultyCalculator,
    tolerance: f64,
    dev_mode: bool,
}

impl DifficultyAdjudicator {
    pub fn new(calculator: DifficultyCalculator, tolerance: f64, dev_mode: bool) -> Self {
        Self {
            calculator,
            tolerance,
            dev_mode,
        }
    }

    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self::new(
            config.calculator(),
            config.difficulty_tolerance,
            config.dev_mode,
        )
    }

    pub fn calculator(&self) -> &DifficultyCalculator {
        &self.calculator
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Judge `provided` for a message with `cost_factor`.
    ///
    /// A `provided` value outside `[min, max]` (or NaN) is insufficient
    /// outright. Otherwise the order is: current, previous, current within
    /// tolerance, previous within tolerance. Over-payment up to max is always
    /// accepted.
    pub fn adjudicate(
        &self,
        cost_factor: f64,
        provided: f64,
        current: &NetworkLoad,
        previous: Option<&NetworkLoad>,
    ) -> Adjudication {
        let expected = self.calculator.calculate(cost_factor, current);
        tracing::debug!(
            cost_factor,
            load = current.value(),
            expected,
            provided,
            "adjudicating difficulty against current load"
        );

        let (min, max) = (self.calculator.min_difficulty(), self.calculator.max_difficulty());
        if !(min..=max).contains(&provided) {
            tracing::warn!(
                provided,
                min_difficulty = min,
                max_difficulty = max,
                "provided difficulty outside accepted bounds"
            );
            return Adjudication::Insufficient { expected, provided };
        }

        if provided >= expected {
            if self.dev_mode && provided > expected {
                if let Some(previous) = previous {
                    self.check_overpayment(cost_factor, provided, expected, previous);
                }
            }
            return Adjudication::MeetsCurrent;
        }

        let missing = expected - provided;
        let Some(previous) = previous else {
            tracing::debug!("no previous network load available");
            if missing <= self.tolerance {
                self.log_tolerated("current", missing, expected, provided);
                return Adjudication::WithinCurrentTolerance { missing };
            }
            self.log_insufficient(missing, expected, provided);
            return Adjudication::Insufficient { expected, provided };
        };

        let expected_previous = self.calculator.calculate(cost_factor, previous);
        if provided >= expected_previous {
            tracing::debug!(expected_previous, provided, "difficulty matches previous network load");
            if provided > expected_previous {
                tracing::warn!(
                    expected_previous,
                    provided,
                    "unexpectedly high difficulty (valid, but may indicate a sender bug)"
                );
            }
            return Adjudication::MeetsPrevious;
        }

        if missing <= self.tolerance {
            self.log_tolerated("current", missing, expected, provided);
            return Adjudication::WithinCurrentTolerance { missing };
        }

        let missing_previous = expected_previous - provided;
        if missing_previous <= self.tolerance {
            self.log_tolerated("previous", missing_previous, expected_previous, provided);
            return Adjudication::WithinPreviousTolerance {
                missing: missing_previous,
            };
        }

        self.log_insufficient(missing, expected, provided);
        Adjudication::Insufficient { expected, provided }
    }

    // Dev-mode only: an over-paying proof is normally explained by the sender
    // having used the previous load.
    fn check_overpayment(&self, cost_factor: f64, provided: f64, expected: f64, previous: &NetworkLoad) {
        let expected_previous = self.calculator.calculate(cost_factor, previous);
        if provided != expected_previous {
            tracing::warn!(
                expected,
                expected_previous,
                provided,
                "unexpectedly high difficulty (valid, but may indicate a sender bug)"
            );
        }
    }

    fn log_tolerated(&self, snapshot: &'static str, missing: f64, expected: f64, provided: f64) {
        tracing::info!(
            snapshot,
            deviation_to_tolerance_pct = percent(missing, self.tolerance),
            deviation_to_expected_pct = percent(missing, expected),
            expected,
            provided,
            tolerance = self.tolerance,
            "difficulty below expectation but inside tolerated range"
        );
    }

    fn log_insufficient(&self, missing: f64, expected: f64, provided: f64) {
        tracing::warn!(
            deviation_to_tolerance_pct = percent(missing, self.tolerance),
            deviation_to_expected_pct = percent(missing, expected),
            expected,
            provided,
            tolerance = self.tolerance,
            "difficulty outside tolerated range"
        );
    }
}

impl Default for DifficultyAdjudicator {
    fn default() -> Self {
        Self::from_config(&AuthorizationConfig::default())
    }
}

/// `part / whole` as a percentage rounded to two decimals.
fn percent(part: f64, whole: f64) -> f64 {
    (part / whole * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use powgate_work::{MAX_DIFFICULTY, MIN_DIFFICULTY};

    /// Load at which `cost_factor = 1.0` yields exactly `difficulty`.
    fn load_for(difficulty: f64) -> NetworkLoad {
        NetworkLoad::new(difficulty / MAX_DIFFICULTY)
    }

    fn adjudicator(tolerance: f64) -> DifficultyAdjudicator {
        DifficultyAdjudicator::new(DifficultyCalculator::default(), tolerance, false)
    }

    #[test]
    fn exact_and_over_payment_meet_current() {
        let adj = adjudicator(50_000.0);
        let current = load_for(40_000.0);
        assert_eq!(adj.adjudicate(1.0, 40_000.0, &current, None), Adjudication::MeetsCurrent);
        assert_eq!(adj.adjudicate(1.0, 65_536.0, &current, None), Adjudication::MeetsCurrent);
    }

    #[test]
    fn tolerance_boundary_without_previous() {
        let adj = adjudicator(50_000.0);
        let current = NetworkLoad::SATURATED;
        // expected = 65536
        assert_eq!(
            adj.adjudicate(1.0, 15_536.0, &current, None),
            Adjudication::WithinCurrentTolerance { missing: 50_000.0 }
        );
        assert_eq!(
            adj.adjudicate(1.0, 15_535.0, &current, None),
            Adjudication::Insufficient {
                expected: 65_536.0,
                provided: 15_535.0
            }
        );
    }

    #[test]
    fn previous_snapshot_takes_precedence_over_current_tolerance() {
        let adj = adjudicator(1_000.0);
        let current = load_for(40_000.0);
        let previous = load_for(20_000.0);

        assert_eq!(
            adj.adjudicate(1.0, 25_000.0, &current, Some(&previous)),
            Adjudication::MeetsPrevious
        );
        // Also within tolerance of current, but previous is checked first.
        assert_eq!(
            adj.adjudicate(1.0, 39_500.0, &current, Some(&previous)),
            Adjudication::MeetsPrevious
        );
    }

    #[test]
    fn current_tolerance_before_previous_tolerance() {
        let adj = adjudicator(1_000.0);
        // Previous expectation above current: a load drop.
        let current = load_for(20_000.0);
        let previous = load_for(40_000.0);

        assert_eq!(
            adj.adjudicate(1.0, 19_500.0, &current, Some(&previous)),
            Adjudication::WithinCurrentTolerance { missing: 500.0 }
        );
    }

    #[test]
    fn previous_tolerance_is_last_resort() {
        let adj = adjudicator(1_000.0);
        let current = load_for(40_000.0);
        let previous = load_for(20_000.0);

        assert_eq!(
            adj.adjudicate(1.0, 19_500.0, &current, Some(&previous)),
            Adjudication::WithinPreviousTolerance { missing: 500.0 }
        );
        assert_eq!(
            adj.adjudicate(1.0, 18_999.0, &current, Some(&previous)),
            Adjudication::Insufficient {
                expected: 40_000.0,
                provided: 18_999.0
            }
        );
    }

    #[test]
    fn stale_load_within_default_tolerance() {
        let adj = DifficultyAdjudicator::default();
        // Minted at 0.5/0.5 = 16384, verified at load 0.9: expected 29491.2.
        let verdict = adj.adjudicate(0.5, 16_384.0, &NetworkLoad::new(0.9), None);
        assert!(matches!(verdict, Adjudication::WithinCurrentTolerance { .. }));
        assert!(verdict.is_valid());
    }

    #[test]
    fn dev_mode_never_changes_verdict() {
        let dev = DifficultyAdjudicator::new(DifficultyCalculator::default(), 1_000.0, true);
        let prod = adjudicator(1_000.0);
        let current = load_for(20_000.0);
        let previous = load_for(10_000.0);
        for provided in [5_000.0, 9_500.0, 10_000.0, 19_500.0, 30_000.0] {
            assert_eq!(
                dev.adjudicate(1.0, provided, &current, Some(&previous)),
                prod.adjudicate(1.0, provided, &current, Some(&previous)),
            );
        }
    }

    #[test]
    fn out_of_bounds_difficulty_is_insufficient() {
        let adj = DifficultyAdjudicator::default();
        // expected = 16384, so every value below is inside the tolerance band.
        let current = NetworkLoad::new(0.5);
        let previous = NetworkLoad::new(0.25);
        for provided in [1.0, 0.0, -5.0, MIN_DIFFICULTY - 1.0, f64::NAN] {
            let verdict = adj.adjudicate(0.5, provided, &current, Some(&previous));
            assert!(!verdict.is_valid(), "{provided} accepted");
            assert!(!adj.adjudicate(0.5, provided, &current, None).is_valid());
        }
        assert_eq!(
            adj.adjudicate(1.0, MAX_DIFFICULTY + 1.0, &NetworkLoad::SATURATED, None),
            Adjudication::Insufficient {
                expected: MAX_DIFFICULTY,
                provided: MAX_DIFFICULTY + 1.0
            }
        );
    }

    #[test]
    fn bounds_themselves_are_accepted() {
        let adj = DifficultyAdjudicator::default();
        assert_eq!(
            adj.adjudicate(0.01, MIN_DIFFICULTY, &NetworkLoad::IDLE, None),
            Adjudication::MeetsCurrent
        );
        assert_eq!(
            adj.adjudicate(0.01, MAX_DIFFICULTY, &NetworkLoad::IDLE, None),
            Adjudication::MeetsCurrent
        );
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent(1.0, 3.0), 33.33);
        assert_eq!(percent(50_000.0, 50_000.0), 100.0);
    }
}
