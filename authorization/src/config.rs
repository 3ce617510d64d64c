//! Authorization configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use powgate_work::{DifficultyCalculator, MAX_DIFFICULTY, MIN_DIFFICULTY};

use crate::AuthorizationError;

/// Difficulty grace band, in absolute difficulty units.
pub const DIFFICULTY_TOLERANCE: f64 = 50_000.0;

/// Policy constants for token minting and verification.
///
/// Both ends of a connection must agree on the difficulty bounds, otherwise
/// honestly minted tokens are adjudicated against a different expectation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Lower bound for required difficulty.
    #[serde(default = "default_min_difficulty")]
    pub min_difficulty: f64,

    /// Upper bound for required difficulty.
    #[serde(default = "default_max_difficulty")]
    pub max_difficulty: f64,

    /// How far below the expected difficulty a proof may fall and still pass.
    #[serde(default = "default_difficulty_tolerance")]
    pub difficulty_tolerance: f64,

    /// Extra diagnostics on over-paying proofs. Never changes a verdict.
    #[serde(default)]
    pub dev_mode: bool,

    /// Size of the dedicated mint thread pool. `0` uses rayon's global pool.
    #[serde(default)]
    pub mint_threads: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_difficulty() -> f64 {
    MIN_DIFFICULTY
}

fn default_max_difficulty() -> f64 {
    MAX_DIFFICULTY
}

fn default_difficulty_tolerance() -> f64 {
    DIFFICULTY_TOLERANCE
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AuthorizationConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AuthorizationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthorizationError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AuthorizationError> {
        let config: Self =
            toml::from_str(s).map_err(|e| AuthorizationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, AuthorizationError> {
        toml::to_string_pretty(self).map_err(|e| AuthorizationError::Config(e.to_string()))
    }

    /// Check that the difficulty bounds and tolerance are usable.
    pub fn validate(&self) -> Result<(), AuthorizationError> {
        let all_finite = [
            self.min_difficulty,
            self.max_difficulty,
            self.difficulty_tolerance,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(AuthorizationError::Config(
                "difficulty settings must be finite".to_string(),
            ));
        }
        if self.min_difficulty < 1.0 {
            return Err(AuthorizationError::Config(format!(
                "min_difficulty {} must be at least 1",
                self.min_difficulty
            )));
        }
        if self.min_difficulty > self.max_difficulty {
            return Err(AuthorizationError::Config(format!(
                "min_difficulty {} exceeds max_difficulty {}",
                self.min_difficulty, self.max_difficulty
            )));
        }
        if self.difficulty_tolerance < 0.0 {
            return Err(AuthorizationError::Config(format!(
                "difficulty_tolerance {} must not be negative",
                self.difficulty_tolerance
            )));
        }
        Ok(())
    }

    pub fn calculator(&self) -> DifficultyCalculator {
        DifficultyCalculator::new(self.min_difficulty, self.max_difficulty)
    }
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            min_difficulty: default_min_difficulty(),
            max_difficulty: default_max_difficulty(),
            difficulty_tolerance: default_difficulty_tolerance(),
            dev_mode: false,
            mint_threads: 0,
        }
    }
}
