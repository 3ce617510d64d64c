use powgate_work::WorkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The message must not be sent without a token.
    #[error("minting failed: {0}")]
    MintingFailed(#[source] WorkError),

    #[error("minting cancelled")]
    Cancelled,

    #[error("mint task failed: {0}")]
    MintTask(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<WorkError> for AuthorizationError {
    fn from(err: WorkError) -> Self {
        match err {
            WorkError::Cancelled => Self::Cancelled,
            other => Self::MintingFailed(other),
        }
    }
}

/// Why an incoming message was not authorized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("message counter {counter} was already used on this connection")]
    Replay { counter: u32 },

    #[error("message payload does not match proof-of-work payload")]
    PayloadMismatch,

    #[error("challenge does not match local address and message counter")]
    ChallengeMismatch,

    #[error("difficulty {provided} is below expected {expected} beyond tolerance")]
    InsufficientDifficulty { expected: f64, provided: f64 },

    #[error("proof-of-work does not verify")]
    InvalidProof,
}

impl Rejection {
    /// Duplicate delivery or a replay attack, as opposed to a malformed token.
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replay { .. })
    }

    /// Stable name, used as a statistics key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Replay { .. } => "rejected_replay",
            Self::PayloadMismatch => "rejected_payload",
            Self::ChallengeMismatch => "rejected_challenge",
            Self::InsufficientDifficulty { .. } => "rejected_difficulty",
            Self::InvalidProof => "rejected_proof",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_work_maps_to_cancelled() {
        assert!(matches!(
            AuthorizationError::from(WorkError::Cancelled),
            AuthorizationError::Cancelled
        ));
        assert!(matches!(
            AuthorizationError::from(WorkError::InvalidDifficulty(0.0)),
            AuthorizationError::MintingFailed(WorkError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn only_replay_is_replay() {
        assert!(Rejection::Replay { counter: 1 }.is_replay());
        assert!(!Rejection::PayloadMismatch.is_replay());
        assert!(!Rejection::InvalidProof.is_replay());
    }
}
