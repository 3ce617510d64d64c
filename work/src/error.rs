use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("invalid proof-of-work difficulty {0}")]
    InvalidDifficulty(f64),

    #[error("nonce space exhausted searching for {bits} leading zero bits")]
    Exhausted { bits: u32 },

    #[error("work generation cancelled")]
    Cancelled,

    #[error("failed to build mint thread pool: {0}")]
    ThreadPool(String),
}
