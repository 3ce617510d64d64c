//! Hashcash proof-of-work that rate-limits peer messages.
//!
//! Each outbound message pays a small CPU cost, from a few milliseconds up to
//! about a second. [`DifficultyCalculator`] sets that cost from the message's
//! cost factor and the receiver's load.

pub mod difficulty;
pub mod error;
pub mod hashcash;
pub mod service;
pub mod validator;

pub use difficulty::{DifficultyCalculator, MAX_DIFFICULTY, MIN_DIFFICULTY};
pub use error::WorkError;
pub use hashcash::{target_bits, HashCashProofOfWorkService};
pub use service::ProofOfWorkService;
pub use validator::{initial_hash, validate_work, work_hash};
