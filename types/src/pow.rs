//! Proof-of-work record carried inside an authorization token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A minted proof-of-work. Immutable once produced by a proof-of-work service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofOfWork {
    /// Exact serialized message the proof authorizes.
    pub payload: Vec<u8>,
    /// Binds the proof to a (receiver address, message counter) pair.
    pub challenge: Vec<u8>,
    /// Difficulty the proof was minted against.
    pub difficulty: f64,
    /// Scheme-specific solution (for hashcash: the little-endian nonce).
    pub solution: Vec<u8>,
    /// Wall time spent minting, in milliseconds. Informational only.
    pub duration_ms: u64,
}

impl fmt::Debug for ProofOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofOfWork")
            .field("payload_len", &self.payload.len())
            .field("challenge", &hex::encode(&self.challenge))
            .field("difficulty", &self.difficulty)
            .field("solution", &hex::encode(&self.solution))
            .field("duration_ms", &self.duration_ms)
            .finish()
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
