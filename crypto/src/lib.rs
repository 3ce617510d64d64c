//! Digest primitives for proof-of-work authorization.
//!
//! - **SHA-256** for challenge derivation (binds a proof to a receiver and counter)
//! - **Blake2b-256** for the hashcash search itself

pub mod hash;

pub use hash::{blake2b_256, blake2b_256_multi, leading_zero_bits, sha256, sha256_multi};
