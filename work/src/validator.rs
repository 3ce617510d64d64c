//! Hashcash validation.

use powgate_crypto::{blake2b_256_multi, leading_zero_bits};

/// Hash of the material a proof commits to. The payload is length-prefixed so
/// bytes cannot be shifted between payload and challenge.
pub fn initial_hash(payload: &[u8], challenge: &[u8]) -> [u8; 32] {
    let payload_len = (payload.len() as u64).to_le_bytes();
    blake2b_256_multi(&[&payload_len, payload, challenge])
}

/// Blake2b(initial_hash || nonce_le).
pub fn work_hash(initial_hash: &[u8; 32], nonce: u64) -> [u8; 32] {
    blake2b_256_multi(&[initial_hash, &nonce.to_le_bytes()])
}

/// Validate that `nonce` yields at least `target_bits` leading zero bits.
pub fn validate_work(initial_hash: &[u8; 32], nonce: u64, target_bits: u32) -> bool {
    leading_zero_bits(&work_hash(initial_hash, nonce)) >= target_bits
}
