//! Challenge derivation.
//!
//! A challenge depends only on the receiver's address and the message counter,
//! never on message content. A proof minted for one peer is useless against
//! another, and a proof for one counter is useless for the next.

use powgate_crypto::sha256_multi;

/// Minimal big-endian two's-complement encoding of `counter`.
///
/// At least one byte. A leading `0x00` is kept when the first significant
/// byte has its high bit set, so the encoding never reads as negative.
pub fn counter_bytes(counter: u32) -> Vec<u8> {
    let bytes = counter.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let mut encoded = Vec::with_capacity(bytes.len() + 1);
    if bytes[first] & 0x80 != 0 {
        encoded.push(0);
    }
    encoded.extend_from_slice(&bytes[first..]);
    encoded
}

/// SHA-256 of `utf8(address) ++ counter_bytes(counter)`.
pub fn challenge_for(address: &str, counter: u32) -> Vec<u8> {
    let counter = counter_bytes(counter);
    sha256_multi(&[address.as_bytes(), counter.as_slice()]).to_vec()
}
