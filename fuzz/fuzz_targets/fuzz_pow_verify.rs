#![no_main]

use libfuzzer_sys::fuzz_target;

use powgate_types::ProofOfWork;
use powgate_work::{HashCashProofOfWorkService, ProofOfWorkService};

fuzz_target!(|data: &[u8]| {
    // Verify arbitrary proofs: 8 bytes difficulty, 8 bytes solution, rest payload.
    if data.len() >= 16 {
        let difficulty = f64::from_le_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ]);
        let proof = ProofOfWork {
            payload: data[16..].to_vec(),
            challenge: data[..16].to_vec(),
            difficulty,
            solution: data[8..16].to_vec(),
            duration_ms: 0,
        };

        // This must never panic regardless of input
        let _ = HashCashProofOfWorkService::new().verify(&proof);
    }
});
