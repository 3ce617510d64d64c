//! The proof-of-work port consumed by authorization services.

use std::sync::atomic::AtomicBool;

use powgate_types::ProofOfWork;

use crate::WorkError;

/// Mints and verifies proofs for a `(payload, challenge, difficulty)` triple.
///
/// Minting is CPU-bound and may take up to about a second at the highest
/// difficulty. Callers on an async runtime must move it off I/O threads.
pub trait ProofOfWorkService: Send + Sync {
    /// Mint a proof, or fail. Never returns an empty proof.
    fn mint(
        &self,
        payload: &[u8],
        challenge: &[u8],
        difficulty: f64,
    ) -> Result<ProofOfWork, WorkError> {
        self.mint_cancellable(payload, challenge, difficulty, &AtomicBool::new(false))
    }

    /// Like [`mint`](Self::mint), but gives up with [`WorkError::Cancelled`]
    /// once `cancel` is set.
    fn mint_cancellable(
        &self,
        payload: &[u8],
        challenge: &[u8],
        difficulty: f64,
        cancel: &AtomicBool,
    ) -> Result<ProofOfWork, WorkError>;

    /// Check that `proof` solves its own payload, challenge and difficulty.
    fn verify(&self, proof: &ProofOfWork) -> bool;
}
