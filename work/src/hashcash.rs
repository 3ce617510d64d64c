//! Hashcash proof-of-work (multi-threaded CPU).
//!
//! A proof for difficulty `d` is a nonce whose work hash has at least
//! `ceil(log2(d))` leading zero bits, so the expected number of attempts is
//! roughly `d`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use powgate_types::ProofOfWork;

use crate::validator::{initial_hash, validate_work};
use crate::{ProofOfWorkService, WorkError};

/// Batch size per thread before checking the found/cancel flags.
const BATCH_SIZE: u64 = 4096;

/// Upper bound on leading zero bits a mint may be asked for.
pub const MAX_TARGET_BITS: u32 = 64;

const NOT_FOUND: u64 = u64::MAX;

/// Leading zero bits required for `difficulty`.
pub fn target_bits(difficulty: f64) -> Result<u32, WorkError> {
    if !difficulty.is_finite() || difficulty < 1.0 {
        return Err(WorkError::InvalidDifficulty(difficulty));
    }
    let bits = difficulty.log2().ceil();
    if bits > MAX_TARGET_BITS as f64 {
        return Err(WorkError::InvalidDifficulty(difficulty));
    }
    Ok(bits as u32)
}

/// Hashcash minting over a rayon thread pool.
///
/// By default the search runs on rayon's global pool. [`with_threads`]
/// gives minting its own pool so it never competes with other rayon users.
///
/// [`with_threads`]: HashCashProofOfWorkService::with_threads
#[derive(Clone, Default)]
pub struct HashCashProofOfWorkService {
    pool: Option<Arc<ThreadPool>>,
}

impl HashCashProofOfWorkService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, WorkError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pow-mint-{i}"))
            .build()
            .map_err(|e| WorkError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Splits the nonce space across the pool's threads. The first thread to
    /// find a valid nonce signals the others to stop.
    fn search(&self, initial: &[u8; 32], bits: u32, cancel: &AtomicBool) -> Result<u64, WorkError> {
        let run = || search_nonce(initial, bits, cancel);
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

fn search_nonce(initial: &[u8; 32], bits: u32, cancel: &AtomicBool) -> Result<u64, WorkError> {
    let found = AtomicU64::new(NOT_FOUND);
    let num_threads = rayon::current_num_threads().max(1);
    let stride = num_threads as u64;

    (0..num_threads).into_par_iter().for_each(|thread_id| {
        let mut nonce = thread_id as u64;
        loop {
            if found.load(Ordering::Relaxed) != NOT_FOUND || cancel.load(Ordering::Relaxed) {
                return;
            }
            for _ in 0..BATCH_SIZE {
                if validate_work(initial, nonce, bits) {
                    // Keep the smallest nonce if two threads succeed together.
                    found.fetch_min(nonce, Ordering::Relaxed);
                    return;
                }
                nonce = match nonce.checked_add(stride) {
                    Some(next) if next != NOT_FOUND => next,
                    _ => return,
                };
            }
        }
    });

    match found.load(Ordering::Relaxed) {
        NOT_FOUND if cancel.load(Ordering::Relaxed) => Err(WorkError::Cancelled),
        NOT_FOUND => Err(WorkError::Exhausted { bits }),
        nonce => Ok(nonce),
    }
}

impl ProofOfWorkService for HashCashProofOfWorkService {
    fn mint_cancellable(
        &self,
        payload: &[u8],
        challenge: &[u8],
        difficulty: f64,
        cancel: &AtomicBool,
    ) -> Result<ProofOfWork, WorkError> {
        let bits = target_bits(difficulty)?;
        let started = Instant::now();
        let initial = initial_hash(payload, challenge);
        let nonce = self.search(&initial, bits, cancel)?;
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::trace!(difficulty, bits, nonce, duration_ms, "hashcash minted");

        Ok(ProofOfWork {
            payload: payload.to_vec(),
            challenge: challenge.to_vec(),
            difficulty,
            solution: nonce.to_le_bytes().to_vec(),
            duration_ms,
        })
    }

    fn verify(&self, proof: &ProofOfWork) -> bool {
        let Ok(bits) = target_bits(proof.difficulty) else {
            return false;
        };
        let Ok(nonce_bytes) = <[u8; 8]>::try_from(proof.solution.as_slice()) else {
            return false;
        };
        let initial = initial_hash(&proof.payload, &proof.challenge);
        validate_work(&initial, u64::from_le_bytes(nonce_bytes), bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_bits_rounds_up() {
        assert_eq!(target_bits(1.0).unwrap(), 0);
        assert_eq!(target_bits(128.0).unwrap(), 7);
        assert_eq!(target_bits(129.0).unwrap(), 8);
        assert_eq!(target_bits(16384.0).unwrap(), 14);
        assert_eq!(target_bits(65536.0).unwrap(), 16);
    }

    #[test]
    fn target_bits_rejects_nonsense() {
        assert!(target_bits(0.0).is_err());
        assert!(target_bits(0.5).is_err());
        assert!(target_bits(-128.0).is_err());
        assert!(target_bits(f64::NAN).is_err());
        assert!(target_bits(f64::INFINITY).is_err());
        assert!(target_bits(2f64.powi(65)).is_err());
    }

    #[test]
    fn test_mint_and_verify() {
        let service = HashCashProofOfWorkService::new();
        let proof = service.mint(b"hello", &[0x42; 32], 1024.0).unwrap();

        assert_eq!(proof.payload, b"hello");
        assert_eq!(proof.challenge, vec![0x42; 32]);
        assert_eq!(proof.difficulty, 1024.0);
        assert_eq!(proof.solution.len(), 8);
        assert!(service.verify(&proof));
    }

    #[test]
    fn test_difficulty_one_accepts_any_nonce() {
        let service = HashCashProofOfWorkService::new();
        let proof = service.mint(b"", b"", 1.0).unwrap();
        assert!(service.verify(&proof));

        let mut other = proof;
        other.solution = 987_654u64.to_le_bytes().to_vec();
        assert!(service.verify(&other));
    }

    #[test]
    fn test_invalid_difficulty_fails_mint() {
        let service = HashCashProofOfWorkService::new();
        let err = service.mint(b"x", b"y", 0.0).unwrap_err();
        assert!(matches!(err, WorkError::InvalidDifficulty(d) if d == 0.0));
    }

    #[test]
    fn test_cancelled_before_start() {
        let service = HashCashProofOfWorkService::new();
        let cancel = AtomicBool::new(true);
        let result = service.mint_cancellable(b"x", b"y", 2f64.powi(40), &cancel);
        assert!(matches!(result, Err(WorkError::Cancelled)));
    }

    #[test]
    fn test_cancelled_mid_search() {
        let service = HashCashProofOfWorkService::with_threads(2).unwrap();
        let cancel = AtomicBool::new(false);

        let result = std::thread::scope(|scope| {
            let search = scope.spawn(|| service.mint_cancellable(b"x", b"y", 2f64.powi(60), &cancel));
            std::thread::sleep(std::time::Duration::from_millis(100));
            cancel.store(true, Ordering::Relaxed);
            search.join().unwrap()
        });
        assert!(matches!(result, Err(WorkError::Cancelled)));
    }

    #[test]
    fn test_dedicated_pool() {
        let service = HashCashProofOfWorkService::with_threads(2).unwrap();
        let proof = service.mint(b"pool", &[7; 32], 512.0).unwrap();
        assert!(service.verify(&proof));
    }

    #[test]
    fn tampered_proof_fails() {
        let service = HashCashProofOfWorkService::new();
        let proof = service.mint(b"original", &[1; 32], 65536.0).unwrap();

        let mut payload = proof.clone();
        payload.payload = b"0riginal".to_vec();
        assert!(!service.verify(&payload));

        let mut challenge = proof.clone();
        challenge.challenge[0] ^= 0xFF;
        assert!(!service.verify(&challenge));

        let mut harder = proof.clone();
        harder.difficulty = 2f64.powi(40);
        assert!(!service.verify(&harder));

        let mut short = proof;
        short.solution.pop();
        assert!(!service.verify(&short));
    }

    #[test]
    fn verify_rejects_invalid_difficulty_without_panicking() {
        let service = HashCashProofOfWorkService::new();
        let proof = ProofOfWork {
            payload: vec![],
            challenge: vec![],
            difficulty: f64::NAN,
            solution: vec![0; 8],
            duration_ms: 0,
        };
        assert!(!service.verify(&proof));
    }
}
