//! Async token minting off the I/O threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use powgate_types::{AuthorizationToken, AuthorizedMessage, NetworkLoad};
use powgate_work::{HashCashProofOfWorkService, ProofOfWorkService};

use crate::{AuthorizationError, HashCashTokenService};

/// Cancellation flag for in-flight mints, shared by all mints on one connection.
///
/// Set it when the connection closes. A mint that observes the flag, before or
/// after its search, produces no token.
#[derive(Clone, Debug, Default)]
pub struct MintCancellation(Arc<AtomicBool>);

impl MintCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs [`HashCashTokenService::mint`] on tokio's blocking pool.
pub struct TokenMinter<P = HashCashProofOfWorkService> {
    service: Arc<HashCashTokenService<P>>,
}

impl<P> Clone for TokenMinter<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<P: ProofOfWorkService + 'static> TokenMinter<P> {
    pub fn new(service: Arc<HashCashTokenService<P>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<HashCashTokenService<P>> {
        &self.service
    }

    /// Mint a token for `message` without blocking the calling task.
    pub async fn create_token(
        &self,
        message: &(dyn AuthorizedMessage + Sync),
        current_load: &NetworkLoad,
        peer_address: &str,
        message_counter: u32,
        cancellation: &MintCancellation,
    ) -> Result<AuthorizationToken, AuthorizationError> {
        if cancellation.is_cancelled() {
            return Err(AuthorizationError::Cancelled);
        }
        let request = self
            .service
            .prepare(message, current_load, peer_address, message_counter);

        let service = Arc::clone(&self.service);
        let flag = cancellation.clone();
        let token = tokio::task::spawn_blocking(move || service.mint(request, &flag.0))
            .await
            .map_err(|e| AuthorizationError::MintTask(e.to_string()))??;

        if cancellation.is_cancelled() {
            tracing::debug!(
                peer = %peer_address,
                counter = message_counter,
                "discarding token minted for a cancelled connection"
            );
            return Err(AuthorizationError::Cancelled);
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorizationConfig, AuthorizationTokenService, ReplayGuard};
    use powgate_types::ProofOfWork;
    use powgate_work::WorkError;

    struct Note(Vec<u8>);

    impl AuthorizedMessage for Note {
        fn cost_factor(&self) -> f64 {
            0.05
        }

        fn payload(&self) -> Vec<u8> {
            self.0.clone()
        }
    }

    fn minter() -> TokenMinter {
        let service = HashCashTokenService::from_config(
            &AuthorizationConfig::default(),
            Arc::new(ReplayGuard::new()),
        )
        .unwrap();
        TokenMinter::new(Arc::new(service))
    }

    #[tokio::test]
    async fn minted_token_verifies() {
        let minter = minter();
        let message = Note(b"async note".to_vec());
        let load = NetworkLoad::new(0.5);

        let token = minter
            .create_token(&message, &load, "alice:1", 9, &MintCancellation::new())
            .await
            .unwrap();
        assert!(minter
            .service()
            .is_authorized(&message, &token, &load, None, "conn-a", "alice:1"));
    }

    #[tokio::test]
    async fn cancelled_before_start_yields_no_token() {
        let minter = minter();
        let cancellation = MintCancellation::new();
        cancellation.cancel();

        let result = minter
            .create_token(&Note(vec![1]), &NetworkLoad::IDLE, "alice:1", 0, &cancellation)
            .await;
        assert!(matches!(result, Err(AuthorizationError::Cancelled)));
        assert_eq!(minter.service().stats().get("tokens_created"), 0);
    }

    /// Finishes its search just as the connection closes.
    struct RacingProofOfWork;

    impl ProofOfWorkService for RacingProofOfWork {
        fn mint_cancellable(
            &self,
            payload: &[u8],
            challenge: &[u8],
            difficulty: f64,
            cancel: &AtomicBool,
        ) -> Result<ProofOfWork, WorkError> {
            cancel.store(true, Ordering::Relaxed);
            Ok(ProofOfWork {
                payload: payload.to_vec(),
                challenge: challenge.to_vec(),
                difficulty,
                solution: vec![0; 8],
                duration_ms: 0,
            })
        }

        fn verify(&self, _proof: &ProofOfWork) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn cancelled_after_search_discards_token() {
        let service = HashCashTokenService::new(
            RacingProofOfWork,
            &AuthorizationConfig::default(),
            Arc::new(ReplayGuard::new()),
        );
        let minter = TokenMinter::new(Arc::new(service));
        let cancellation = MintCancellation::new();

        let result = minter
            .create_token(&Note(vec![2]), &NetworkLoad::IDLE, "alice:1", 4, &cancellation)
            .await;
        assert!(matches!(result, Err(AuthorizationError::Cancelled)));
        assert!(cancellation.is_cancelled());
        // The inner mint completed; only the minter threw the token away.
        assert_eq!(minter.service().stats().get("tokens_created"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_during_search_yields_no_token() {
        let minter = minter();
        let cancellation = MintCancellation::new();
        let canceller = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            canceller.cancel();
        });

        // Cost far above what any load can demand; only cancellation ends it.
        let service = Arc::clone(minter.service());
        let flag = cancellation.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut request = service.prepare(&Note(vec![3]), &NetworkLoad::IDLE, "alice:1", 5);
            request.difficulty = 2f64.powi(60);
            service.mint(request, &flag.0)
        })
        .await
        .unwrap();
        assert!(matches!(result, Err(AuthorizationError::Cancelled)));
        assert_eq!(minter.service().stats().get("tokens_created"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_mints_for_many_peers() {
        let minter = minter();
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let minter = minter.clone();
                tokio::spawn(async move {
                    let message = Note(vec![i as u8; 16]);
                    let peer = format!("peer-{i}:7000");
                    minter
                        .create_token(&message, &NetworkLoad::new(0.3), &peer, i, &MintCancellation::new())
                        .await
                })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.proof_of_work.payload.len(), 16);
        }
        assert_eq!(minter.service().stats().get("tokens_created"), 8);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let a = MintCancellation::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
