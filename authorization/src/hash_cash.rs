//! Hashcash authorization tokens.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use powgate_types::{
    AuthorizationToken, AuthorizationTokenType, AuthorizedMessage, NetworkLoad, ProofOfWork,
};
use powgate_utils::StatsCounter;
use powgate_work::{DifficultyCalculator, HashCashProofOfWorkService, ProofOfWorkService};

use crate::{
    challenge_for, Adjudication, AuthorizationConfig, AuthorizationError, AuthorizationTokenService,
    DifficultyAdjudicator, Rejection, ReplayGuard,
};

const TOKENS_CREATED: &str = "tokens_created";
const TOKENS_ACCEPTED: &str = "tokens_accepted";

const STAT_NAMES: &[&str] = &[
    TOKENS_CREATED,
    TOKENS_ACCEPTED,
    "rejected_replay",
    "rejected_payload",
    "rejected_challenge",
    "rejected_difficulty",
    "rejected_proof",
];

/// Everything needed to mint, computed up front from a borrowed message so
/// the mint itself can run on another thread.
#[derive(Clone, Debug)]
pub struct MintRequest {
    pub kind: String,
    pub cost_factor: f64,
    pub load: f64,
    pub payload: Vec<u8>,
    pub challenge: Vec<u8>,
    pub difficulty: f64,
    pub message_counter: u32,
}

/// Hashcash-backed [`AuthorizationTokenService`].
///
/// The replay guard is injected so its lifetime follows the connection layer
/// rather than this service.
pub struct HashCashTokenService<P = HashCashProofOfWorkService> {
    proof_of_work: P,
    adjudicator: DifficultyAdjudicator,
    replay_guard: Arc<ReplayGuard>,
    /// Rejections per live connection, for disconnect decisions upstream.
    rejections: DashMap<String, u64>,
    stats: StatsCounter,
}

impl HashCashTokenService<HashCashProofOfWorkService> {
    /// Build with the bundled hashcash primitive, sized per `config.mint_threads`.
    pub fn from_config(
        config: &AuthorizationConfig,
        replay_guard: Arc<ReplayGuard>,
    ) -> Result<Self, AuthorizationError> {
        config.validate()?;
        let proof_of_work = if config.mint_threads == 0 {
            HashCashProofOfWorkService::new()
        } else {
            HashCashProofOfWorkService::with_threads(config.mint_threads)
                .map_err(|e| AuthorizationError::Config(e.to_string()))?
        };
        Ok(Self::new(proof_of_work, config, replay_guard))
    }
}

impl<P: ProofOfWorkService> HashCashTokenService<P> {
    pub fn new(
        proof_of_work: P,
        config: &AuthorizationConfig,
        replay_guard: Arc<ReplayGuard>,
    ) -> Self {
        Self {
            proof_of_work,
            adjudicator: DifficultyAdjudicator::from_config(config),
            replay_guard,
            rejections: DashMap::new(),
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn calculator(&self) -> &DifficultyCalculator {
        self.adjudicator.calculator()
    }

    pub fn replay_guard(&self) -> &Arc<ReplayGuard> {
        &self.replay_guard
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Rejections seen on a connection since it opened.
    pub fn rejection_count(&self, connection_id: &str) -> u64 {
        self.rejections.get(connection_id).map_or(0, |count| *count)
    }

    pub fn prepare(
        &self,
        message: &dyn AuthorizedMessage,
        current_load: &NetworkLoad,
        peer_address: &str,
        message_counter: u32,
    ) -> MintRequest {
        let cost_factor = message.cost_factor();
        MintRequest {
            kind: message.kind().to_owned(),
            cost_factor,
            load: current_load.value(),
            payload: message.payload(),
            challenge: challenge_for(peer_address, message_counter),
            difficulty: self.calculator().calculate(cost_factor, current_load),
            message_counter,
        }
    }

    /// Mint a prepared request. Blocks until a proof is found or `cancel` is set.
    pub fn mint(
        &self,
        request: MintRequest,
        cancel: &AtomicBool,
    ) -> Result<AuthorizationToken, AuthorizationError> {
        let started = Instant::now();
        let proof_of_work = self
            .proof_of_work
            .mint_cancellable(&request.payload, &request.challenge, request.difficulty, cancel)
            .inspect_err(|e| {
                tracing::warn!(
                    kind = %request.kind,
                    counter = request.message_counter,
                    error = %e,
                    "hashcash mint failed"
                );
            })?;

        tracing::info!(
            kind = %request.kind,
            took_ms = started.elapsed().as_millis() as u64,
            cost_factor = request.cost_factor,
            load = request.load,
            difficulty_log2 = (request.difficulty.log2() * 100.0).round() / 100.0,
            difficulty = request.difficulty,
            "created hashcash token"
        );
        self.stats.increment(TOKENS_CREATED);
        Ok(AuthorizationToken::new(
            AuthorizationTokenType::HashCash,
            proof_of_work,
            request.message_counter,
        ))
    }

    fn check(
        &self,
        message: &dyn AuthorizedMessage,
        token: &AuthorizationToken,
        current_load: &NetworkLoad,
        previous_load: Option<&NetworkLoad>,
        connection_id: &str,
        local_address: &str,
    ) -> Result<(), Rejection> {
        let counter = token.message_counter;
        if !self.replay_guard.try_consume(connection_id, counter) {
            return Err(Rejection::Replay { counter });
        }

        let proof: &ProofOfWork = &token.proof_of_work;
        let payload = message.payload();
        if payload != proof.payload {
            tracing::warn!(
                connection = %connection_id,
                payload = %hex::encode(&payload),
                proof_payload = %hex::encode(&proof.payload),
                payload_len = payload.len(),
                proof_payload_len = proof.payload.len(),
                "message payload not matching proof-of-work payload"
            );
            return Err(Rejection::PayloadMismatch);
        }

        if challenge_for(local_address, counter) != proof.challenge {
            tracing::warn!(
                connection = %connection_id,
                local_address = %local_address,
                counter,
                proof_challenge = %hex::encode(&proof.challenge),
                "proof-of-work challenge not matching local address and counter"
            );
            return Err(Rejection::ChallengeMismatch);
        }

        let verdict = self.adjudicator.adjudicate(
            message.cost_factor(),
            proof.difficulty,
            current_load,
            previous_load,
        );
        if let Adjudication::Insufficient { expected, provided } = verdict {
            return Err(Rejection::InsufficientDifficulty { expected, provided });
        }

        if !self.proof_of_work.verify(proof) {
            return Err(Rejection::InvalidProof);
        }
        Ok(())
    }
}

impl<P: ProofOfWorkService> AuthorizationTokenService for HashCashTokenService<P> {
    fn token_type(&self) -> AuthorizationTokenType {
        AuthorizationTokenType::HashCash
    }

    fn create_token(
        &self,
        message: &dyn AuthorizedMessage,
        current_load: &NetworkLoad,
        peer_address: &str,
        message_counter: u32,
    ) -> Result<AuthorizationToken, AuthorizationError> {
        let request = self.prepare(message, current_load, peer_address, message_counter);
        self.mint(request, &AtomicBool::new(false))
    }

    fn verify(
        &self,
        message: &dyn AuthorizedMessage,
        token: &AuthorizationToken,
        current_load: &NetworkLoad,
        previous_load: Option<&NetworkLoad>,
        connection_id: &str,
        local_address: &str,
    ) -> Result<(), Rejection> {
        let result = self.check(
            message,
            token,
            current_load,
            previous_load,
            connection_id,
            local_address,
        );
        match &result {
            Ok(()) => {
                self.stats.increment(TOKENS_ACCEPTED);
                tracing::trace!(
                    connection = %connection_id,
                    counter = token.message_counter,
                    kind = %message.kind(),
                    "authorization token accepted"
                );
            }
            Err(rejection) => {
                self.stats.increment(rejection.name());
                *self.rejections.entry(connection_id.to_owned()).or_insert(0) += 1;
                tracing::warn!(
                    connection = %connection_id,
                    counter = token.message_counter,
                    kind = %message.kind(),
                    replay = rejection.is_replay(),
                    "rejected authorization token: {rejection}"
                );
            }
        }
        result
    }

    fn release_connection(&self, connection_id: &str) {
        let released = self.replay_guard.release(connection_id);
        self.rejections.remove(connection_id);
        tracing::debug!(connection = %connection_id, released, "released connection authorization state");
    }
}
