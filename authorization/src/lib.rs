//! Proof-of-work authorization for peer-to-peer messages.
//!
//! Every outbound message carries an [`AuthorizationToken`] whose difficulty is
//! derived from the message's cost factor and the receiver's network load. The
//! receiver checks, in order: replay, payload, challenge, difficulty, and the
//! proof itself. Any failure drops the message.
//!
//! [`AuthorizationToken`]: powgate_types::AuthorizationToken

pub mod adjudication;
pub mod challenge;
pub mod config;
pub mod error;
pub mod hash_cash;
pub mod minter;
pub mod replay;
pub mod service;

pub use adjudication::{Adjudication, DifficultyAdjudicator};
pub use challenge::{challenge_for, counter_bytes};
pub use config::AuthorizationConfig;
pub use error::{AuthorizationError, Rejection};
pub use hash_cash::{HashCashTokenService, MintRequest};
pub use minter::{MintCancellation, TokenMinter};
pub use replay::ReplayGuard;
pub use service::AuthorizationTokenService;
