//! Authorization tokens attached to outbound messages.

use serde::{Deserialize, Serialize};

use crate::ProofOfWork;

/// Which authorization scheme produced a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationTokenType {
    /// Hashcash-style proof-of-work.
    HashCash,
}

impl AuthorizationTokenType {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HashCash => "hashcash",
        }
    }
}

/// Proof-of-work bound to one outgoing message.
///
/// A token is minted for exactly one message and one message counter on a
/// connection. It is meaningless once detached from that message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub token_type: AuthorizationTokenType,
    pub proof_of_work: ProofOfWork,
    pub message_counter: u32,
}

impl AuthorizationToken {
    pub fn new(
        token_type: AuthorizationTokenType,
        proof_of_work: ProofOfWork,
        message_counter: u32,
    ) -> Self {
        Self {
            token_type,
            proof_of_work,
            message_counter,
        }
    }
}
