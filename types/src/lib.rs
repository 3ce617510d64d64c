//! Fundamental types for proof-of-work message authorization.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! network load signals, proof-of-work records, authorization tokens, and the
//! message contract that senders and receivers agree on.

pub mod load;
pub mod message;
pub mod pow;
pub mod token;

pub use load::{NetworkLoad, NetworkLoadSnapshot};
pub use message::AuthorizedMessage;
pub use pow::ProofOfWork;
pub use token::{AuthorizationToken, AuthorizationTokenType};
