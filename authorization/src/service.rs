//! The authorization-token contract consumed by the transport layer.

use powgate_types::{AuthorizationToken, AuthorizationTokenType, AuthorizedMessage, NetworkLoad};

use crate::{AuthorizationError, Rejection};

/// One implementation per token scheme. Transport code holds it without
/// knowing the concrete scheme.
pub trait AuthorizationTokenService: Send + Sync {
    fn token_type(&self) -> AuthorizationTokenType;

    /// Mint a token for an outgoing message to `peer_address`.
    ///
    /// `message_counter` must be unique per outgoing message on the connection.
    /// Blocks for as long as minting takes; see [`TokenMinter`] for the async path.
    ///
    /// [`TokenMinter`]: crate::TokenMinter
    fn create_token(
        &self,
        message: &dyn AuthorizedMessage,
        current_load: &NetworkLoad,
        peer_address: &str,
        message_counter: u32,
    ) -> Result<AuthorizationToken, AuthorizationError>;

    /// Check a token received with `message` on `connection_id`.
    ///
    /// The message counter is consumed on this connection as soon as the
    /// replay check passes, whether or not the remaining checks succeed.
    fn verify(
        &self,
        message: &dyn AuthorizedMessage,
        token: &AuthorizationToken,
        current_load: &NetworkLoad,
        previous_load: Option<&NetworkLoad>,
        connection_id: &str,
        local_address: &str,
    ) -> Result<(), Rejection>;

    /// [`verify`](Self::verify) collapsed to a verdict.
    fn is_authorized(
        &self,
        message: &dyn AuthorizedMessage,
        token: &AuthorizationToken,
        current_load: &NetworkLoad,
        previous_load: Option<&NetworkLoad>,
        connection_id: &str,
        local_address: &str,
    ) -> bool {
        self.verify(
            message,
            token,
            current_load,
            previous_load,
            connection_id,
            local_address,
        )
        .is_ok()
    }

    /// Drop all per-connection state. Call on connection teardown.
    fn release_connection(&self, connection_id: &str);
}
