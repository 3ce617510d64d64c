//! The contract a network message must satisfy to be authorized.

/// A message that can be covered by an authorization token.
///
/// Cost factors are defined per message kind by the messaging layer, nominally
/// in `[0, 1]`. The payload must be the exact bytes that go on the wire: the
/// receiver re-serializes the message it decoded and compares byte for byte.
pub trait AuthorizedMessage {
    /// Relative cost of processing this kind of message.
    fn cost_factor(&self) -> f64;

    /// Serialized form of the message.
    fn payload(&self) -> Vec<u8>;

    /// Short name used in logs.
    fn kind(&self) -> &str {
        "message"
    }
}
