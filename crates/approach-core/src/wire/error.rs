//! Transport error types.

use thiserror::Error;

/// Hard cap on frame payload length. A `payload_length` at or above this
/// value (or below zero) is rejected as a corrupt message.
pub const MAX_PAYLOAD_LENGTH: usize = 10_000_000;

/// Errors surfaced by the frame transport.
///
/// Transport errors are fatal to the session: the connection is torn down
/// and the client may construct a fresh one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// A frame header failed validation; the stream can no longer be
    /// trusted.
    #[error("corrupt message")]
    CorruptMessage,

    /// The peer presented an unexpected version string.
    #[error("handshake failed: {reason}")]
    HandshakeFailed {
        /// What the handshake observed.
        reason: String,
    },

    /// No connection is available to carry the message.
    #[error("no connection")]
    NoConnection,

    /// An I/O error on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error with no more specific classification.
    #[error("unknown transport error")]
    Unknown,
}
