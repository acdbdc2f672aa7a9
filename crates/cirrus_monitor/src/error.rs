//! Error types for the monitor transport.

use core::fmt;

/// Direction of a message relative to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Request sent to the engine.
    Send,
    /// Response received from the engine.
    Receive,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Send => f.write_str("outgoing"),
            Direction::Receive => f.write_str("incoming"),
        }
    }
}

/// Errors raised while talking to the resource monitor.
///
/// The transport adds no semantics of its own: engine-reported failures are
/// surfaced unchanged as [`TransportError::Status`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The monitor address cannot be used to open a channel.
    #[error("invalid monitor address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The channel could not be opened or the connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The engine answered with an error status.
    #[error("{method} failed with status {status}: {message}")]
    Status {
        /// The RPC method that failed.
        method: String,
        /// Status code reported by the engine.
        status: u16,
        /// Error message reported by the engine.
        message: String,
    },

    /// A message exceeded the configured size ceiling.
    #[error("{direction} message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        /// Whether the request or the response was too large.
        direction: Direction,
        /// Actual message size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The request could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The channel pool was shut down.
    #[error("channel pool has been shut down")]
    PoolClosed,
}

/// Fails with [`TransportError::MessageTooLarge`] if `size` exceeds `limit`.
pub(crate) fn check_size(
    direction: Direction,
    size: usize,
    limit: usize,
) -> Result<(), TransportError> {
    if size > limit {
        return Err(TransportError::MessageTooLarge {
            direction,
            size,
            limit,
        });
    }
    Ok(())
}
