//! # parley-proto
//!
//! Wire protocol for the Parley messaging service.
//!
//! Every packet exchanged between a client and the server is a
//! length-prefixed frame tunneled over TLS:
//!
//! ```text
//! +----------------+---------------------+------------------------+
//! | type (u32, BE) | payload_len (u32, BE) | payload_len bytes    |
//! +----------------+---------------------+------------------------+
//! ```
//!
//! Payloads are fixed-layout binary records: multi-byte integers are
//! big-endian, strings are fixed-capacity NUL-padded byte arrays. The
//! layout of each record lives in [`payload`]; the numeric message-type
//! registry lives in [`types`]; framed async I/O lives in [`frame`];
//! and [`message`] provides the typed envelope layer that turns a
//! `(type, bytes)` pair into an owned enum variant.

pub mod codec;
pub mod frame;
pub mod message;
pub mod payload;
pub mod types;

/// Error types for protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// Socket read/write failure, including EOF mid-frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame advertised a payload larger than the receive ceiling.
    #[error("payload too large: {0} bytes, max {max}", max = frame::MAX_PAYLOAD_LEN)]
    PayloadTooLarge(usize),

    /// The peer stalled mid-frame past the receive deadline.
    #[error("timed out reading frame payload")]
    Timeout,

    /// A message type outside the known registry.
    #[error("unknown message type {0}")]
    UnknownType(u32),

    /// A payload shorter or longer than its fixed layout requires.
    #[error("malformed {kind} payload: expected {expected} bytes, got {actual}")]
    BadLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtoError::UnknownType(99);
        assert_eq!(err.to_string(), "unknown message type 99");

        let err = ProtoError::BadLength {
            kind: "LoginPayload",
            expected: 128,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "malformed LoginPayload payload: expected 128 bytes, got 4"
        );
    }
}
