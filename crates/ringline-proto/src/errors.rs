//! Error types for call-signal decoding.
//!
//! Decoding is the only fallible operation in this layer. Failures never
//! reach the grouper: the collection layer logs and skips events that do not
//! decode, so a malformed event degrades to "not part of any call" rather
//! than failing a timeline update.

use thiserror::Error;

/// Result alias for call-signal decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while interpreting timeline events as call signals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Event type is outside the call-signalling namespace
    #[error("not a call event: {event_type}")]
    NotACallEvent {
        /// Event type string that failed the predicate
        event_type: String,
    },

    /// Content decoded but the call identifier is missing or empty
    #[error("call event {event_type} carries an empty call id")]
    EmptyCallId {
        /// Event type of the offending event
        event_type: String,
    },

    /// Content exceeds the per-event size limit
    #[error("call event content too large: {size} bytes (max {max})")]
    ContentTooLarge {
        /// Actual content size in bytes
        size: usize,
        /// Maximum allowed size in bytes
        max: usize,
    },

    /// CBOR deserialization failed
    #[error("CBOR decode error: {0}")]
    CborDecode(String),

    /// CBOR serialization failed
    #[error("CBOR encode error: {0}")]
    CborEncode(String),
}
