//! Raw timeline events and the call-signal codec.
//!
//! The surrounding SDK hands the client every room timeline entry as a
//! [`TimelineEvent`]: a namespaced type string plus CBOR content. Call
//! events are picked out by prefix and decoded into typed
//! [`CallSignalEvent`]s. The content schema is selected by the event type,
//! so no variant tag is serialized.
//!
//! # Invariants
//!
//! - Every call-event payload carries the `call_id` that groups it; an event
//!   without a usable call id does not decode.
//! - Decoding never panics; malformed content is an error the caller can
//!   log and skip.

use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    CallId, CallSignalEvent, EventId, ProtocolError, Result, RoomId, SessionOffer, SignalBody,
    UserId,
    signal::{CALL_EVENT_PREFIX, LEGACY_CALL_EVENT_PREFIX, is_call_event_type},
};

/// Maximum accepted content size for a single call event (64 KB).
///
/// Call-signalling content is small (the largest member is an SDP body of a
/// few KB); anything larger is rejected before the CBOR parser runs.
pub const MAX_CONTENT_SIZE: usize = 64 * 1024;

/// One room timeline entry as delivered by the SDK.
///
/// Carries the envelope fields this layer needs and the content as opaque
/// CBOR. Non-call entries pass through this type too; the predicate
/// [`is_call_event`] decides participation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    /// Globally unique event id.
    pub event_id: EventId,
    /// Room the event was sent in.
    pub room_id: RoomId,
    /// Sender identity.
    pub sender: UserId,
    /// Namespaced event type.
    pub event_type: String,
    /// Origin server timestamp in Unix milliseconds.
    pub origin_ts_ms: u64,
    /// CBOR-encoded content.
    pub content: Bytes,
}

/// True if this timeline entry belongs to the call-signalling namespace.
#[must_use]
pub fn is_call_event(event: &TimelineEvent) -> bool {
    is_call_event_type(&event.event_type)
}

/// Content of a `call.invite` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitePayload {
    /// Call this invite opens.
    pub call_id: CallId,
    /// Session offer for the call.
    pub offer: SessionOffer,
    /// Invite validity window in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_ms: Option<u64>,
}

/// Content of a `call.hangup` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangupPayload {
    /// Call being torn down.
    pub call_id: CallId,
    /// Protocol-defined reason code (`ice_failed`, `invite_timeout`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Content of a `call.reject` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectPayload {
    /// Call being rejected.
    pub call_id: CallId,
}

/// Content of a `call.select_answer` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAnswerPayload {
    /// Call the answer belongs to.
    pub call_id: CallId,
}

/// Minimal content shared by every call event: the call id.
///
/// Used to group events whose full content this layer does not interpret
/// (answers, candidate batches, unknown `call.*` extensions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRef {
    /// Call the event belongs to.
    pub call_id: CallId,
}

/// Encode a typed payload into CBOR content bytes.
///
/// Test and harness helper; the client itself only receives on this path.
///
/// # Errors
///
/// - `ProtocolError::CborEncode` if serialization fails
pub fn encode_content<T: Serialize>(payload: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(payload, &mut buf)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
    Ok(Bytes::from(buf))
}

fn decode_content<T: DeserializeOwned>(content: &Bytes) -> Result<T> {
    if content.len() > MAX_CONTENT_SIZE {
        return Err(ProtocolError::ContentTooLarge { size: content.len(), max: MAX_CONTENT_SIZE });
    }
    ciborium::de::from_reader(content.as_ref())
        .map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

/// Event type with the namespace prefix stripped.
fn call_type_suffix(event_type: &str) -> &str {
    event_type
        .strip_prefix(LEGACY_CALL_EVENT_PREFIX)
        .or_else(|| event_type.strip_prefix(CALL_EVENT_PREFIX))
        .unwrap_or(event_type)
}

impl CallSignalEvent {
    /// Decode a timeline entry into a call signal.
    ///
    /// The schema is selected by the event type's suffix; unknown suffixes
    /// in the call namespace decode their call id only and become
    /// [`SignalBody::Other`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::NotACallEvent` if the type is outside the call
    ///   namespace
    /// - `ProtocolError::ContentTooLarge` if the content exceeds
    ///   [`MAX_CONTENT_SIZE`]
    /// - `ProtocolError::CborDecode` if the content does not match the
    ///   schema for the type
    /// - `ProtocolError::EmptyCallId` if the decoded call id is empty
    pub fn decode(event: &TimelineEvent) -> Result<Self> {
        if !is_call_event(event) {
            return Err(ProtocolError::NotACallEvent { event_type: event.event_type.clone() });
        }

        let (call_id, body) = match call_type_suffix(&event.event_type) {
            "invite" => {
                let p: InvitePayload = decode_content(&event.content)?;
                (p.call_id, SignalBody::Invite { offer: p.offer, lifetime_ms: p.lifetime_ms })
            },
            "answer" => {
                let p: CallRef = decode_content(&event.content)?;
                (p.call_id, SignalBody::Answer)
            },
            "candidates" => {
                let p: CallRef = decode_content(&event.content)?;
                (p.call_id, SignalBody::Candidates)
            },
            "select_answer" => {
                let p: SelectAnswerPayload = decode_content(&event.content)?;
                (p.call_id, SignalBody::SelectAnswer)
            },
            "hangup" => {
                let p: HangupPayload = decode_content(&event.content)?;
                (p.call_id, SignalBody::Hangup { reason: p.reason })
            },
            "reject" => {
                let p: RejectPayload = decode_content(&event.content)?;
                (p.call_id, SignalBody::Reject)
            },
            _ => {
                let p: CallRef = decode_content(&event.content)?;
                (p.call_id, SignalBody::Other)
            },
        };

        if call_id.is_empty() {
            return Err(ProtocolError::EmptyCallId { event_type: event.event_type.clone() });
        }

        Ok(Self::new(
            event.event_id.clone(),
            event.room_id.clone(),
            call_id,
            event.sender.clone(),
            event.origin_ts_ms,
            body,
        ))
    }
}
