//! Decoded call-signalling events.
//!
//! One [`CallSignalEvent`] is one step of legacy 1:1 call signalling:
//! invite, answer, hangup, rejection, and so on. All events of one call
//! attempt share a call id; the view-model layer groups on it.
//!
//! # Invariants
//!
//! - Event identity is the event id. The grouper's set semantics and every
//!   deduplication decision rest on it.
//! - Events are immutable once decoded.

use crate::{CallId, EventId, RoomId, SessionOffer, UserId};

/// Event type of a call invitation.
pub const EVENT_TYPE_INVITE: &str = "call.invite";

/// Event type of an answer to an invite.
pub const EVENT_TYPE_ANSWER: &str = "call.answer";

/// Event type of an ICE candidate batch.
pub const EVENT_TYPE_CANDIDATES: &str = "call.candidates";

/// Event type of the caller's choice among competing answers.
pub const EVENT_TYPE_SELECT_ANSWER: &str = "call.select_answer";

/// Event type of a call teardown.
pub const EVENT_TYPE_HANGUP: &str = "call.hangup";

/// Event type of a callee-side rejection.
pub const EVENT_TYPE_REJECT: &str = "call.reject";

/// Namespace prefix of call-signalling event types.
pub const CALL_EVENT_PREFIX: &str = "call.";

/// Pre-standardisation namespace prefix still present in old timelines.
pub const LEGACY_CALL_EVENT_PREFIX: &str = "x.call.";

/// True if the event type belongs to the call-signalling namespace.
#[must_use]
pub fn is_call_event_type(event_type: &str) -> bool {
    event_type.starts_with(CALL_EVENT_PREFIX) || event_type.starts_with(LEGACY_CALL_EVENT_PREFIX)
}

/// Discriminant of a call signal, independent of payload content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Call invitation carrying the session offer.
    Invite,
    /// Answer to an invite.
    Answer,
    /// ICE candidate batch.
    Candidates,
    /// Caller's choice among competing answers.
    SelectAnswer,
    /// Call teardown.
    Hangup,
    /// Callee rejected the call.
    Reject,
    /// Any other event in the call namespace.
    Other,
}

/// Decoded body of a call signal.
///
/// Only the fields the view-model layer consumes are retained; media-level
/// content (answer SDP, ICE candidates) stays with the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalBody {
    /// Call invitation.
    Invite {
        /// Session offer for the call.
        offer: SessionOffer,
        /// Invite validity window in milliseconds, if bounded.
        lifetime_ms: Option<u64>,
    },
    /// Answer to an invite.
    Answer,
    /// ICE candidate batch.
    Candidates,
    /// Caller's choice among competing answers.
    SelectAnswer,
    /// Call teardown.
    Hangup {
        /// Protocol-defined hangup reason code, if supplied.
        reason: Option<String>,
    },
    /// Callee rejected the call.
    Reject,
    /// Unrecognized event in the call namespace.
    Other,
}

impl SignalBody {
    /// Discriminant of this body.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::Invite { .. } => SignalKind::Invite,
            Self::Answer => SignalKind::Answer,
            Self::Candidates => SignalKind::Candidates,
            Self::SelectAnswer => SignalKind::SelectAnswer,
            Self::Hangup { .. } => SignalKind::Hangup,
            Self::Reject => SignalKind::Reject,
            Self::Other => SignalKind::Other,
        }
    }
}

/// One step of call signalling, decoded from the room timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignalEvent {
    event_id: EventId,
    room_id: RoomId,
    call_id: CallId,
    sender: UserId,
    timestamp_ms: u64,
    body: SignalBody,
}

impl CallSignalEvent {
    /// Assemble a signal event from already-decoded parts.
    pub fn new(
        event_id: EventId,
        room_id: RoomId,
        call_id: CallId,
        sender: UserId,
        timestamp_ms: u64,
        body: SignalBody,
    ) -> Self {
        Self { event_id, room_id, call_id, sender, timestamp_ms, body }
    }

    /// Globally unique event id (event identity).
    #[must_use]
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Room the event was sent in.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Call attempt this event belongs to.
    #[must_use]
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Sender identity.
    #[must_use]
    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    /// Origin server timestamp in Unix milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Decoded body.
    #[must_use]
    pub fn body(&self) -> &SignalBody {
        &self.body
    }

    /// Discriminant of the body.
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        self.body.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_accepts_both_namespaces() {
        assert!(is_call_event_type("call.invite"));
        assert!(is_call_event_type("call.hangup"));
        assert!(is_call_event_type("x.call.reject"));
        assert!(is_call_event_type("call.future_extension"));
    }

    #[test]
    fn predicate_rejects_other_namespaces() {
        assert!(!is_call_event_type("m.room.message"));
        assert!(!is_call_event_type("callsign.invite"));
        assert!(!is_call_event_type("call"));
        assert!(!is_call_event_type(""));
    }

    #[test]
    fn kind_follows_body() {
        let body = SignalBody::Hangup { reason: Some("ice_failed".into()) };
        assert_eq!(body.kind(), SignalKind::Hangup);
        assert_eq!(SignalBody::Other.kind(), SignalKind::Other);
    }
}
