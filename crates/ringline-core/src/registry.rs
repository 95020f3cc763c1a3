//! Contracts of the external call-handling layer.
//!
//! The grouper never owns a call session. The call-handling layer owns the
//! id → session mapping, the signalling, and the media; this module defines
//! the capability surface a grouper is handed at construction. Injecting the
//! registry keeps the grouper testable without process-wide singletons.

use std::sync::Arc;

use ringline_proto::{CallId, RoomId};

/// Media modality requested when placing a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallModality {
    /// Audio only.
    Voice,
    /// Audio and video.
    Video,
}

/// Lifecycle state reported by a live call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveCallState {
    /// Session object exists, nothing sent yet.
    Fledgling,
    /// Invite sent, no answer seen.
    InviteSent,
    /// Waiting for local media (microphone, camera).
    AwaitingLocalMedia,
    /// Building the session offer.
    CreatingOffer,
    /// Building the session answer.
    CreatingAnswer,
    /// Media transport connecting.
    Connecting,
    /// Waiting to be picked up.
    Ringing,
    /// Media flowing.
    Connected,
    /// Session is over.
    Ended,
}

/// Handle to a live call session owned by the registry.
///
/// Distinct from the historical signal events: the session exists only
/// while the call-handling layer is actively running the call.
pub trait LiveCall: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> LiveCallState;

    /// Hangup reason reported by the session, if it ended with one.
    fn hangup_reason(&self) -> Option<String>;
}

/// Capability surface of the external call-handling layer.
///
/// The id → session mapping is read-only from this layer's perspective.
/// Commands are fire-and-forget: outcomes arrive back as session state
/// changes and as new timeline events.
pub trait CallRegistry: Send + Sync {
    /// Live session for a call id. `None` if none is active.
    fn call_by_id(&self, call_id: &CallId) -> Option<Arc<dyn LiveCall>>;

    /// Answer the incoming call in a room.
    fn answer(&self, room_id: &RoomId);

    /// Hang up the call in a room, or reject it before pickup.
    fn hangup_or_reject(&self, room_id: &RoomId, reject: bool);

    /// Place a fresh call in a room.
    fn place_call(&self, room_id: &RoomId, modality: CallModality);

    /// True if notifications for this call are silenced.
    fn is_silenced(&self, call_id: &CallId) -> bool;

    /// Silence notifications for this call.
    fn silence(&self, call_id: &CallId);

    /// Restore notifications for this call.
    fn unsilence(&self, call_id: &CallId);
}
