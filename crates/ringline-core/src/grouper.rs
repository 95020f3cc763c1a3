//! Per-call event aggregation and derived state.
//!
//! A [`CallEventGrouper`] accumulates every signal event of one call
//! attempt and derives the coalesced [`CallPhase`] the UI renders. While
//! the external call-handling layer is running a live session for the same
//! call id, the session's state dominates; otherwise the phase falls back
//! to what the historical events alone can prove.
//!
//! # Invariants
//!
//! - All admitted events share the grouper's call id. A mismatched event is
//!   logged and ignored rather than corrupting derived state.
//! - Events are kept sorted by `(origin timestamp, event id)`, so every
//!   "first matching event" answer is deterministic regardless of arrival
//!   order.
//! - At most one live session is ever attached, and never replaced.
//!
//! No method returns an error: absent upstream data (no live session, no
//! matching event) degrades to `None`/`false` sentinels.

use std::{collections::HashSet, sync::Arc, time::Duration};

use ringline_proto::{CallId, CallSignalEvent, EventId, RoomId, SignalBody, SignalKind, UserId};
use tracing::{debug, warn};

use crate::{
    CallModality, CallPhase, CallRegistry, GrouperUpdate, LiveCall, observer::ObserverSet,
};

/// Aggregates the signal events of one call attempt into a derived state.
///
/// Created by [`GrouperMap`](crate::GrouperMap) when the first event of an
/// unseen call id arrives, and reused for as long as the call id stays in
/// the visible timeline window so observer subscriptions survive timeline
/// rebuilds. Registry and live-session notifications are routed in by the
/// owning map.
pub struct CallEventGrouper {
    registry: Arc<dyn CallRegistry>,
    local_user: UserId,
    /// Signal events sorted by `(origin timestamp, event id)`.
    events: Vec<CallSignalEvent>,
    /// Event ids already admitted.
    seen: HashSet<EventId>,
    /// Live session, attached at most once.
    call: Option<Arc<dyn LiveCall>>,
    state: Option<CallPhase>,
    observers: ObserverSet,
}

impl CallEventGrouper {
    /// Create a grouper for the events of one call attempt.
    pub fn new(registry: Arc<dyn CallRegistry>, local_user: UserId) -> Self {
        Self {
            registry,
            local_user,
            events: Vec::new(),
            seen: HashSet::new(),
            call: None,
            state: None,
            observers: ObserverSet::default(),
        }
    }

    /// Register an observer for state, silence, and length notifications.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&GrouperUpdate) + 'static) {
        self.observers.subscribe(subscriber);
    }

    /// Admit one signal event.
    ///
    /// A duplicate event id is a no-op with no notification. Otherwise the
    /// event is inserted in timestamp order, a live-session attachment is
    /// attempted if none is held yet, and the derived state is recomputed
    /// (emitting one `StateChanged`).
    pub fn add(&mut self, event: CallSignalEvent) {
        if let Some(expected) = self.call_id()
            && expected != event.call_id()
        {
            warn!(
                expected = %expected,
                got = %event.call_id(),
                event = %event.event_id(),
                "ignoring signal event with a foreign call id"
            );
            return;
        }

        if !self.seen.insert(event.event_id().clone()) {
            return; // already present, nothing to do
        }

        let key = (event.timestamp_ms(), event.event_id().clone());
        let pos =
            self.events.partition_point(|e| (e.timestamp_ms(), e.event_id()) < (key.0, &key.1));
        self.events.insert(pos, event);

        self.attach_call();
        self.recompute_state();
    }

    /// The registry's set of active sessions changed.
    ///
    /// While unattached this retries the lookup and recomputes state; once
    /// a session is held the notification is irrelevant (first writer
    /// wins, the session is never replaced or re-queried).
    pub fn on_calls_changed(&mut self) {
        if self.call.is_some() {
            return;
        }
        self.attach_call();
        self.recompute_state();
    }

    /// The attached session reported a lifecycle state change.
    pub fn on_call_state_changed(&mut self) {
        self.recompute_state();
    }

    /// The attached session reported a new elapsed call length.
    pub fn on_call_length_changed(&mut self, length: Duration) {
        self.observers.notify(&GrouperUpdate::LengthChanged(length));
    }

    /// The registry's set of silenced calls changed.
    ///
    /// Queries the current silence status and reports it. Does not touch
    /// the derived state.
    pub fn on_silenced_calls_changed(&mut self) {
        let Some(call_id) = self.call_id().cloned() else {
            debug!("silence change before any signal event; nothing to report");
            return;
        };
        let silenced = self.registry.is_silenced(&call_id);
        self.observers.notify(&GrouperUpdate::SilencedChanged(silenced));
    }

    /// Current derived state. `None` until a recomputation determines one.
    #[must_use]
    pub fn state(&self) -> Option<CallPhase> {
        self.state
    }

    /// Call id shared by the admitted events. `None` while empty.
    #[must_use]
    pub fn call_id(&self) -> Option<&CallId> {
        self.events.first().map(CallSignalEvent::call_id)
    }

    /// Room the call lives in. `None` while empty.
    #[must_use]
    pub fn room_id(&self) -> Option<&RoomId> {
        self.events.first().map(CallSignalEvent::room_id)
    }

    /// Admitted events in `(timestamp, event id)` order.
    #[must_use]
    pub fn events(&self) -> &[CallSignalEvent] {
        &self.events
    }

    /// True if a live session is attached.
    #[must_use]
    pub fn has_live_call(&self) -> bool {
        self.call.is_some()
    }

    /// Voice/video classification of the call.
    ///
    /// `None` without an invite; otherwise voice exactly when the invite's
    /// offer declares no video media section.
    #[must_use]
    pub fn is_voice(&self) -> Option<bool> {
        match self.find(SignalKind::Invite)?.body() {
            SignalBody::Invite { offer, .. } => Some(!offer.has_video_media()),
            _ => None,
        }
    }

    /// Why the call ended: the live session's reason, else the hangup
    /// event's reason, else `None`.
    #[must_use]
    pub fn hangup_reason(&self) -> Option<String> {
        if let Some(call) = &self.call
            && let Some(reason) = call.hangup_reason()
        {
            return Some(reason);
        }
        match self.find(SignalKind::Hangup)?.body() {
            SignalBody::Hangup { reason } => reason.clone(),
            _ => None,
        }
    }

    /// Sender of the reject event, if the call was rejected.
    #[must_use]
    pub fn reject_party(&self) -> Option<&UserId> {
        self.find(SignalKind::Reject).map(CallSignalEvent::sender)
    }

    /// True if a reject event is present.
    #[must_use]
    pub fn got_rejected(&self) -> bool {
        self.find(SignalKind::Reject).is_some()
    }

    /// Call duration in milliseconds: hangup minus select-answer origin
    /// timestamps. `None` unless both events are present; negative when
    /// they arrived out of order (not clamped).
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        let hangup = self.find(SignalKind::Hangup)?;
        let select_answer = self.find(SignalKind::SelectAnswer)?;
        Some(hangup.timestamp_ms() as i64 - select_answer.timestamp_ms() as i64)
    }

    /// True if no admitted event was sent by the local user.
    #[must_use]
    pub fn call_was_missed(&self) -> bool {
        !self.events.iter().any(|event| event.sender() == &self.local_user)
    }

    /// Answer the incoming call.
    pub fn answer_call(&self) {
        match self.room_id() {
            Some(room_id) => self.registry.answer(room_id),
            None => debug!("answer requested before any signal event"),
        }
    }

    /// Reject the incoming call (hangup-as-reject).
    pub fn reject_call(&self) {
        match self.room_id() {
            Some(room_id) => self.registry.hangup_or_reject(room_id, true),
            None => debug!("reject requested before any signal event"),
        }
    }

    /// Place a fresh call to the same room, in the same modality.
    ///
    /// An unclassifiable call (no invite seen) calls back with video, the
    /// richer modality.
    pub fn call_back(&self) {
        let Some(room_id) = self.room_id() else {
            debug!("call back requested before any signal event");
            return;
        };
        let modality = if self.is_voice() == Some(true) {
            CallModality::Voice
        } else {
            CallModality::Video
        };
        self.registry.place_call(room_id, modality);
    }

    /// Flip the silence status for this call.
    pub fn toggle_silenced(&self) {
        let Some(call_id) = self.call_id() else {
            debug!("silence toggle requested before any signal event");
            return;
        };
        if self.registry.is_silenced(call_id) {
            self.registry.unsilence(call_id);
        } else {
            self.registry.silence(call_id);
        }
    }

    /// Earliest event of a kind, by `(timestamp, event id)` order.
    fn find(&self, kind: SignalKind) -> Option<&CallSignalEvent> {
        self.events.iter().find(|event| event.kind() == kind)
    }

    /// True if the set holds a signal that ends the call.
    fn has_terminal_signal(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event.kind(), SignalKind::Hangup | SignalKind::Reject))
    }

    /// Attach the live session for this call id, first writer wins.
    fn attach_call(&mut self) {
        if self.call.is_some() {
            return;
        }
        let Some(call_id) = self.call_id().cloned() else {
            return;
        };
        if let Some(call) = self.registry.call_by_id(&call_id) {
            debug!(call = %call_id, "attached live call session");
            self.call = Some(call);
        }
    }

    /// Recompute the derived state and notify observers.
    ///
    /// Emission is unconditional: observers get a `StateChanged` even when
    /// the value did not move.
    fn recompute_state(&mut self) {
        let live_phase =
            self.call.as_ref().map(|call| call.state()).and_then(CallPhase::from_live_state);
        self.state = match live_phase {
            Some(phase) => Some(phase),
            None => self.event_derived_state(),
        };
        self.observers.notify(&GrouperUpdate::StateChanged(self.state));
    }

    /// Fallback derivation when no live session state determines the phase.
    ///
    /// Checked in priority order; a set matching no branch keeps the prior
    /// state (a defined no-op, not an error). `Missed` requires the call to
    /// be over (a terminal signal with no local participation), so an
    /// in-flight remote invite stays indeterminate until the session shows
    /// up or the call ends.
    fn event_derived_state(&self) -> Option<CallPhase> {
        if self.call_was_missed() && self.has_terminal_signal() {
            Some(CallPhase::Missed)
        } else if self.got_rejected() {
            Some(CallPhase::Ended)
        } else if self.find(SignalKind::Hangup).is_some() {
            Some(CallPhase::Ended)
        } else if self.find(SignalKind::Invite).is_some() && self.call.is_some() {
            Some(CallPhase::Connecting)
        } else {
            self.state
        }
    }
}
