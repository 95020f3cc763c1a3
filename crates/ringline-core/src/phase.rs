//! Derived call status.

use serde::Serialize;

use crate::LiveCallState;

/// Coalesced call status shown on a call tile.
///
/// Derived from the live session state while one is attached, from the
/// signal events otherwise. `Missed` never comes from a live session: it is
/// the event-derived verdict for a call that ended without any local
/// participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallPhase {
    /// Session is being set up.
    Connecting,
    /// Waiting to be picked up.
    Ringing,
    /// Media flowing.
    Connected,
    /// Over: hung up, rejected, or failed.
    Ended,
    /// Ended without any local participation.
    Missed,
}

impl CallPhase {
    /// Phase determined by a live session state, if any.
    ///
    /// The connecting-phase states all collapse to `Connecting`; the stable
    /// states are mirrored exactly. `None` for states in neither set; the
    /// caller falls back to event-derived state.
    #[must_use]
    pub fn from_live_state(state: LiveCallState) -> Option<Self> {
        match state {
            LiveCallState::Connecting
            | LiveCallState::AwaitingLocalMedia
            | LiveCallState::CreatingOffer
            | LiveCallState::CreatingAnswer => Some(Self::Connecting),
            LiveCallState::Connected => Some(Self::Connected),
            LiveCallState::Ringing => Some(Self::Ringing),
            LiveCallState::Ended => Some(Self::Ended),
            LiveCallState::Fledgling | LiveCallState::InviteSent => None,
        }
    }
}
