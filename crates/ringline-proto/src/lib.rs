//! Call-signalling event model for Ringline.
//!
//! A room timeline in the chat protocol carries call-signalling events
//! alongside ordinary messages: invites, answers, hangups, rejections. This
//! crate picks those events out of the timeline by their namespaced type,
//! decodes their CBOR content into typed payloads, and exposes them as
//! [`CallSignalEvent`] values the view-model layer groups by call id.
//!
//! The crate is wire-level only. Deriving a coalesced call state from a set
//! of signal events is `ringline-core`'s job.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod ids;
mod offer;
mod signal;
mod timeline;

pub use errors::{ProtocolError, Result};
pub use ids::{CallId, EventId, RoomId, UserId};
pub use offer::SessionOffer;
pub use signal::{
    CALL_EVENT_PREFIX, CallSignalEvent, EVENT_TYPE_ANSWER, EVENT_TYPE_CANDIDATES,
    EVENT_TYPE_HANGUP, EVENT_TYPE_INVITE, EVENT_TYPE_REJECT, EVENT_TYPE_SELECT_ANSWER,
    LEGACY_CALL_EVENT_PREFIX, SignalBody, SignalKind, is_call_event_type,
};
pub use timeline::{
    CallRef, HangupPayload, InvitePayload, MAX_CONTENT_SIZE, RejectPayload, SelectAnswerPayload,
    TimelineEvent, encode_content, is_call_event,
};
