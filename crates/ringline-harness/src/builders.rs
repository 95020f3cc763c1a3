//! Signal and timeline event builders.

use bytes::Bytes;
use ringline_proto::{
    CallId, CallSignalEvent, EVENT_TYPE_HANGUP, EVENT_TYPE_INVITE, EVENT_TYPE_REJECT,
    EVENT_TYPE_SELECT_ANSWER, EventId, HangupPayload, InvitePayload, RejectPayload, Result,
    RoomId, SelectAnswerPayload, SessionOffer, SignalBody, TimelineEvent, UserId, encode_content,
};

/// Audio-only SDP used by invite builders unless video is requested.
pub const VOICE_OFFER_SDP: &str = "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111";

/// SDP declaring a video media section.
pub const VIDEO_OFFER_SDP: &str =
    "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\nm=video 9 UDP/TLS/RTP/SAVPF 96";

/// Mints the signal events of one call attempt.
///
/// Fixes the call id and room id once; each method produces the next event
/// with a caller-chosen sender and timestamp, and a unique event id. The
/// `timeline_*` variants return the CBOR-encoded [`TimelineEvent`] form to
/// exercise the decode path.
#[derive(Debug, Clone)]
pub struct CallScript {
    call_id: CallId,
    room_id: RoomId,
    counter: u32,
}

impl CallScript {
    /// Script a call in a room.
    pub fn new(call_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self { call_id: CallId::new(call_id), room_id: RoomId::new(room_id), counter: 0 }
    }

    /// Call id shared by every minted event.
    #[must_use]
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Room id shared by every minted event.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn next_event_id(&mut self) -> EventId {
        self.counter += 1;
        EventId::new(format!("${}-{:03}", self.call_id, self.counter))
    }

    fn signal(&mut self, sender: &UserId, timestamp_ms: u64, body: SignalBody) -> CallSignalEvent {
        CallSignalEvent::new(
            self.next_event_id(),
            self.room_id.clone(),
            self.call_id.clone(),
            sender.clone(),
            timestamp_ms,
            body,
        )
    }

    /// Voice invite.
    pub fn invite(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(
            sender,
            timestamp_ms,
            SignalBody::Invite { offer: SessionOffer::new(VOICE_OFFER_SDP), lifetime_ms: None },
        )
    }

    /// Invite whose offer declares video.
    pub fn video_invite(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(
            sender,
            timestamp_ms,
            SignalBody::Invite { offer: SessionOffer::new(VIDEO_OFFER_SDP), lifetime_ms: None },
        )
    }

    /// Answer signal.
    pub fn answer(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(sender, timestamp_ms, SignalBody::Answer)
    }

    /// Select-answer signal.
    pub fn select_answer(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(sender, timestamp_ms, SignalBody::SelectAnswer)
    }

    /// Hangup with no reason.
    pub fn hangup(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(sender, timestamp_ms, SignalBody::Hangup { reason: None })
    }

    /// Hangup carrying a protocol reason code.
    pub fn hangup_with_reason(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
        reason: impl Into<String>,
    ) -> CallSignalEvent {
        self.signal(sender, timestamp_ms, SignalBody::Hangup { reason: Some(reason.into()) })
    }

    /// Reject signal.
    pub fn reject(&mut self, sender: &UserId, timestamp_ms: u64) -> CallSignalEvent {
        self.signal(sender, timestamp_ms, SignalBody::Reject)
    }

    fn timeline(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
        event_type: &str,
        content: Bytes,
    ) -> TimelineEvent {
        TimelineEvent {
            event_id: self.next_event_id(),
            room_id: self.room_id.clone(),
            sender: sender.clone(),
            event_type: event_type.to_owned(),
            origin_ts_ms: timestamp_ms,
            content,
        }
    }

    /// CBOR-encoded timeline entry for an invite.
    pub fn timeline_invite(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
        video: bool,
    ) -> Result<TimelineEvent> {
        let sdp = if video { VIDEO_OFFER_SDP } else { VOICE_OFFER_SDP };
        let content = encode_content(&InvitePayload {
            call_id: self.call_id.clone(),
            offer: SessionOffer::new(sdp),
            lifetime_ms: None,
        })?;
        Ok(self.timeline(sender, timestamp_ms, EVENT_TYPE_INVITE, content))
    }

    /// CBOR-encoded timeline entry for a select-answer.
    pub fn timeline_select_answer(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
    ) -> Result<TimelineEvent> {
        let content = encode_content(&SelectAnswerPayload { call_id: self.call_id.clone() })?;
        Ok(self.timeline(sender, timestamp_ms, EVENT_TYPE_SELECT_ANSWER, content))
    }

    /// CBOR-encoded timeline entry for a hangup.
    pub fn timeline_hangup(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
    ) -> Result<TimelineEvent> {
        let content =
            encode_content(&HangupPayload { call_id: self.call_id.clone(), reason: None })?;
        Ok(self.timeline(sender, timestamp_ms, EVENT_TYPE_HANGUP, content))
    }

    /// CBOR-encoded timeline entry for a reject.
    pub fn timeline_reject(
        &mut self,
        sender: &UserId,
        timestamp_ms: u64,
    ) -> Result<TimelineEvent> {
        let content = encode_content(&RejectPayload { call_id: self.call_id.clone() })?;
        Ok(self.timeline(sender, timestamp_ms, EVENT_TYPE_REJECT, content))
    }

    /// Timeline entry in the call namespace with unparseable content.
    pub fn timeline_garbage(&mut self, sender: &UserId, timestamp_ms: u64) -> TimelineEvent {
        self.timeline(
            sender,
            timestamp_ms,
            EVENT_TYPE_INVITE,
            Bytes::from_static(&[0xff, 0x13, 0x37]),
        )
    }
}

/// Non-call timeline entry (an ordinary room message) for predicate tests.
#[must_use]
pub fn message_event(event_id: &str, room_id: &str, sender: &UserId, timestamp_ms: u64) -> TimelineEvent {
    TimelineEvent {
        event_id: EventId::from(event_id),
        room_id: RoomId::from(room_id),
        sender: sender.clone(),
        event_type: "m.room.message".to_owned(),
        origin_ts_ms: timestamp_ms,
        // empty CBOR map; content is irrelevant for non-call entries
        content: Bytes::from_static(&[0xa0]),
    }
}
