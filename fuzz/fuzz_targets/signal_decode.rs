//! Fuzz target for call-signal decoding
//!
//! Feeds arbitrary bytes as CBOR content under every known call event type
//! plus an unknown extension type:
//! - Malformed CBOR data
//! - Type confusion (content encoded for a different event type)
//! - Oversized or deeply nested structures
//!
//! The decoder should NEVER panic. All invalid inputs must return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use ringline_proto::{CallSignalEvent, EventId, RoomId, TimelineEvent, UserId};

fuzz_target!(|data: &[u8]| {
    let event_types = [
        "call.invite",
        "call.answer",
        "call.candidates",
        "call.select_answer",
        "call.hangup",
        "call.reject",
        "x.call.invite",
        "call.future_extension",
    ];

    for event_type in event_types {
        let event = TimelineEvent {
            event_id: EventId::from("$fuzz"),
            room_id: RoomId::from("!fuzz:example.org"),
            sender: UserId::from("@fuzz:example.org"),
            event_type: event_type.to_owned(),
            origin_ts_ms: 0,
            content: Bytes::copy_from_slice(data),
        };

        // Must never panic, only return Err for invalid content
        let _ = CallSignalEvent::decode(&event);
    }
});
