//! Fuzz target for the call-event grouper state machine
//!
//! Drives arbitrary op sequences (admissions, session lifecycle, registry
//! notifications, commands) into a grouper backed by the scripted registry.
//!
//! # Invariants
//!
//! - No op sequence panics
//! - Derived reads stay total after every op
//! - The admitted event set never shrinks and stays sorted

#![no_main]

use std::sync::Arc;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ringline_core::{CallEventGrouper, CallRegistry, LiveCallState};
use ringline_harness::{CallScript, SimCall, SimRegistry};
use ringline_proto::{CallId, UserId};

#[derive(Debug, Clone, Arbitrary)]
enum GrouperOp {
    AddInvite { local: bool, video: bool, ts: u16 },
    AddAnswer { local: bool, ts: u16 },
    AddSelectAnswer { local: bool, ts: u16 },
    AddHangup { local: bool, ts: u16 },
    AddReject { local: bool, ts: u16 },
    InsertSession { state_tag: u8 },
    RemoveSession,
    CallsChanged,
    SessionStateChanged { state_tag: u8 },
    LengthChanged { secs: u8 },
    SilenceFlipped { silenced: bool },
    AnswerCall,
    RejectCall,
    CallBack,
    ToggleSilenced,
}

fn state_from_tag(tag: u8) -> LiveCallState {
    match tag % 9 {
        0 => LiveCallState::Fledgling,
        1 => LiveCallState::InviteSent,
        2 => LiveCallState::AwaitingLocalMedia,
        3 => LiveCallState::CreatingOffer,
        4 => LiveCallState::CreatingAnswer,
        5 => LiveCallState::Connecting,
        6 => LiveCallState::Ringing,
        7 => LiveCallState::Connected,
        _ => LiveCallState::Ended,
    }
}

fuzz_target!(|ops: Vec<GrouperOp>| {
    let registry = SimRegistry::new();
    let handle: Arc<dyn CallRegistry> = Arc::clone(&registry);
    let local = UserId::from("@me:example.org");
    let remote = UserId::from("@peer:example.org");
    let call_id = CallId::from("c-fuzz");

    let mut grouper = CallEventGrouper::new(handle, local.clone());
    let mut script = CallScript::new("c-fuzz", "!fuzz:example.org");
    let mut session: Option<Arc<SimCall>> = None;
    let mut prev_count = 0;

    for op in ops {
        match op {
            GrouperOp::AddInvite { local: l, video, ts } => {
                let sender = if l { &local } else { &remote };
                let event = if video {
                    script.video_invite(sender, ts.into())
                } else {
                    script.invite(sender, ts.into())
                };
                grouper.add(event);
            }
            GrouperOp::AddAnswer { local: l, ts } => {
                let sender = if l { &local } else { &remote };
                grouper.add(script.answer(sender, ts.into()));
            }
            GrouperOp::AddSelectAnswer { local: l, ts } => {
                let sender = if l { &local } else { &remote };
                grouper.add(script.select_answer(sender, ts.into()));
            }
            GrouperOp::AddHangup { local: l, ts } => {
                let sender = if l { &local } else { &remote };
                grouper.add(script.hangup(sender, ts.into()));
            }
            GrouperOp::AddReject { local: l, ts } => {
                let sender = if l { &local } else { &remote };
                grouper.add(script.reject(sender, ts.into()));
            }
            GrouperOp::InsertSession { state_tag } => {
                let call = SimCall::new(state_from_tag(state_tag));
                registry.insert_call(call_id.clone(), Arc::clone(&call));
                session = Some(call);
                grouper.on_calls_changed();
            }
            GrouperOp::RemoveSession => {
                registry.remove_call(&call_id);
                session = None;
                grouper.on_calls_changed();
            }
            GrouperOp::CallsChanged => grouper.on_calls_changed(),
            GrouperOp::SessionStateChanged { state_tag } => {
                if let Some(call) = &session {
                    call.set_state(state_from_tag(state_tag));
                }
                grouper.on_call_state_changed();
            }
            GrouperOp::LengthChanged { secs } => {
                grouper.on_call_length_changed(Duration::from_secs(secs.into()));
            }
            GrouperOp::SilenceFlipped { silenced } => {
                registry.set_silenced(call_id.clone(), silenced);
                grouper.on_silenced_calls_changed();
            }
            GrouperOp::AnswerCall => grouper.answer_call(),
            GrouperOp::RejectCall => grouper.reject_call(),
            GrouperOp::CallBack => grouper.call_back(),
            GrouperOp::ToggleSilenced => grouper.toggle_silenced(),
        }

        // Derived reads stay total after every op
        let _ = grouper.state();
        let _ = grouper.is_voice();
        let _ = grouper.hangup_reason();
        let _ = grouper.reject_party();
        let _ = grouper.duration_ms();
        let _ = grouper.call_was_missed();

        // The event set never shrinks
        assert!(grouper.events().len() >= prev_count);
        prev_count = grouper.events().len();

        // And stays sorted by (timestamp, event id)
        for pair in grouper.events().windows(2) {
            assert!(
                (pair[0].timestamp_ms(), pair[0].event_id())
                    <= (pair[1].timestamp_ms(), pair[1].event_id())
            );
        }
    }
});
