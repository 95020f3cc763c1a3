//! Directed scenario tests for the call-event grouper and its collection.
//!
//! Each scenario pins one contract of the derived-state rules: what a set
//! of signal events must resolve to, with and without a live session, and
//! which notifications observers see along the way.

use std::{sync::Arc, time::Duration};

use ringline_core::{
    CallEventGrouper, CallModality, CallPhase, CallRegistry, GrouperMap, GrouperUpdate,
    LiveCallState,
};
use ringline_harness::{
    CallScript, RegistryCommand, SimCall, SimRegistry, UpdateRecorder, message_event,
};
use ringline_proto::{CallId, RoomId, UserId};

fn local() -> UserId {
    UserId::from("@me:example.org")
}

fn remote() -> UserId {
    UserId::from("@peer:example.org")
}

fn grouper_with(registry: &Arc<SimRegistry>) -> CallEventGrouper {
    let handle: Arc<dyn CallRegistry> = registry.clone();
    CallEventGrouper::new(handle, local())
}

fn map_with(registry: &Arc<SimRegistry>) -> GrouperMap {
    let handle: Arc<dyn CallRegistry> = registry.clone();
    GrouperMap::new(handle, local())
}

#[test]
fn local_rejection_resolves_ended() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.reject(&local(), 1_000));

    assert_eq!(grouper.state(), Some(CallPhase::Ended));
    assert!(grouper.got_rejected());
    assert_eq!(grouper.reject_party(), Some(&local()));
}

#[test]
fn fully_remote_call_resolves_missed() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));
    grouper.add(script.hangup(&remote(), 31_000));

    assert!(grouper.call_was_missed());
    // missed is checked before the hangup branch, so this is Missed not Ended
    assert_eq!(grouper.state(), Some(CallPhase::Missed));
}

#[test]
fn remote_rejection_without_local_events_is_missed() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));
    grouper.add(script.reject(&remote(), 2_000));

    assert_eq!(grouper.state(), Some(CallPhase::Missed));
    assert!(grouper.got_rejected());
}

#[test]
fn duration_is_hangup_minus_select_answer() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.select_answer(&local(), 10_000));
    grouper.add(script.hangup(&remote(), 70_500));

    assert_eq!(grouper.duration_ms(), Some(60_500));
}

#[test]
fn out_of_order_duration_goes_negative() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.hangup(&remote(), 5_000));
    grouper.add(script.select_answer(&local(), 10_000));

    // boundary case: not clamped
    assert_eq!(grouper.duration_ms(), Some(-5_000));
}

#[test]
fn duration_needs_both_events() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.hangup(&remote(), 5_000));
    assert_eq!(grouper.duration_ms(), None);
}

#[test]
fn voice_classification_follows_the_offer() {
    let registry = SimRegistry::new();
    let mut script = CallScript::new("c1", "!room:example.org");

    let mut voice = grouper_with(&registry);
    voice.add(script.invite(&remote(), 1_000));
    assert_eq!(voice.is_voice(), Some(true));

    let mut script2 = CallScript::new("c2", "!room:example.org");
    let mut video = grouper_with(&registry);
    video.add(script2.video_invite(&remote(), 1_000));
    assert_eq!(video.is_voice(), Some(false));

    let mut script3 = CallScript::new("c3", "!room:example.org");
    let mut no_invite = grouper_with(&registry);
    no_invite.add(script3.hangup(&remote(), 1_000));
    assert_eq!(no_invite.is_voice(), None);
}

#[test]
fn all_local_events_mean_not_missed() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&local(), 1_000));
    grouper.add(script.hangup(&local(), 2_000));

    assert!(!grouper.call_was_missed());
    assert_eq!(grouper.state(), Some(CallPhase::Ended));
}

#[test]
fn duplicate_admission_is_idempotent() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let recorder = UpdateRecorder::new();
    grouper.subscribe(recorder.sink());
    let mut script = CallScript::new("c1", "!room:example.org");

    let invite = script.invite(&remote(), 1_000);
    grouper.add(invite.clone());
    assert_eq!(recorder.take().len(), 1);

    grouper.add(invite);
    assert_eq!(grouper.events().len(), 1);
    assert!(recorder.is_empty(), "duplicate add must not notify");
}

#[test]
fn lone_remote_invite_stays_undetermined_until_a_session_shows_up() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let recorder = UpdateRecorder::new();
    grouper.subscribe(recorder.sink());
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));

    // no branch of the fallback matches: no terminal signal, no session
    assert_eq!(grouper.state(), None);
    assert_eq!(recorder.take(), vec![GrouperUpdate::StateChanged(None)]);

    registry.insert_call(CallId::from("c1"), SimCall::new(LiveCallState::Ringing));
    grouper.on_calls_changed();

    assert_eq!(grouper.state(), Some(CallPhase::Ringing));
    assert_eq!(
        recorder.take(),
        vec![GrouperUpdate::StateChanged(Some(CallPhase::Ringing))]
    );
}

#[test]
fn connecting_phase_session_states_collapse() {
    let registry = SimRegistry::new();
    registry.insert_call(CallId::from("c1"), SimCall::new(LiveCallState::CreatingOffer));
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));

    assert!(grouper.has_live_call());
    assert_eq!(grouper.state(), Some(CallPhase::Connecting));
}

#[test]
fn invite_with_an_early_session_derives_connecting() {
    // session exists but its state determines nothing yet
    let registry = SimRegistry::new();
    registry.insert_call(CallId::from("c1"), SimCall::new(LiveCallState::Fledgling));
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));

    assert_eq!(grouper.state(), Some(CallPhase::Connecting));
}

#[test]
fn first_attached_session_wins() {
    let registry = SimRegistry::new();
    let ringing = SimCall::new(LiveCallState::Ringing);
    registry.insert_call(CallId::from("c1"), Arc::clone(&ringing));

    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");
    grouper.add(script.invite(&remote(), 1_000));
    assert_eq!(grouper.state(), Some(CallPhase::Ringing));

    // a different session for the same id never replaces the attached one
    registry.insert_call(CallId::from("c1"), SimCall::new(LiveCallState::Ended));
    grouper.on_calls_changed();
    assert_eq!(grouper.state(), Some(CallPhase::Ringing));

    // the attached session still drives state changes
    ringing.set_state(LiveCallState::Connected);
    grouper.on_call_state_changed();
    assert_eq!(grouper.state(), Some(CallPhase::Connected));
}

#[test]
fn hangup_reason_prefers_the_live_session() {
    let registry = SimRegistry::new();
    let call = SimCall::new(LiveCallState::Ended);
    call.set_hangup_reason("ice_failed");
    registry.insert_call(CallId::from("c1"), call);

    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");
    grouper.add(script.hangup_with_reason(&remote(), 1_000, "user_hangup"));

    assert_eq!(grouper.hangup_reason(), Some("ice_failed".to_owned()));
}

#[test]
fn hangup_reason_falls_back_to_the_event() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.hangup_with_reason(&remote(), 1_000, "invite_timeout"));
    assert_eq!(grouper.hangup_reason(), Some("invite_timeout".to_owned()));
}

#[test]
fn commands_delegate_to_the_registry() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");
    let room = RoomId::from("!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));
    grouper.answer_call();
    grouper.reject_call();
    grouper.call_back();

    assert_eq!(
        registry.commands(),
        vec![
            RegistryCommand::Answer(room.clone()),
            RegistryCommand::HangupOrReject { room_id: room.clone(), reject: true },
            RegistryCommand::PlaceCall { room_id: room, modality: CallModality::Voice },
        ]
    );
}

#[test]
fn call_back_matches_the_original_modality() {
    let registry = SimRegistry::new();
    let room = RoomId::from("!room:example.org");

    let mut video = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");
    video.add(script.video_invite(&remote(), 1_000));
    video.call_back();

    // unclassifiable calls (no invite seen) also call back with video
    let mut unknown = grouper_with(&registry);
    let mut script2 = CallScript::new("c2", "!room:example.org");
    unknown.add(script2.hangup(&remote(), 1_000));
    unknown.call_back();

    assert_eq!(
        registry.commands(),
        vec![
            RegistryCommand::PlaceCall { room_id: room.clone(), modality: CallModality::Video },
            RegistryCommand::PlaceCall { room_id: room, modality: CallModality::Video },
        ]
    );
}

#[test]
fn toggle_silenced_queries_then_flips() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");
    grouper.add(script.invite(&remote(), 1_000));

    grouper.toggle_silenced();
    grouper.toggle_silenced();

    assert_eq!(
        registry.commands(),
        vec![
            RegistryCommand::Silence(CallId::from("c1")),
            RegistryCommand::Unsilence(CallId::from("c1")),
        ]
    );
}

#[test]
fn silence_changes_notify_without_touching_state() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let recorder = UpdateRecorder::new();
    grouper.subscribe(recorder.sink());
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));
    let _ = recorder.take();

    registry.set_silenced(CallId::from("c1"), true);
    grouper.on_silenced_calls_changed();

    assert_eq!(recorder.take(), vec![GrouperUpdate::SilencedChanged(true)]);
    assert_eq!(grouper.state(), None);
}

#[test]
fn lifecycle_notification_trace() {
    let registry = SimRegistry::new();
    let mut grouper = grouper_with(&registry);
    let recorder = UpdateRecorder::new();
    grouper.subscribe(recorder.sink());
    let mut script = CallScript::new("c1", "!room:example.org");

    grouper.add(script.invite(&remote(), 1_000));

    let ringing = SimCall::new(LiveCallState::Ringing);
    registry.insert_call(CallId::from("c1"), Arc::clone(&ringing));
    grouper.on_calls_changed();

    grouper.on_call_length_changed(Duration::from_secs(5));

    ringing.set_state(LiveCallState::Ended);
    grouper.on_call_state_changed();

    insta::assert_json_snapshot!(recorder.take(), @r#"
    [
      {
        "StateChanged": null
      },
      {
        "StateChanged": "Ringing"
      },
      {
        "LengthChanged": {
          "secs": 5,
          "nanos": 0
        }
      },
      {
        "StateChanged": "Ended"
      }
    ]
    "#);
}

#[test]
fn map_groups_by_call_id_and_skips_noise() {
    let registry = SimRegistry::new();
    let mut map = map_with(&registry);

    let mut first = CallScript::new("c1", "!room:example.org");
    let mut second = CallScript::new("c2", "!room:example.org");

    let timeline = vec![
        message_event("$m1", "!room:example.org", &remote(), 500),
        first.timeline_invite(&remote(), 1_000, false).expect("encode should succeed"),
        first.timeline_hangup(&remote(), 2_000).expect("encode should succeed"),
        second.timeline_invite(&local(), 3_000, true).expect("encode should succeed"),
        first.timeline_garbage(&remote(), 4_000),
    ];
    map.update(&timeline);

    assert_eq!(map.len(), 2);
    let c1 = map.get(&CallId::from("c1")).expect("grouper for c1");
    assert_eq!(c1.events().len(), 2);
    assert_eq!(c1.state(), Some(CallPhase::Missed));

    let c2 = map.get(&CallId::from("c2")).expect("grouper for c2");
    assert_eq!(c2.is_voice(), Some(false));
}

#[test]
fn map_decodes_every_signal_kind_in_the_window() {
    let registry = SimRegistry::new();
    let mut map = map_with(&registry);
    let mut answered = CallScript::new("c-answered", "!room:example.org");
    let mut rejected = CallScript::new("c-rejected", "!room:example.org");

    let timeline = vec![
        answered.timeline_invite(&remote(), 1_000, false).expect("encode should succeed"),
        answered.timeline_select_answer(&remote(), 2_000).expect("encode should succeed"),
        answered.timeline_hangup(&local(), 62_000).expect("encode should succeed"),
        rejected.timeline_invite(&local(), 5_000, false).expect("encode should succeed"),
        rejected.timeline_reject(&remote(), 6_000).expect("encode should succeed"),
    ];
    map.update(&timeline);

    let answered = map.get(&CallId::from("c-answered")).expect("grouper for c-answered");
    assert_eq!(answered.duration_ms(), Some(60_000));
    assert_eq!(answered.state(), Some(CallPhase::Ended));

    let rejected = map.get(&CallId::from("c-rejected")).expect("grouper for c-rejected");
    assert!(rejected.got_rejected());
    assert_eq!(rejected.reject_party(), Some(&remote()));
    assert_eq!(rejected.state(), Some(CallPhase::Ended));
}

#[test]
fn map_reuses_groupers_for_recurring_call_ids() {
    let registry = SimRegistry::new();
    let mut map = map_with(&registry);
    let mut script = CallScript::new("c1", "!room:example.org");

    let invite = script.timeline_invite(&remote(), 1_000, false).expect("encode should succeed");
    map.update(std::slice::from_ref(&invite));

    let recorder = UpdateRecorder::new();
    map.get_mut(&CallId::from("c1"))
        .expect("grouper for c1")
        .subscribe(recorder.sink());

    // same window entry plus the hangup that just arrived
    let hangup = script.timeline_hangup(&remote(), 2_000).expect("encode should succeed");
    map.update(&[invite, hangup]);

    // the subscription survived the rebuild, so the grouper was reused
    assert_eq!(
        recorder.take(),
        vec![GrouperUpdate::StateChanged(Some(CallPhase::Missed))]
    );
    let c1 = map.get(&CallId::from("c1")).expect("grouper for c1");
    assert_eq!(c1.events().len(), 2);
}

#[test]
fn map_drops_call_ids_outside_the_window() {
    let registry = SimRegistry::new();
    let mut map = map_with(&registry);
    let mut old = CallScript::new("c-old", "!room:example.org");
    let mut new = CallScript::new("c-new", "!room:example.org");

    let old_invite = old.timeline_invite(&remote(), 1_000, false).expect("encode should succeed");
    map.update(std::slice::from_ref(&old_invite));
    assert!(map.get(&CallId::from("c-old")).is_some());

    let new_invite = new.timeline_invite(&remote(), 9_000, false).expect("encode should succeed");
    map.update(std::slice::from_ref(&new_invite));

    assert!(map.get(&CallId::from("c-old")).is_none());
    assert_eq!(map.call_ids().collect::<Vec<_>>(), vec![&CallId::from("c-new")]);
}

#[test]
fn map_routes_session_notifications_by_call_id() {
    let registry = SimRegistry::new();
    let mut map = map_with(&registry);
    let mut first = CallScript::new("c1", "!room:example.org");
    let mut second = CallScript::new("c2", "!room:example.org");

    let timeline = vec![
        first.timeline_invite(&remote(), 1_000, false).expect("encode should succeed"),
        second.timeline_invite(&remote(), 2_000, false).expect("encode should succeed"),
    ];
    map.update(&timeline);

    let first_recorder = UpdateRecorder::new();
    map.get_mut(&CallId::from("c1"))
        .expect("grouper for c1")
        .subscribe(first_recorder.sink());
    let second_recorder = UpdateRecorder::new();
    map.get_mut(&CallId::from("c2"))
        .expect("grouper for c2")
        .subscribe(second_recorder.sink());

    map.on_call_length_changed(&CallId::from("c1"), Duration::from_secs(9));
    // unknown ids are ignored
    map.on_call_length_changed(&CallId::from("c-unknown"), Duration::from_secs(1));

    assert_eq!(
        first_recorder.take(),
        vec![GrouperUpdate::LengthChanged(Duration::from_secs(9))]
    );
    assert!(second_recorder.is_empty());
}
