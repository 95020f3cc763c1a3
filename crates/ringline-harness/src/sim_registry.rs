//! Scripted call-registry double.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use ringline_core::{CallModality, CallRegistry, LiveCall, LiveCallState};
use ringline_proto::{CallId, RoomId};

/// Lock a mutex, recovering from poisoning.
///
/// A poisoned lock in a test double only means an earlier test panicked;
/// the guarded state is still the best available answer.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Command observed by the scripted registry, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCommand {
    /// `answer` was invoked for a room.
    Answer(RoomId),
    /// `hangup_or_reject` was invoked for a room.
    HangupOrReject {
        /// Target room.
        room_id: RoomId,
        /// True when the call was rejected rather than hung up.
        reject: bool,
    },
    /// `place_call` was invoked for a room.
    PlaceCall {
        /// Target room.
        room_id: RoomId,
        /// Requested modality.
        modality: CallModality,
    },
    /// `silence` was invoked for a call.
    Silence(CallId),
    /// `unsilence` was invoked for a call.
    Unsilence(CallId),
}

/// Scripted live call session with settable state and hangup reason.
#[derive(Debug)]
pub struct SimCall {
    state: Mutex<LiveCallState>,
    hangup_reason: Mutex<Option<String>>,
}

impl SimCall {
    /// Create a session in the given state.
    #[must_use]
    pub fn new(state: LiveCallState) -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(state), hangup_reason: Mutex::new(None) })
    }

    /// Script the current lifecycle state.
    pub fn set_state(&self, state: LiveCallState) {
        *lock(&self.state) = state;
    }

    /// Script the hangup reason the session reports.
    pub fn set_hangup_reason(&self, reason: impl Into<String>) {
        *lock(&self.hangup_reason) = Some(reason.into());
    }
}

impl LiveCall for SimCall {
    fn state(&self) -> LiveCallState {
        *lock(&self.state)
    }

    fn hangup_reason(&self) -> Option<String> {
        lock(&self.hangup_reason).clone()
    }
}

/// Scripted call-handling registry.
///
/// Tests script the id → session mapping and the silence set up front (or
/// mid-scenario), drive the grouper, and assert on the recorded commands.
#[derive(Debug, Default)]
pub struct SimRegistry {
    calls: Mutex<HashMap<CallId, Arc<SimCall>>>,
    silenced: Mutex<HashSet<CallId>>,
    commands: Mutex<Vec<RegistryCommand>>,
}

impl SimRegistry {
    /// Create an empty registry: no live sessions, nothing silenced.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script a live session for a call id.
    pub fn insert_call(&self, call_id: CallId, call: Arc<SimCall>) {
        lock(&self.calls).insert(call_id, call);
    }

    /// Remove a scripted session.
    pub fn remove_call(&self, call_id: &CallId) {
        lock(&self.calls).remove(call_id);
    }

    /// Script the silenced flag for a call id.
    pub fn set_silenced(&self, call_id: CallId, silenced: bool) {
        if silenced {
            lock(&self.silenced).insert(call_id);
        } else {
            lock(&self.silenced).remove(&call_id);
        }
    }

    /// Commands observed so far, in invocation order.
    #[must_use]
    pub fn commands(&self) -> Vec<RegistryCommand> {
        lock(&self.commands).clone()
    }

    fn record(&self, command: RegistryCommand) {
        lock(&self.commands).push(command);
    }
}

impl CallRegistry for SimRegistry {
    fn call_by_id(&self, call_id: &CallId) -> Option<Arc<dyn LiveCall>> {
        lock(&self.calls).get(call_id).cloned().map(|call| call as Arc<dyn LiveCall>)
    }

    fn answer(&self, room_id: &RoomId) {
        self.record(RegistryCommand::Answer(room_id.clone()));
    }

    fn hangup_or_reject(&self, room_id: &RoomId, reject: bool) {
        self.record(RegistryCommand::HangupOrReject { room_id: room_id.clone(), reject });
    }

    fn place_call(&self, room_id: &RoomId, modality: CallModality) {
        self.record(RegistryCommand::PlaceCall { room_id: room_id.clone(), modality });
    }

    fn is_silenced(&self, call_id: &CallId) -> bool {
        lock(&self.silenced).contains(call_id)
    }

    fn silence(&self, call_id: &CallId) {
        lock(&self.silenced).insert(call_id.clone());
        self.record(RegistryCommand::Silence(call_id.clone()));
    }

    fn unsilence(&self, call_id: &CallId) {
        lock(&self.silenced).remove(call_id);
        self.record(RegistryCommand::Unsilence(call_id.clone()));
    }
}
