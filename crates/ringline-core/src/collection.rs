//! Grouper collection keyed by call id.
//!
//! The timeline pane re-renders from a sliding window of events. On each
//! update the map is rebuilt from that window: recurring call ids keep
//! their existing grouper (so observer subscriptions and the attached
//! session survive), new ids get a fresh grouper, and ids with no events
//! left in the window are dropped. Dropping is the disposal story: a
//! dropped grouper leaves the fan-out set and stops receiving
//! notifications.

use std::{collections::HashMap, sync::Arc, time::Duration};

use ringline_proto::{CallId, CallSignalEvent, TimelineEvent, UserId, is_call_event};
use tracing::{debug, warn};

use crate::{CallEventGrouper, CallRegistry};

/// Call-id keyed groupers over the visible timeline window.
pub struct GrouperMap {
    registry: Arc<dyn CallRegistry>,
    local_user: UserId,
    groupers: HashMap<CallId, CallEventGrouper>,
}

impl GrouperMap {
    /// Create an empty map.
    ///
    /// The registry handle and local user identity are passed through to
    /// every grouper the map constructs.
    pub fn new(registry: Arc<dyn CallRegistry>, local_user: UserId) -> Self {
        Self { registry, local_user, groupers: HashMap::new() }
    }

    /// Rebuild from the visible timeline window.
    ///
    /// Only entries matching the call-event predicate participate; an
    /// entry that fails to decode is logged and skipped, never fatal.
    pub fn update(&mut self, timeline: &[TimelineEvent]) {
        let mut next: HashMap<CallId, CallEventGrouper> = HashMap::new();

        for event in timeline {
            if !is_call_event(event) {
                continue;
            }
            let signal = match CallSignalEvent::decode(event) {
                Ok(signal) => signal,
                Err(error) => {
                    warn!(event = %event.event_id, %error, "skipping undecodable call event");
                    continue;
                },
            };

            let call_id = signal.call_id().clone();
            let grouper = next.entry(call_id.clone()).or_insert_with(|| {
                self.groupers.remove(&call_id).unwrap_or_else(|| {
                    debug!(call = %call_id, "grouping events for a new call");
                    CallEventGrouper::new(Arc::clone(&self.registry), self.local_user.clone())
                })
            });
            grouper.add(signal);
        }

        if !self.groupers.is_empty() {
            debug!(count = self.groupers.len(), "dropping groupers outside the timeline window");
        }
        self.groupers = next;
    }

    /// Grouper for a call id.
    #[must_use]
    pub fn get(&self, call_id: &CallId) -> Option<&CallEventGrouper> {
        self.groupers.get(call_id)
    }

    /// Mutable grouper for a call id (subscription, notification entry
    /// points).
    #[must_use]
    pub fn get_mut(&mut self, call_id: &CallId) -> Option<&mut CallEventGrouper> {
        self.groupers.get_mut(call_id)
    }

    /// Number of calls in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groupers.len()
    }

    /// True if the window holds no calls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groupers.is_empty()
    }

    /// Call ids currently in the window, in no particular order.
    pub fn call_ids(&self) -> impl Iterator<Item = &CallId> {
        self.groupers.keys()
    }

    /// The registry's set of active sessions changed; fan out.
    pub fn on_calls_changed(&mut self) {
        for grouper in self.groupers.values_mut() {
            grouper.on_calls_changed();
        }
    }

    /// The registry's set of silenced calls changed; fan out.
    pub fn on_silenced_calls_changed(&mut self) {
        for grouper in self.groupers.values_mut() {
            grouper.on_silenced_calls_changed();
        }
    }

    /// A live session reported a lifecycle state change. Unknown call ids
    /// are ignored.
    pub fn on_call_state_changed(&mut self, call_id: &CallId) {
        if let Some(grouper) = self.groupers.get_mut(call_id) {
            grouper.on_call_state_changed();
        }
    }

    /// A live session reported a new elapsed length. Unknown call ids are
    /// ignored.
    pub fn on_call_length_changed(&mut self, call_id: &CallId, length: Duration) {
        if let Some(grouper) = self.groupers.get_mut(call_id) {
            grouper.on_call_length_changed(length);
        }
    }
}
