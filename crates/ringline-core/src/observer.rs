//! Observer registration and notifications.
//!
//! Observers are plain callbacks registered explicitly on a grouper, in
//! place of emitter-base-class machinery. Delivery is synchronous and in
//! registration order, inline in whatever mutation produced the
//! notification: from the caller's perspective the recomputation and its
//! notification are one atomic step.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::CallPhase;

/// Notification delivered to grouper observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GrouperUpdate {
    /// Derived state was recomputed. Carries the new state, which may equal
    /// the previous one. Emission is unconditional and observers
    /// de-duplicate if they care.
    StateChanged(Option<CallPhase>),

    /// Silence status for the call flipped.
    SilencedChanged(bool),

    /// The live session reported a new elapsed call length.
    LengthChanged(Duration),
}

/// Subscriber list with synchronous, registration-order delivery.
#[derive(Default)]
pub struct ObserverSet {
    subscribers: Vec<Box<dyn FnMut(&GrouperUpdate)>>,
}

impl ObserverSet {
    /// Register a subscriber.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&GrouperUpdate) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Deliver one update to every subscriber, in registration order.
    pub fn notify(&mut self, update: &GrouperUpdate) {
        for subscriber in &mut self.subscribers {
            subscriber(update);
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True if nobody subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet").field("subscribers", &self.subscribers.len()).finish()
    }
}
