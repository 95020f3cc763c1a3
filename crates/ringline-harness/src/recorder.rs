//! Observer double buffering grouper notifications.

use std::{cell::RefCell, rc::Rc};

use ringline_core::GrouperUpdate;

/// Buffers every notification a grouper emits.
///
/// Clone-shared: register [`UpdateRecorder::sink`] with
/// `CallEventGrouper::subscribe`, keep the recorder, and assert on
/// [`UpdateRecorder::take`]. Single-threaded on purpose - observer
/// callbacks run inline on the UI thread.
#[derive(Debug, Default, Clone)]
pub struct UpdateRecorder {
    updates: Rc<RefCell<Vec<GrouperUpdate>>>,
}

impl UpdateRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber closure to register with a grouper.
    #[must_use]
    pub fn sink(&self) -> impl FnMut(&GrouperUpdate) + 'static {
        let updates = Rc::clone(&self.updates);
        move |update: &GrouperUpdate| updates.borrow_mut().push(update.clone())
    }

    /// Updates observed so far, clearing the buffer.
    pub fn take(&self) -> Vec<GrouperUpdate> {
        self.updates.borrow_mut().drain(..).collect()
    }

    /// Updates observed so far, leaving the buffer intact.
    #[must_use]
    pub fn snapshot(&self) -> Vec<GrouperUpdate> {
        self.updates.borrow().clone()
    }

    /// Number of updates in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.borrow().len()
    }

    /// True if nothing was observed since the last `take`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.borrow().is_empty()
    }
}
