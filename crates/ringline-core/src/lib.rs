//! Call-event grouping and derived call state for Ringline.
//!
//! Legacy 1:1 calls leave a trail of signal events in the room timeline.
//! This crate coalesces that trail, per call attempt, into the single
//! derived status the UI renders on a call tile, and keeps it live by
//! folding in state changes from the call session the external
//! call-handling layer may be running for the same call id.
//!
//! # Components
//!
//! - [`CallEventGrouper`]: per-call aggregator (event set, live-call
//!   attachment, derived state, observer notification)
//! - [`GrouperMap`]: call-id keyed collection rebuilt on timeline updates
//! - [`CallRegistry`] / [`LiveCall`]: injected contracts of the external
//!   call-handling layer
//!
//! The whole layer is synchronous and single-threaded: every notification
//! is delivered inline in the mutation that produced it, and nothing here
//! returns an error. Missing upstream data degrades to `None` sentinels.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod collection;
mod grouper;
mod observer;
mod phase;
mod registry;

pub use collection::GrouperMap;
pub use grouper::CallEventGrouper;
pub use observer::{GrouperUpdate, ObserverSet};
pub use phase::CallPhase;
pub use registry::{CallModality, CallRegistry, LiveCall, LiveCallState};
