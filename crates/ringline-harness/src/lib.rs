//! Deterministic test doubles for Ringline call grouping.
//!
//! Scripted implementations of the production traits so grouper behavior
//! can be pinned down without the real call-handling layer:
//!
//! - [`SimRegistry`] / [`SimCall`]: a scripted registry with a settable
//!   id → session mapping, a silence set, and a recorded command log for
//!   assertions.
//! - [`CallScript`]: builders minting the signal events (decoded or
//!   CBOR-encoded timeline form) of one call attempt.
//! - [`UpdateRecorder`]: an observer that buffers every notification a
//!   grouper emits.
//!
//! Everything here is synchronous; determinism comes from fixed fixtures,
//! not seeded randomness.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builders;
mod recorder;
mod sim_registry;

pub use builders::{CallScript, VIDEO_OFFER_SDP, VOICE_OFFER_SDP, message_event};
pub use recorder::UpdateRecorder;
pub use sim_registry::{RegistryCommand, SimCall, SimRegistry};
