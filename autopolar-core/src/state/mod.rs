//! State machine for an alignment run
//!
//! Explicit, finite and deterministic. The aligner drives it with events
//! and reports every transition to its observer.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{FailureKind, State};
