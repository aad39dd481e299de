//! Configuration types
//!
//! Immutable alignment settings. Every component receives its own copy at
//! construction; nothing mutates configuration mid-run.

pub mod settings;

pub use settings::*;
