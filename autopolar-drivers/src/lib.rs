//! Capability implementations for autopolar
//!
//! This crate provides concrete implementations of the traits defined
//! in autopolar-core:
//!
//! - Simulated rig (sky model shared by a mount and a plate solver)
//! - Virtual clock for simulations and tests
//! - Mount adapter reversing axis directions

#![deny(unsafe_code)]

pub mod clock;
pub mod mount;
pub mod sim;

pub use clock::VirtualClock;
pub use mount::ReversedMount;
pub use sim::{RigConfig, SimulatedMount, SimulatedSolver, SkyModel};
