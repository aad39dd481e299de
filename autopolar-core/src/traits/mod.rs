//! Capability traits
//!
//! These traits define the interface between the alignment logic and the
//! mount, the plate solver, the clock and whoever watches the run.

pub mod mount;
pub mod observer;
pub mod solver;
pub mod timebase;

pub use mount::{Mount, MountError};
pub use observer::{AlignEvent, AlignObserver};
pub use solver::{PlateSolver, SolverError};
pub use timebase::Timebase;
