//! Traffic light phase state machine
//!
//! A light alternates between green and red after randomized dwell times
//! and publishes every change through a single-slot [`Channel`](crate::channel::Channel).
//!
//! # Architecture
//!
//! - [`Phase`] / [`PhaseCell`]: Phase values and the lock-free current-phase cell
//! - [`DwellRange`]: Uniform dwell sampling over a closed millisecond range
//! - [`PhaseCycler`]: Background cycling thread plus query and wait operations

pub mod cycler;
pub mod dwell;
pub mod state;

pub use cycler::{CyclerConfig, INITIAL_PHASE, PhaseCycler};
pub use dwell::{DEFAULT_MAX_DWELL, DEFAULT_MIN_DWELL, DwellRange, parse_duration};
pub use state::{Phase, PhaseCell, PhaseTransition};
