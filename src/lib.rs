//! `trafficlight` - Traffic light actor with a single-slot phase channel
//!
//! A [`PhaseCycler`](phase::PhaseCycler) alternates between green and red
//! on a background thread after randomized dwell times, publishing every
//! change through a latest-wins [`Channel`](channel::Channel). Other threads
//! query the current phase without blocking or block until the next green.

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod phase;
pub mod sim;

pub use channel::Channel;
pub use phase::{CyclerConfig, DwellRange, Phase, PhaseCycler};
