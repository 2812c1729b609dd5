//! Command-line interface
//!
//! Argument parsing and command dispatch for the `trafficlight` binary.

pub mod args;
pub mod commands;
