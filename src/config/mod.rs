//! Configuration module
//!
//! Handles loading and validation of `trafficlight` YAML configuration
//! files describing the light's dwell range and the vehicles around it.

pub mod loader;
pub mod schema;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning};
pub use schema::*;
