//! Observability module
//!
//! Logging and metrics for monitoring lights and vehicles.

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
