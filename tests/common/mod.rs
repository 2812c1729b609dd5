//! Shared integration-test helpers for running the `trafficlight` binary
//! and building fast-cycling lights.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Duration;

use trafficlight::{CyclerConfig, DwellRange};

/// Runs the binary with `args` and waits for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trafficlight"))
        .args(args)
        .env_remove("TRAFFICLIGHT_CONFIG")
        .env_remove("TRAFFICLIGHT_SEED")
        .env("TRAFFICLIGHT_LOG_LEVEL", "error")
        .output()
        .expect("failed to spawn trafficlight")
}

/// Runs the binary with `args` and the default log filter.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command_with_logs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trafficlight"))
        .args(args)
        .env_remove("TRAFFICLIGHT_CONFIG")
        .env_remove("TRAFFICLIGHT_LOG_LEVEL")
        .env("TRAFFICLIGHT_COLOR", "never")
        .output()
        .expect("failed to spawn trafficlight")
}

/// Absolute path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Cycler config with a millisecond dwell range and a fixed seed.
#[allow(clippy::missing_panics_doc)]
pub fn fast_cycler(min_ms: u64, max_ms: u64) -> CyclerConfig {
    CyclerConfig {
        dwell: DwellRange::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
            .expect("valid dwell range"),
        seed: Some(17),
    }
}
