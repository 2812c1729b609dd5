//! Logging initialization for `trafficlight`.
//!
//! Lights and vehicles each run on their own named thread, so every event
//! carries the thread name (`traffic-light-1`, `vehicle-3`) and a timestamp
//! relative to process start, which makes dwell times readable straight off
//! the log. Verbosity applies to this crate only; dependencies (the
//! Prometheus exporter's HTTP stack in particular) stay at `warn` unless
//! `TRAFFICLIGHT_LOG_LEVEL` says otherwise.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::uptime;

use crate::cli::args::ColorChoice;

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_LEVEL_ENV: &str = "TRAFFICLIGHT_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON with event fields flattened to the top level.
    Json,
}

/// Maps `-v` count to a level for this crate's events; saturates at trace.
#[must_use]
pub const fn verbosity_to_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Default directive: dependencies at `warn`, this crate at the `-v` level.
#[must_use]
pub fn default_directive(verbosity: u8) -> String {
    format!(
        "warn,{}={}",
        env!("CARGO_CRATE_NAME"),
        verbosity_to_level(verbosity)
    )
}

/// Builds the event filter; a valid `TRAFFICLIGHT_LOG_LEVEL` replaces the default.
#[must_use]
pub fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Resolves `--color` against the terminal and `NO_COLOR`.
const fn use_ansi(color: ColorChoice, stderr_is_terminal: bool, no_color: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_terminal && !no_color,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber writing to stderr.
///
/// Targets are shown from `-vv` upwards. Uses `try_init()`, so a second call
/// leaves the first subscriber in place.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = build_filter(verbosity);
    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let ansi = use_ansi(
                color,
                std::io::stderr().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
            );
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(uptime())
                .with_ansi(ansi)
                .with_target(show_target)
                .with_thread_names(true)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_env_filter(filter)
                .with_timer(uptime())
                .with_target(show_target)
                .with_thread_names(true)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
