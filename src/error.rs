//! Error types for `trafficlight`
//!
//! The channel and the phase cycler have no recoverable failure modes while
//! running; the errors here cover lifecycle misuse, configuration loading,
//! and the CLI surface.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `trafficlight` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Phase cycler error (spawn failure, restart after stop)
    pub const PHASE_ERROR: i32 = 5;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `trafficlight` operations.
///
/// Aggregates the domain-specific errors and maps each to an exit code.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Phase cycler lifecycle error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Simulation orchestration error
    #[error(transparent)]
    Sim(#[from] SimError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrafficError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Phase(_) | Self::Sim(SimError::Phase(_)) => ExitCode::PHASE_ERROR,
            Self::Sim(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML or duration parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Phase Errors
// ============================================================================

/// Phase cycler errors.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// The background cycling thread could not be spawned
    #[error("failed to spawn phase cycler thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// `start()` was called on a cycler that has already been stopped
    #[error("phase cycler {0} has been stopped and cannot be restarted")]
    Stopped(u64),

    /// Dwell range bounds are unusable
    #[error("invalid dwell range: {0}")]
    InvalidDwell(String),
}

// ============================================================================
// Simulation Errors
// ============================================================================

/// Errors raised while starting simulated objects.
#[derive(Debug, Error)]
pub enum SimError {
    /// A traffic light failed to start
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// A collaborator thread could not be spawned
    #[error("failed to spawn {kind} {id}: {source}")]
    Spawn {
        /// Kind of object being started
        kind: String,
        /// Object id
        id: u64,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// `simulate()` was called on an object that has already been stopped
    #[error("{kind} {id} has been stopped and cannot be restarted")]
    Stopped {
        /// Kind of object
        kind: String,
        /// Object id
        id: u64,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `trafficlight` operations.
pub type Result<T> = std::result::Result<T, TrafficError>;

// ============================================================================
// Tests
// ============================================================================
