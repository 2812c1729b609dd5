//! Dwell-time sampling.
//!
//! A light stays in each phase for a dwell drawn uniformly from a closed
//! millisecond range, resampled every cycle.

use std::time::Duration;

use rand::Rng;

use crate::error::PhaseError;

/// Default lower dwell bound.
pub const DEFAULT_MIN_DWELL: Duration = Duration::from_millis(4000);

/// Default upper dwell bound.
pub const DEFAULT_MAX_DWELL: Duration = Duration::from_millis(6000);

/// Closed range of dwell durations, at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellRange {
    min: Duration,
    max: Duration,
}

impl DwellRange {
    /// Creates a range, rejecting a zero lower bound or inverted bounds.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::InvalidDwell` if `min` is zero or `min > max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, PhaseError> {
        if min.is_zero() {
            return Err(PhaseError::InvalidDwell(
                "minimum dwell must be greater than zero".to_string(),
            ));
        }
        if min > max {
            return Err(PhaseError::InvalidDwell(format!(
                "minimum dwell {} exceeds maximum {}",
                humantime::format_duration(min),
                humantime::format_duration(max)
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Draws a dwell uniformly from `[min, max]` in whole milliseconds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = millis(self.min);
        let hi = millis(self.max).max(lo);
        Duration::from_millis(rng.random_range(lo..=hi))
    }
}

impl Default for DwellRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DWELL,
            max: DEFAULT_MAX_DWELL,
        }
    }
}

impl std::fmt::Display for DwellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..={}",
            humantime::format_duration(self.min),
            humantime::format_duration(self.max)
        )
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Parses a human-readable duration such as `"4s"`, `"250ms"` or `"1m 30s"`.
///
/// # Errors
///
/// Returns `PhaseError::InvalidDwell` if the string is not a valid duration.
pub fn parse_duration(s: &str) -> Result<Duration, PhaseError> {
    humantime::parse_duration(s.trim())
        .map_err(|e| PhaseError::InvalidDwell(format!("invalid duration '{s}': {e}")))
}
