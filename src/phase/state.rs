//! Phase values and the atomic cell that backs the current phase.
//!
//! The current phase is read by arbitrary threads without blocking, while
//! transitions are published separately through the phase channel.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Signal shown by a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Traffic may proceed
    Green,
    /// Traffic must wait
    Red,
}

impl Phase {
    /// Returns the opposite phase.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Green => Self::Red,
            Self::Red => Self::Green,
        }
    }

    /// Lowercase name, used for log fields and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Red => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        if bits == 0 { Self::Green } else { Self::Red }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free cell holding a [`Phase`].
///
/// Written only by the cycling thread; read from anywhere.
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    /// Creates a cell holding `phase`.
    #[must_use]
    pub const fn new(phase: Phase) -> Self {
        Self(AtomicU8::new(phase.to_bits()))
    }

    /// Returns the stored phase.
    #[must_use]
    pub fn load(&self) -> Phase {
        Phase::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Replaces the stored phase.
    pub fn store(&self, phase: Phase) {
        self.0.store(phase.to_bits(), Ordering::Release);
    }
}

impl std::fmt::Debug for PhaseCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PhaseCell").field(&self.load()).finish()
    }
}

/// Record of a single phase change, emitted to log and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase we transitioned from
    pub from: Phase,
    /// Phase we transitioned to
    pub to: Phase,
    /// 1-based transition counter
    pub sequence: u64,
    /// Sampled dwell that preceded this transition
    pub dwell: Duration,
}

impl PhaseTransition {
    /// Builds the transition that follows `from` after `dwell`.
    #[must_use]
    pub const fn after(from: Phase, sequence: u64, dwell: Duration) -> Self {
        Self {
            from,
            to: from.toggled(),
            sequence,
            dwell,
        }
    }
}
