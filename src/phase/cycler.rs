//! Phase cycler orchestration.
//!
//! The `PhaseCycler` owns the current phase, the phase channel, and the
//! background thread that flips the phase after each randomized dwell.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::channel::Channel;
use crate::error::PhaseError;
use crate::observability::metrics;

use super::dwell::DwellRange;
use super::state::{Phase, PhaseCell, PhaseTransition};

/// Phase every cycler starts in.
pub const INITIAL_PHASE: Phase = Phase::Red;

/// Settings for a single cycler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CyclerConfig {
    /// Range each dwell is sampled from
    pub dwell: DwellRange,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

/// State shared between the cycler handle and its background thread.
struct Shared {
    id: u64,
    current: PhaseCell,
    channel: Channel<Phase>,
    transitions: AtomicU64,
    /// Set once by `stop()`; never cleared
    stopped: Mutex<bool>,
    stop_signal: Condvar,
}

impl Shared {
    fn stopped_guard(&self) -> MutexGuard<'_, bool> {
        // A bare flag cannot be left inconsistent, so poisoning is ignored.
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stopped(&self) -> bool {
        *self.stopped_guard()
    }

    /// Suspends for `dwell` unless stopped first. Returns `true` if stopped.
    fn sleep_unless_stopped(&self, dwell: Duration) -> bool {
        let guard = self.stopped_guard();
        let (guard, _) = self
            .stop_signal
            .wait_timeout_while(guard, dwell, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Cycling loop run on the background thread.
    fn cycle(&self, dwell: DwellRange, mut rng: StdRng) {
        loop {
            let wait = dwell.sample(&mut rng);
            trace!(light = self.id, dwell_ms = wait.as_millis(), "dwelling");

            if self.sleep_unless_stopped(wait) {
                debug!(light = self.id, "phase cycler cancelled");
                break;
            }

            let sequence = self.transitions.fetch_add(1, Ordering::SeqCst) + 1;
            let transition = PhaseTransition::after(self.current.load(), sequence, wait);

            // Publish to the query cell before the channel so a woken
            // receiver never observes the old phase via `current_phase()`.
            self.current.store(transition.to);
            metrics::record_phase_transition(self.id, &transition);
            info!(
                light = self.id,
                from = %transition.from,
                to = %transition.to,
                sequence,
                dwell_ms = wait.as_millis(),
                "phase transition"
            );
            self.channel.send(transition.to);
        }
    }
}

/// Traffic light state machine.
///
/// Starts in [`Phase::Red`]. After [`start`](Self::start), a background
/// thread alternates the phase after each dwell sampled from the configured
/// [`DwellRange`] and publishes every new phase through a single-slot
/// latest-wins [`Channel`].
///
/// Readers use [`current_phase`](Self::current_phase) for a non-blocking
/// query and [`wait_for_green`](Self::wait_for_green) to block on the next
/// green delivery. Concurrent waiters compete for deliveries: each delivered
/// phase wakes at most one of them.
///
/// The background thread stops on [`stop`](Self::stop) or when the cycler
/// is dropped.
pub struct PhaseCycler {
    shared: Arc<Shared>,
    config: CyclerConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PhaseCycler {
    /// Creates a stopped cycler in the initial red phase.
    #[must_use]
    pub fn new(id: u64, config: CyclerConfig) -> Self {
        metrics::set_current_phase(id, INITIAL_PHASE);
        Self {
            shared: Arc::new(Shared {
                id,
                current: PhaseCell::new(INITIAL_PHASE),
                channel: Channel::new(),
                transitions: AtomicU64::new(0),
                stopped: Mutex::new(false),
                stop_signal: Condvar::new(),
            }),
            config,
            worker: Mutex::new(None),
        }
    }

    /// Returns the light's id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Returns the configuration this cycler was built with.
    #[must_use]
    pub const fn config(&self) -> &CyclerConfig {
        &self.config
    }

    /// Launches the cycling thread.
    ///
    /// Calling `start` on a running cycler is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::Stopped` if the cycler was already stopped, or
    /// `PhaseError::Spawn` if the OS refused to create the thread.
    pub fn start(&self) -> Result<(), PhaseError> {
        let mut worker = self.worker_guard();
        if self.shared.is_stopped() {
            return Err(PhaseError::Stopped(self.shared.id));
        }
        if worker.is_some() {
            debug!(light = self.shared.id, "phase cycler already running");
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let dwell = self.config.dwell;
        let rng = self
            .config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let handle = thread::Builder::new()
            .name(format!("traffic-light-{}", self.shared.id))
            .spawn(move || shared.cycle(dwell, rng))
            .map_err(PhaseError::Spawn)?;
        *worker = Some(handle);

        info!(light = self.shared.id, %dwell, "phase cycler started");
        Ok(())
    }

    /// Stops the cycling thread and waits for it to exit.
    ///
    /// Idempotent. A stopped cycler cannot be restarted.
    pub fn stop(&self) {
        *self.shared.stopped_guard() = true;
        self.shared.stop_signal.notify_all();

        let handle = self.worker_guard().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(light = self.shared.id, "phase cycler thread panicked");
            } else {
                info!(
                    light = self.shared.id,
                    transitions = self.transitions(),
                    "phase cycler stopped"
                );
            }
        }
    }

    /// Returns whether the cycling thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker_guard().is_some() && !self.shared.is_stopped()
    }

    /// Returns the most recently set phase without blocking.
    ///
    /// This may run slightly ahead of what waiters have received through
    /// the channel.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.shared.current.load()
    }

    /// Number of transitions performed so far.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.shared.transitions.load(Ordering::SeqCst)
    }

    /// The channel phase changes are published on.
    #[must_use]
    pub fn channel(&self) -> &Channel<Phase> {
        &self.shared.channel
    }

    /// Blocks until a green phase is delivered.
    ///
    /// Red deliveries are discarded. Blocks forever if the cycler is never
    /// started.
    pub fn wait_for_green(&self) {
        self.wait_for_phase(Phase::Green);
    }

    /// Blocks until `target` is delivered, discarding any other phase.
    pub fn wait_for_phase(&self, target: Phase) {
        loop {
            let phase = self.shared.channel.receive();
            if phase == target {
                return;
            }
            trace!(light = self.shared.id, %phase, %target, "discarding phase");
        }
    }

    /// Like [`wait_for_green`](Self::wait_for_green), bounded by `timeout`.
    ///
    /// Returns `true` if green was received before the deadline.
    #[must_use]
    pub fn wait_for_green_timeout(&self, timeout: Duration) -> bool {
        self.wait_for_phase_timeout(Phase::Green, timeout)
    }

    /// Like [`wait_for_phase`](Self::wait_for_phase), bounded by `timeout`.
    ///
    /// Returns `true` if `target` was received before the deadline.
    #[must_use]
    pub fn wait_for_phase_timeout(&self, target: Phase, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            let Some(remaining) = timeout.checked_sub(start.elapsed()) else {
                return false;
            };
            match self.shared.channel.receive_timeout(remaining) {
                Some(phase) if phase == target => return true,
                Some(phase) => {
                    trace!(light = self.shared.id, %phase, %target, "discarding phase");
                }
                None => return false,
            }
        }
    }

    fn worker_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PhaseCycler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PhaseCycler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseCycler")
            .field("id", &self.shared.id)
            .field("current_phase", &self.current_phase())
            .field("transitions", &self.transitions())
            .field("dwell", &self.config.dwell)
            .finish_non_exhaustive()
    }
}
