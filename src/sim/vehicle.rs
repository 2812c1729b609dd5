//! Vehicle collaborator
//!
//! A vehicle repeatedly travels towards its light, and on arrival either
//! crosses straight away (green) or blocks until the light turns green.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::observability::metrics;
use crate::phase::{DwellRange, Phase, PhaseCycler};

use super::{ObjectKind, TrafficObject};

/// Upper bound on a single blocking wait, so cancellation is observed.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Settings for a single vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleConfig {
    /// Range the time between arrivals is sampled from
    pub travel: DwellRange,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            travel: DwellRange::new(Duration::from_millis(500), Duration::from_secs(2))
                .unwrap_or_default(),
            seed: None,
        }
    }
}

/// A vehicle that crosses its light only on green.
pub struct Vehicle {
    id: u64,
    light: Arc<PhaseCycler>,
    config: VehicleConfig,
    crossings: Arc<AtomicU64>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Vehicle {
    /// Creates an idle vehicle approaching `light`.
    #[must_use]
    pub fn new(id: u64, light: Arc<PhaseCycler>, config: VehicleConfig) -> Self {
        Self {
            id,
            light,
            config,
            crossings: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
            worker: Mutex::new(None),
        }
    }

    /// Number of times this vehicle has crossed.
    #[must_use]
    pub fn crossings(&self) -> u64 {
        self.crossings.load(Ordering::SeqCst)
    }

    /// Id of the light this vehicle waits on.
    #[must_use]
    pub fn light_id(&self) -> u64 {
        self.light.id()
    }

    fn start(&self) -> Result<(), SimError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            return Err(SimError::Stopped {
                kind: ObjectKind::Vehicle.to_string(),
                id: self.id,
            });
        }
        if worker.is_some() {
            return Ok(());
        }

        let trip = Trip {
            vehicle: self.id,
            light: Arc::clone(&self.light),
            travel: self.config.travel,
            crossings: Arc::clone(&self.crossings),
            cancel: self.cancel.clone(),
        };
        let rng = self
            .config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let handle = thread::Builder::new()
            .name(format!("vehicle-{}", self.id))
            .spawn(move || trip.drive(rng))
            .map_err(|source| SimError::Spawn {
                kind: ObjectKind::Vehicle.to_string(),
                id: self.id,
                source,
            })?;
        *worker = Some(handle);
        debug!(vehicle = self.id, light = self.light.id(), "vehicle started");
        Ok(())
    }

    fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!(vehicle = self.id, "vehicle thread panicked");
            }
        }
    }
}

impl TrafficObject for Vehicle {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Vehicle
    }

    fn simulate(&self) -> Result<(), SimError> {
        self.start()
    }

    fn stop(&self) {
        self.shutdown();
    }
}

impl Drop for Vehicle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vehicle")
            .field("id", &self.id)
            .field("light", &self.light.id())
            .field("crossings", &self.crossings())
            .finish_non_exhaustive()
    }
}

/// State moved onto the vehicle thread.
struct Trip {
    vehicle: u64,
    light: Arc<PhaseCycler>,
    travel: DwellRange,
    crossings: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl Trip {
    fn drive(&self, mut rng: StdRng) {
        while self.travel_for(self.travel.sample(&mut rng)) {
            debug!(vehicle = self.vehicle, light = self.light.id(), "approaching light");

            if self.light.current_phase() == Phase::Red {
                let started = Instant::now();
                if !self.await_green() {
                    break;
                }
                metrics::record_green_wait(started.elapsed());
            }

            let total = self.crossings.fetch_add(1, Ordering::SeqCst) + 1;
            metrics::record_vehicle_crossing();
            info!(
                vehicle = self.vehicle,
                light = self.light.id(),
                crossings = total,
                "crossed on green"
            );
        }
        debug!(vehicle = self.vehicle, "vehicle stopped");
    }

    /// Parks for `duration`. Returns `false` if cancelled.
    fn travel_for(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }

    /// Blocks until green in bounded slices. Returns `false` if cancelled.
    ///
    /// Vehicles waiting on the same light compete for each channel delivery,
    /// so the phase cell is checked every slice as well.
    fn await_green(&self) -> bool {
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            if self.light.current_phase() == Phase::Green
                || self.light.wait_for_green_timeout(WAIT_SLICE)
            {
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::CyclerConfig;

    fn light(min_ms: u64, max_ms: u64) -> Arc<PhaseCycler> {
        Arc::new(PhaseCycler::new(
            1,
            CyclerConfig {
                dwell: DwellRange::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
                    .unwrap(),
                seed: Some(3),
            },
        ))
    }

    fn quick_trips() -> VehicleConfig {
        VehicleConfig {
            travel: DwellRange::new(Duration::from_millis(5), Duration::from_millis(10)).unwrap(),
            seed: Some(9),
        }
    }

    #[test]
    fn test_default_travel_range() {
        let config = VehicleConfig::default();
        assert_eq!(config.travel.min(), Duration::from_millis(500));
        assert_eq!(config.travel.max(), Duration::from_secs(2));
    }

    #[test]
    fn test_vehicle_blocks_while_light_idle() {
        let light = light(10, 10);
        let vehicle = Vehicle::new(2, Arc::clone(&light), quick_trips());
        vehicle.simulate().unwrap();

        // Light never started: stays red, no green is ever delivered
        thread::sleep(Duration::from_millis(100));
        assert_eq!(vehicle.crossings(), 0);

        let start = Instant::now();
        vehicle.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_vehicle_crosses_once_light_runs() {
        let light = light(10, 20);
        let vehicle = Vehicle::new(2, Arc::clone(&light), quick_trips());
        light.start().unwrap();
        vehicle.simulate().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while vehicle.crossings() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        vehicle.stop();
        light.stop();
        assert!(vehicle.crossings() >= 1);
    }

    #[test]
    fn test_stop_during_long_travel() {
        let light = light(10, 10);
        let vehicle = Vehicle::new(
            2,
            light,
            VehicleConfig {
                travel: DwellRange::new(Duration::from_secs(30), Duration::from_secs(30)).unwrap(),
                seed: Some(1),
            },
        );
        vehicle.simulate().unwrap();

        let start = Instant::now();
        vehicle.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(vehicle.crossings(), 0);
    }

    #[test]
    fn test_simulate_after_stop_is_rejected() {
        let vehicle = Vehicle::new(2, light(10, 10), quick_trips());
        vehicle.simulate().unwrap();
        vehicle.simulate().unwrap();
        vehicle.stop();

        match vehicle.simulate() {
            Err(SimError::Stopped { kind, id }) => {
                assert_eq!(kind, "vehicle");
                assert_eq!(id, 2);
            }
            other => panic!("expected Stopped, got {other:?}"),
        }
        assert_eq!(vehicle.crossings(), 0);
    }

    #[test]
    fn test_all_waiting_vehicles_cross_on_first_green() {
        let light = light(300, 300);
        let vehicles: Vec<_> = (2..5)
            .map(|id| Vehicle::new(id, Arc::clone(&light), quick_trips()))
            .collect();
        for vehicle in &vehicles {
            vehicle.simulate().unwrap();
        }

        // Let every vehicle arrive and block at red before the light runs
        thread::sleep(Duration::from_millis(50));
        assert!(vehicles.iter().all(|v| v.crossings() == 0));
        light.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while light.current_phase() != Phase::Green && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(light.current_phase(), Phase::Green);

        thread::sleep(Duration::from_millis(150));
        let crossings: Vec<u64> = vehicles.iter().map(Vehicle::crossings).collect();
        for vehicle in &vehicles {
            vehicle.stop();
        }
        light.stop();
        assert!(
            crossings.iter().all(|&c| c >= 1),
            "every waiting vehicle should cross during green: {crossings:?}"
        );
    }

    #[test]
    fn test_debug_output() {
        let vehicle = Vehicle::new(4, light(10, 10), VehicleConfig::default());
        let debug = format!("{vehicle:?}");
        assert!(debug.contains("Vehicle"));
        assert!(debug.contains("id: 4"));
        assert!(debug.contains("light: 1"));
    }
}
