//! Simulated traffic objects
//!
//! Lights and vehicles share a small lifecycle contract, [`TrafficObject`],
//! so an orchestrator can start and stop them uniformly. [`Simulation`]
//! owns the collection and hands out object ids.

pub mod vehicle;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::SimError;
use crate::phase::{CyclerConfig, PhaseCycler};

pub use vehicle::{Vehicle, VehicleConfig};

/// Type tag for simulated objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A [`PhaseCycler`]
    TrafficLight,
    /// A [`Vehicle`]
    Vehicle,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrafficLight => f.write_str("traffic light"),
            Self::Vehicle => f.write_str("vehicle"),
        }
    }
}

/// Lifecycle contract for objects driven by a [`Simulation`].
pub trait TrafficObject: Send + Sync {
    /// Unique object id.
    fn id(&self) -> u64;

    /// Object type tag.
    fn kind(&self) -> ObjectKind;

    /// Starts the object's background work.
    ///
    /// # Errors
    ///
    /// Returns an error if the background work cannot be started.
    fn simulate(&self) -> Result<(), SimError>;

    /// Stops background work and waits for it to finish.
    fn stop(&self);
}

impl TrafficObject for PhaseCycler {
    fn id(&self) -> u64 {
        Self::id(self)
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::TrafficLight
    }

    fn simulate(&self) -> Result<(), SimError> {
        self.start().map_err(SimError::from)
    }

    fn stop(&self) {
        Self::stop(self);
    }
}

/// Owns a set of traffic objects and starts each once.
///
/// Objects are stopped in reverse insertion order, so vehicles added after
/// their light stop before it. Dropping the simulation stops everything.
pub struct Simulation {
    next_id: u64,
    objects: Vec<Arc<dyn TrafficObject>>,
}

impl Simulation {
    /// Creates an empty simulation. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            objects: Vec::new(),
        }
    }

    /// Allocates the next object id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Adds an already constructed object.
    pub fn add(&mut self, object: Arc<dyn TrafficObject>) {
        debug!(id = object.id(), kind = %object.kind(), "object added");
        self.objects.push(object);
    }

    /// Creates a light with a fresh id and adds it.
    pub fn add_light(&mut self, config: CyclerConfig) -> Arc<PhaseCycler> {
        let light = Arc::new(PhaseCycler::new(self.next_id(), config));
        self.add(Arc::clone(&light) as Arc<dyn TrafficObject>);
        light
    }

    /// Creates a vehicle bound to `light` with a fresh id and adds it.
    pub fn add_vehicle(&mut self, light: &Arc<PhaseCycler>, config: VehicleConfig) -> Arc<Vehicle> {
        let vehicle = Arc::new(Vehicle::new(self.next_id(), Arc::clone(light), config));
        self.add(Arc::clone(&vehicle) as Arc<dyn TrafficObject>);
        vehicle
    }

    /// All objects in insertion order.
    #[must_use]
    pub fn objects(&self) -> &[Arc<dyn TrafficObject>] {
        &self.objects
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the simulation has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Starts every object in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first start failure. Objects started before it keep
    /// running until [`stop_all`](Self::stop_all) or drop.
    pub fn start_all(&self) -> Result<(), SimError> {
        for object in &self.objects {
            object.simulate()?;
        }
        info!(objects = self.objects.len(), "simulation started");
        Ok(())
    }

    /// Stops every object in reverse insertion order.
    pub fn stop_all(&self) {
        for object in self.objects.iter().rev() {
            object.stop();
        }
        debug!(objects = self.objects.len(), "simulation stopped");
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("next_id", &self.next_id)
            .field("objects", &self.objects.len())
            .finish()
    }
}
