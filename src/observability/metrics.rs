//! Metrics collection for `trafficlight`.
//!
//! Provides Prometheus-compatible metrics and typed convenience functions
//! for recording light and vehicle activity. Recording without an
//! installed recorder is a silent no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TrafficError;
use crate::phase::{Phase, PhaseTransition};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`.  When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `TrafficError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), TrafficError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| TrafficError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "trafficlight_phase_transitions_total",
        "Total number of phase transitions by target phase"
    );
    describe_gauge!(
        "trafficlight_current_phase",
        "Current phase per light (1 = green, 0 = red)"
    );
    describe_counter!(
        "trafficlight_vehicle_crossings_total",
        "Total number of vehicles that crossed on green"
    );
    describe_histogram!(
        "trafficlight_green_wait_ms",
        "Time vehicles spent blocked waiting for green, in milliseconds"
    );
}

/// Records a phase transition and updates the current-phase gauge.
pub fn record_phase_transition(light_id: u64, transition: &PhaseTransition) {
    counter!(
        "trafficlight_phase_transitions_total",
        "phase" => transition.to.as_str()
    )
    .increment(1);
    set_current_phase(light_id, transition.to);
}

/// Sets the current-phase gauge for a light.
pub fn set_current_phase(light_id: u64, phase: Phase) {
    let value = if phase == Phase::Green { 1.0 } else { 0.0 };
    gauge!("trafficlight_current_phase", "light" => light_id.to_string()).set(value);
}

/// Records a vehicle crossing the intersection.
pub fn record_vehicle_crossing() {
    counter!("trafficlight_vehicle_crossings_total").increment(1);
}

/// Records how long a vehicle waited for green.
pub fn record_green_wait(duration: Duration) {
    histogram!("trafficlight_green_wait_ms").record(duration.as_secs_f64() * 1000.0);
}
