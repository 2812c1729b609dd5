//! `run` command handler
//!
//! Builds a light and its vehicles from configuration, runs them until the
//! requested duration elapses or shutdown is requested, then prints a
//! summary.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::{OutputFormat, RunArgs};
use crate::config::{ConfigLoader, LoadWarning, SimulationConfig};
use crate::error::TrafficError;
use crate::phase::Phase;
use crate::sim::{Simulation, TrafficObject};

/// Summary printed when a run ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Wall-clock run time in milliseconds
    pub elapsed_ms: u64,
    /// Phase transitions performed by the light
    pub transitions: u64,
    /// Light phase at shutdown
    pub final_phase: Phase,
    /// Per-vehicle crossing counts
    pub vehicles: Vec<VehicleSummary>,
}

/// Crossing count for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSummary {
    /// Vehicle id
    pub id: u64,
    /// Number of crossings
    pub crossings: u64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "ran for {}",
            humantime::format_duration(Duration::from_millis(self.elapsed_ms))
        )?;
        writeln!(f, "transitions: {}", self.transitions)?;
        write!(f, "final phase: {}", self.final_phase)?;
        for v in &self.vehicles {
            write!(f, "\nvehicle {}: {} crossings", v.id, v.crossings)?;
        }
        Ok(())
    }
}

/// Run a light and its vehicles.
///
/// # Errors
///
/// Returns a configuration error if the config file or overrides are
/// invalid, or a phase/simulation error if an object fails to start.
pub async fn run(args: &RunArgs, shutdown: CancellationToken) -> Result<(), TrafficError> {
    let loader = ConfigLoader::with_defaults();

    let mut config = if let Some(ref path) = args.config {
        info!(config = %path.display(), "loading configuration");
        let result = loader.load(path)?;
        log_warnings(&result.warnings);
        result.config
    } else {
        SimulationConfig::default()
    };

    if apply_overrides(&mut config, args) {
        log_warnings(&loader.validate(&config)?);
    }

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let mut sim = Simulation::new();
    let light = sim.add_light(config.cycler_config()?);
    let mut vehicles = Vec::with_capacity(config.vehicles.count);
    for i in 0..config.vehicles.count {
        vehicles.push(sim.add_vehicle(&light, config.vehicle_config(i)?));
    }

    let started = Instant::now();
    sim.start_all()?;
    info!(
        light = light.id(),
        vehicles = vehicles.len(),
        dwell = %light.config().dwell,
        "simulation running"
    );

    match args.duration {
        Some(limit) => {
            tokio::select! {
                () = shutdown.cancelled() => info!("shutdown requested"),
                () = tokio::time::sleep(limit) => info!("run duration elapsed"),
            }
        }
        None => {
            shutdown.cancelled().await;
            info!("shutdown requested");
        }
    }

    // Joining object threads blocks; keep it off the async workers.
    tokio::task::spawn_blocking(move || sim.stop_all())
        .await
        .map_err(|e| TrafficError::Io(std::io::Error::other(e.to_string())))?;

    let summary = RunSummary {
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        transitions: light.transitions(),
        final_phase: light.current_phase(),
        vehicles: vehicles
            .iter()
            .map(|v| VehicleSummary {
                id: v.id(),
                crossings: v.crossings(),
            })
            .collect(),
    };

    match args.format {
        OutputFormat::Human => println!("{summary}"),
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
    }
    Ok(())
}

/// Applies CLI flags on top of file configuration. Returns whether anything changed.
fn apply_overrides(config: &mut SimulationConfig, args: &RunArgs) -> bool {
    let mut changed = false;
    if let Some(min) = args.min_dwell {
        config.light.min_dwell = min;
        changed = true;
    }
    if let Some(max) = args.max_dwell {
        config.light.max_dwell = max;
        changed = true;
    }
    if let Some(seed) = args.seed {
        config.light.seed = Some(seed);
        changed = true;
    }
    if let Some(count) = args.vehicles {
        config.vehicles.count = count;
        changed = true;
    }
    changed
}

fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["trafficlight", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_no_overrides() {
        let mut config = SimulationConfig::default();
        assert!(!apply_overrides(&mut config, &run_args(&[])));
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = SimulationConfig::default();
        config.vehicles.count = 5;
        let changed = apply_overrides(
            &mut config,
            &run_args(&["--min-dwell", "1s", "--max-dwell", "2s", "--seed", "4", "--vehicles", "1"]),
        );
        assert!(changed);
        assert_eq!(config.light.min_dwell, Duration::from_secs(1));
        assert_eq!(config.light.max_dwell, Duration::from_secs(2));
        assert_eq!(config.light.seed, Some(4));
        assert_eq!(config.vehicles.count, 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            elapsed_ms: 1500,
            transitions: 3,
            final_phase: Phase::Green,
            vehicles: vec![VehicleSummary { id: 2, crossings: 4 }],
        };
        assert_eq!(
            summary.to_string(),
            "ran for 1s 500ms\ntransitions: 3\nfinal phase: green\nvehicle 2: 4 crossings"
        );
    }

    #[test]
    fn test_summary_json() {
        let summary = RunSummary {
            elapsed_ms: 10,
            transitions: 0,
            final_phase: Phase::Red,
            vehicles: vec![],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["final_phase"], "red");
        assert_eq!(json["transitions"], 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_stops_on_cancel() {
        let args = run_args(&["--min-dwell", "10ms", "--max-dwell", "20ms", "--vehicles", "2"]);
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), run(&args, shutdown))
            .await
            .expect("run should stop after cancellation")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_rejects_inverted_override() {
        let args = run_args(&["--min-dwell", "2s", "--max-dwell", "1s", "--duration", "10ms"]);
        let err = run(&args, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TrafficError::Config(_)));
    }
}
