//! Scenario runner binary for the quarry harvest controller.
//!
//! Builds a scripted kinematic world from the configured scenario, wires
//! the coordinator to it, and steps both until the tick budget runs out.
//! The world stands in for a game engine: the controller only ever sees
//! observations and only ever speaks commands.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `quarry-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Run the scenario tick loop to completion
//! 4. Log the run summary as JSON

mod error;
mod sim;

use std::path::Path;

use quarry_core::config::HarvestConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::SimError;

/// Application entry point for the scenario runner.
///
/// # Errors
///
/// Returns an error if configuration loading or the run itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging comes after so the configured level
    //    can feed the filter.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG overrides the configured
    //    level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("quarry-sim starting");
    info!(
        source = %source,
        seed = config.scenario.seed,
        ticks = config.scenario.ticks,
        workers = config.scenario.workers,
        bases = config.scenario.bases.len(),
        "Configuration loaded"
    );

    // 3. Run the scenario.
    let summary = sim::run(&config).map_err(SimError::from)?;

    // 4. Log results.
    info!(
        deliveries = summary.deliveries,
        nodes_remaining = summary.nodes_remaining,
        ticks = summary.ticks,
        "Scenario complete"
    );
    let report = serde_json::to_string_pretty(&summary).map_err(SimError::from)?;
    info!(report = %report, "Run summary");

    Ok(())
}

/// Load the harvest configuration.
///
/// The first command line argument names the config file; without one,
/// `quarry-config.yaml` in the working directory is tried. A missing file
/// falls back to built-in defaults.
fn load_config() -> Result<(HarvestConfig, String), SimError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "quarry-config.yaml".to_owned());
    let candidate = Path::new(&path);
    if candidate.exists() {
        let config = HarvestConfig::from_file(candidate)?;
        Ok((config, path))
    } else {
        Ok((HarvestConfig::default(), "defaults".to_owned()))
    }
}
