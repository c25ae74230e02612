//! Command-line entry point for the Populace simulator.
//!
//! Wires configuration, profile catalogs, the cycle engine, and the console
//! reporter together and runs one simulation to completion.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line flags
//! 2. Load configuration from `populace-config.yaml` and apply the flags
//! 3. Initialize structured logging (tracing)
//! 4. Load the species, locale, and scenario profiles
//! 5. Seed the random source and build the cycle engine
//! 6. Run until the run length, cycle limit, or extinction stops it
//! 7. Print the summary and pyramid, and export the history if requested

mod cli;
mod error;
mod reporter;

use std::path::Path;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser as _;
use populace_core::config::LoggingConfig;
use populace_core::runner;
use populace_core::{CycleEngine, SimulationConfig};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::EngineError;
use crate::reporter::ConsoleReporter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, profile loading, or the history
/// export fails.
fn main() -> anyhow::Result<()> {
    let started = Instant::now();

    // 1-2. Flags and configuration.
    let cli = Cli::parse();
    let config_found = cli.config.exists();
    let mut config = load_config(&cli.config)?;
    cli.apply(&mut config);

    // 3. Structured logging.
    init_logging(&config.logging);
    info!("populace-engine starting");
    if config_found {
        info!(path = %cli.config.display(), "Configuration loaded");
    } else {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    // 4. Profiles.
    let prepared = config
        .prepare()
        .map_err(EngineError::from)
        .context("failed to prepare the run")?;
    info!(
        species = %prepared.params.name,
        strategy = %prepared.params.strategy,
        locale = %prepared.environment.name,
        biome = %prepared.environment.biome_type,
        effective_gestation_days = prepared.params.effective_gestation_days,
        degraded_inputs = prepared.degraded.len(),
        "Profiles loaded"
    );

    // 5. Engine.
    let seed = config.run.seed.unwrap_or_else(rand::random);
    info!(seed, "Random source seeded");
    let bounds = prepared.bounds;
    let log_interval = config.run.log_interval_cycles.unwrap_or_else(|| {
        reporter::default_log_interval(
            bounds.target_days(),
            prepared.params.effective_gestation_days,
        )
    });
    let mut console = ConsoleReporter::new(&prepared.params, log_interval, config.output.pyramid);
    let mut engine = CycleEngine::new(
        prepared.params,
        prepared.environment,
        &prepared.initial,
        prepared.options,
        StdRng::seed_from_u64(seed),
    )
    .map_err(EngineError::from)?;
    if let Some(initial) = engine.history().first() {
        console.log_snapshot(initial);
    }

    // 6. Run.
    let summary = runner::run_to_completion(&mut engine, &bounds, &mut console);

    // 7. Outputs.
    if let Some(path) = &config.output.history_path {
        reporter::write_history(path, &summary)
            .with_context(|| format!("history export to {} failed", path.display()))?;
    }

    let runtime = started.elapsed();
    println!("\nSimulation Runtime: {:.2} seconds", runtime.as_secs_f64());
    info!(
        end_reason = %summary.end_reason,
        cycles = summary.cycles_completed,
        runtime_secs = runtime.as_secs_f64(),
        "populace-engine shutdown complete"
    );
    Ok(())
}

/// Load the run configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok(config)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
