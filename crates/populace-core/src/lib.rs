//! Population arena, cycle engine, and run orchestration for the Populace
//! simulator.
//!
//! This crate owns the 10-phase cycle that advances a population by one
//! effective gestation period: aging, sex change, old-age death, cycle
//! modifiers, coupling, births, post-birth mortality, consolidation,
//! and termination.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `populace-config.yaml` and
//!   the species, locale, and scenario catalogs.
//! - [`cycle`] -- The 10-phase cycle engine.
//! - [`population`] -- Agent and union arena with union integrity upkeep.
//! - [`runner`] -- Run loop, stop conditions, and [`CycleCallback`].
//! - [`seeding`] -- Cycle-0 population from a scenario or at random.
//! - [`summary`] -- Run aggregation, median age, and fertility metrics.
//!
//! [`CycleCallback`]: runner::CycleCallback

pub mod config;
pub mod cycle;
pub mod population;
pub mod runner;
pub mod seeding;
pub mod summary;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, PreparedRun, SimulationConfig};
pub use cycle::{CapacityMode, CycleEngine, CycleOutcome, DeathTally, EngineOptions};
pub use population::Population;
pub use runner::{CycleCallback, NoOpCallback, RunBounds, run_to_completion};
pub use seeding::{InitialPopulation, seed_population};
pub use summary::RunAggregator;
