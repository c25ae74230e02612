//! Shared type definitions for the Populace demography simulator.
//!
//! This crate is the single source of truth for the entity model used
//! across the workspace. It holds plain data only; formulas live in
//! `populace-demography` and the state machine in `populace-core`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe arena identifiers for individuals and unions
//! - [`enums`] -- Sex, union structure, diet, lifecycle variant, outcomes
//! - [`agent`] -- Individuals, unions, and starting-population seeds
//! - [`profiles`] -- Raw species and locale catalog records
//! - [`records`] -- Per-cycle snapshots and the end-of-run summary
//! - [`calendar`] -- Day/year conversion

pub mod agent;
pub mod calendar;
pub mod enums;
pub mod ids;
pub mod profiles;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use agent::{Agent, AgentSeed, Scenario, Union};
pub use calendar::{EARTH_YEAR_DAYS, days_to_years};
pub use enums::{
    DeathCause, DegradedInput, DietType, EndReason, MarriageType, ReproductiveStrategy, Sex,
};
pub use ids::{AgentId, UnionId};
pub use profiles::{EnvironmentProfile, SpeciesProfile};
pub use records::{CycleSnapshot, RunSummary};
