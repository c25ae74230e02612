//! Demographic formula library for the Populace simulator.
//!
//! Stateless, pure functions shared by the cycle engine and the summary
//! aggregator, plus [`SpeciesParameters`], the validated species record
//! every run is built from.
//!
//! # Modules
//!
//! - [`fertility`] -- Double-logistic fertility curve and its midpoint policy
//! - [`mortality`] -- Rate conversion, old-age hazard, diversity feedback
//! - [`capacity`] -- Diet-based carrying capacity and caloric need
//! - [`species`] -- Validated species parameters with derived rates
//! - [`error`] -- Configuration errors

pub mod capacity;
pub mod error;
pub mod fertility;
pub mod mortality;
pub mod species;

pub use capacity::{CapacityEstimate, available_energy, caloric_need, carrying_capacity};
pub use error::{ConfigurationError, RateConversionError};
pub use fertility::{FertilityCurve, age_based_fertility, logistic};
pub use mortality::{
    annual_to_per_cycle_rate, diversity_adjusted_rate, effective_breeding_population,
    genetic_adjuster, lifespan_modifier, marriage_chance, old_age_hazard,
};
pub use species::SpeciesParameters;
