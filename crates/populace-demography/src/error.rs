//! Error types for the populace-demography crate.
//!
//! [`ConfigurationError`] covers species parameters that cannot be
//! simulated at all. Recoverable problems are not errors; they degrade to
//! a fallback and are recorded as
//! [`DegradedInput`](populace_types::DegradedInput).

use populace_types::MarriageType;

/// Species parameters that make a run impossible.
///
/// Raised before any cycle runs; the engine never fails mid-cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Puberty starts after menopause, leaving no fertile window.
    #[error("puberty age {puberty_age_days} days is after menopause age {menopause_age_days} days")]
    PubertyAfterMenopause {
        /// Configured puberty age.
        puberty_age_days: i64,
        /// Configured menopause age.
        menopause_age_days: i64,
    },

    /// Lifespan is zero or negative.
    #[error("lifespan must be positive, got {lifespan_days} days")]
    NonPositiveLifespan {
        /// Configured lifespan.
        lifespan_days: i64,
    },

    /// A duration field is negative.
    #[error("{field} must not be negative, got {days} days")]
    NegativeDuration {
        /// Profile field name.
        field: &'static str,
        /// Configured value.
        days: i64,
    },

    /// Daily caloric need is zero, negative or not a number.
    #[error("calories needed per individual must be positive, got {calories}")]
    NonPositiveCaloricNeed {
        /// Configured need.
        calories: f64,
    },

    /// Union size is too small for the marriage type to ever breed.
    #[error("{marriage_type} unions need at least {minimum} members, max union size is {max_union_size}")]
    InvalidUnionSize {
        /// Configured marriage type.
        marriage_type: MarriageType,
        /// Members the marriage type needs.
        minimum: usize,
        /// Configured size.
        max_union_size: usize,
    },

    /// More than one legacy lifecycle flag is set and no explicit
    /// strategy resolves the conflict.
    #[error("conflicting lifecycle flags: {flags}")]
    ConflictingStrategyFlags {
        /// The flags that were set together.
        flags: String,
    },

    /// Gestation length is not positive, so the first cycle has no length.
    #[error("gestation must be positive to run a simulation, got {gestation_days} days")]
    NonPositiveGestation {
        /// Configured gestation length.
        gestation_days: i64,
    },

    /// Gestation plus inter-birth interval is not positive, so later
    /// cycles have no length.
    #[error(
        "effective gestation must be positive to run a simulation, got {effective_gestation_days} days"
    )]
    NonPositiveEffectiveGestation {
        /// Gestation plus inter-birth interval.
        effective_gestation_days: i64,
    },
}

/// Failure converting an annual probability into a per-cycle one.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RateConversionError {
    /// The annual rate is outside `[0, 1)`.
    #[error("annual rate {annual} is outside [0, 1)")]
    OutOfRange {
        /// The rejected annual rate.
        annual: f64,
    },
}
