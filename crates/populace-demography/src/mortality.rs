//! Mortality formulas.
//!
//! Covers the annual-to-per-cycle probability conversion, the Gompertz
//! style old-age hazard, and the genetic-diversity feedback that inflates
//! mortality in small breeding populations.

use populace_types::Sex;

use crate::error::RateConversionError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Baseline hazard `b` of the old-age curve.
pub const OLD_AGE_BASE_MORTALITY: f64 = 0.0005;

/// Hazard growth rate `g` of the old-age curve.
pub const OLD_AGE_MORTALITY_INCREASE: f64 = 0.09;

/// Old-age hazard modifier for males; males age slightly faster.
pub const MALE_LIFESPAN_MODIFIER: f64 = 0.93;

/// Old-age hazard modifier for females.
pub const FEMALE_LIFESPAN_MODIFIER: f64 = 1.0;

/// Exponent applied to the diversity shortfall when scaling mortality.
///
/// At zero diversity the multiplier is `2^1.59`, roughly three.
pub const MORTALITY_DIVERSITY_EXPONENT: f64 = 1.59;

/// Breeding population at which the diversity feedback stops applying.
pub const BREEDING_POPULATION_REFERENCE: f64 = 50.0;

// ---------------------------------------------------------------------------
// Rate conversion
// ---------------------------------------------------------------------------

/// Convert an annual probability to the probability over `cycle_years`.
///
/// `1 - (1 - annual)^cycle_years`. A non-positive cycle length yields 0.
///
/// # Errors
///
/// Returns [`RateConversionError::OutOfRange`] when `annual` is outside
/// `[0, 1)`. Callers degrade to 0 and record a warning.
pub fn annual_to_per_cycle_rate(annual: f64, cycle_years: f64) -> Result<f64, RateConversionError> {
    if !(0.0..1.0).contains(&annual) {
        return Err(RateConversionError::OutOfRange { annual });
    }
    if cycle_years.is_nan() || cycle_years <= 0.0 {
        return Ok(0.0);
    }
    let survival = (1.0 - annual).powf(cycle_years);
    Ok((1.0 - survival).clamp(0.0, 1.0))
}

// ---------------------------------------------------------------------------
// Old age
// ---------------------------------------------------------------------------

/// Sex-specific modifier for [`old_age_hazard`].
pub const fn lifespan_modifier(sex: Sex) -> f64 {
    match sex {
        Sex::Female => FEMALE_LIFESPAN_MODIFIER,
        Sex::Male => MALE_LIFESPAN_MODIFIER,
    }
}

/// Per-cycle probability of dying of old age.
///
/// ```text
/// adjusted = (age / modifier) * (age / lifespan)
/// factor   = (b / g) * e^(g * adjusted) * (e^g - 1)
/// p        = 1 - e^(-factor)
/// ```
///
/// Clamped to `[0, 1]`. A non-positive lifespan or modifier means
/// certain death.
pub fn old_age_hazard(age_years: f64, lifespan_years: f64, sex_modifier: f64) -> f64 {
    if lifespan_years <= 0.0 || sex_modifier <= 0.0 {
        return 1.0;
    }
    let adjusted = (age_years / sex_modifier) * (age_years / lifespan_years);
    let factor = (OLD_AGE_BASE_MORTALITY / OLD_AGE_MORTALITY_INCREASE)
        * (OLD_AGE_MORTALITY_INCREASE * adjusted).exp()
        * OLD_AGE_MORTALITY_INCREASE.exp_m1();
    let hazard = -(-factor).exp_m1();
    if hazard.is_nan() { 1.0 } else { hazard.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Diversity feedback
// ---------------------------------------------------------------------------

/// Effective breeding population of a two-sex population.
///
/// `4 * F * M / max(1, F + M)`, which equals the headcount when the sexes
/// are balanced and collapses when either sex is scarce.
#[allow(clippy::cast_precision_loss)]
pub fn effective_breeding_population(fertile_females: usize, fertile_males: usize) -> f64 {
    let females = fertile_females as f64;
    let males = fertile_males as f64;
    4.0 * females * males / (females + males).max(1.0)
}

/// Genetic adjuster in `[0, diversity]`.
///
/// `min(1, breeding / 50) * diversity`.
pub fn genetic_adjuster(breeding_population: f64, diversity: f64) -> f64 {
    let saturation = (breeding_population / BREEDING_POPULATION_REFERENCE).clamp(0.0, 1.0);
    saturation * diversity.max(0.0)
}

/// Scale a probability by the diversity shortfall.
///
/// `rate * (2 - adjuster)^1.59`, clamped to `[0, 1]`.
pub fn diversity_adjusted_rate(rate: f64, adjuster: f64) -> f64 {
    let shortfall = (2.0 - adjuster).max(0.0);
    let scaled = rate * shortfall.powf(MORTALITY_DIVERSITY_EXPONENT);
    if scaled.is_nan() { 0.0 } else { scaled.clamp(0.0, 1.0) }
}

/// Probability an unpaired adult seeks a union this cycle.
///
/// Two-sex species scale the coupling rate by `sqrt(males / max(1, females))`
/// so a male shortage lowers pairing; hermaphrodites use it unmodified.
#[allow(clippy::cast_precision_loss)]
pub fn marriage_chance(coupling_rate: f64, females: usize, males: usize, hermaphroditic: bool) -> f64 {
    let chance = if hermaphroditic {
        coupling_rate
    } else {
        let ratio = males as f64 / (females.max(1) as f64);
        coupling_rate * ratio.sqrt()
    };
    if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) }
}
