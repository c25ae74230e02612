//! Validated species parameters and their derived per-cycle rates.
//!
//! [`SpeciesParameters::from_profile`] is the only way in. It rejects
//! profiles that cannot be simulated, clamps out-of-range probabilities,
//! resolves the lifecycle variant, and computes every derived value once.

use populace_types::{
    DegradedInput, DietType, EnvironmentProfile, MarriageType, ReproductiveStrategy, Sex,
    SpeciesProfile, days_to_years,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capacity::{self, CapacityEstimate};
use crate::error::ConfigurationError;
use crate::fertility::FertilityCurve;
use crate::mortality::annual_to_per_cycle_rate;

/// Upper bound for annual rates and every derived per-cycle probability.
pub const MAX_RATE: f64 = 0.99999;

/// Species names that imply a lifecycle variant in legacy catalogs.
const LEGACY_SEQUENTIAL_NAME: &str = "sequents";
const LEGACY_RESPAWN_NAME: &str = "Doubles";

/// Immutable species constants plus values derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParameters {
    /// Display name.
    pub name: String,

    // --- Lifecycle (days) ---
    /// Start of the reproductive window.
    pub puberty_age_days: i64,
    /// End of the female reproductive window.
    pub menopause_age_days: i64,
    /// Expected lifespan.
    pub lifespan_days: i64,
    /// Gestation length.
    pub gestation_days: i64,
    /// Recovery interval after a birth.
    pub interbirth_interval_days: i64,

    // --- Reproduction ---
    /// Per-cycle probability an unpaired adult seeks a union.
    pub coupling_rate: f64,
    /// Maximum surviving children per individual.
    pub max_children: u32,
    /// Probability of each additional child in a litter.
    pub multiple_birth_chance: f64,
    /// Annual conception probability.
    pub base_fertility_rate: f64,
    /// Fraction of conceptions lost.
    pub miscarriage_rate: f64,
    /// Probability a newborn is sterile.
    pub sterile_chance: f64,
    /// Probability a newborn is female.
    pub female_birth_ratio: f64,
    /// Per-cycle probability a mother uses contraception.
    pub contraception_rate: f64,

    // --- Mortality ---
    /// Probability a newborn dies at birth.
    pub infant_mortality_rate: f64,
    /// Probability a mother dies after giving birth.
    pub maternal_mortality_rate: f64,
    /// Annual adult mortality.
    pub adult_mortality_rate: f64,

    // --- Diet and genetics ---
    /// Daily caloric need of one adult.
    pub caloric_need: f64,
    /// Food pools the species draws on.
    pub diet: DietType,
    /// Scalar genetic diversity in the mortality feedback.
    pub genetic_diversity: f64,

    // --- Fertility curve ---
    /// Steepness of the rising edge.
    pub fertility_rising_steepness: f64,
    /// Steepness of the falling edge.
    pub fertility_falling_steepness: f64,

    // --- Variant and unions ---
    /// Resolved lifecycle variant.
    pub strategy: ReproductiveStrategy,
    /// Union structure.
    pub marriage_type: MarriageType,
    /// Maximum union size.
    pub max_union_size: usize,

    // --- Derived ---
    /// Length of the female reproductive window.
    pub fertile_days: i64,
    /// Gestation plus inter-birth interval; the steady-state cycle length.
    pub effective_gestation_days: i64,
    /// Reproductive cycles that fit in one fertile window.
    pub cycles_per_reproductive_life: f64,
    /// Per-cycle conception probability net of miscarriage.
    pub per_cycle_fertility_rate: f64,
    /// Per-cycle background adult mortality.
    pub per_cycle_adult_mortality_rate: f64,

    /// Inputs that were repaired during construction.
    pub degraded: Vec<DegradedInput>,
}

impl SpeciesParameters {
    /// Validate a raw profile and compute derived values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for profiles that cannot be
    /// simulated: an inverted fertile window, a non-positive lifespan or
    /// caloric need, negative durations, a union size too small for the marriage type, or
    /// conflicting legacy lifecycle flags.
    pub fn from_profile(profile: &SpeciesProfile) -> Result<Self, ConfigurationError> {
        validate_durations(profile)?;
        if profile.calories_needed_per_primate.is_nan() || profile.calories_needed_per_primate <= 0.0 {
            return Err(ConfigurationError::NonPositiveCaloricNeed {
                calories: profile.calories_needed_per_primate,
            });
        }
        let minimum = profile.marriage_type.min_members();
        if profile.max_union_size < minimum {
            return Err(ConfigurationError::InvalidUnionSize {
                marriage_type: profile.marriage_type,
                minimum,
                max_union_size: profile.max_union_size,
            });
        }
        let strategy = resolve_strategy(profile)?;

        let mut degraded = Vec::new();
        let mut probability = |field: &str, value: f64| clamp_rate(field, value, 1.0, &mut degraded);
        let coupling_rate = probability("coupling_rate", profile.coupling_rate);
        let multiple_birth_chance =
            probability("chance_of_multiple_birth", profile.chance_of_multiple_birth);
        let miscarriage_rate =
            probability("miscarriage_stillborn_rate", profile.miscarriage_stillborn_rate);
        let sterile_chance = probability("sterile_chance", profile.sterile_chance);
        let female_birth_ratio = probability("sex_ratio_at_birth", profile.sex_ratio_at_birth);
        let contraception_rate = probability(
            "contraception_abortion_use_rate",
            profile.contraception_abortion_use_rate,
        );
        let infant_mortality_rate =
            probability("infant_mortality_rate", profile.infant_mortality_rate);
        let maternal_mortality_rate =
            probability("maternal_mortality_rate", profile.maternal_mortality_rate);
        let base_fertility_rate =
            clamp_rate("base_fertility_rate", profile.base_fertility_rate, MAX_RATE, &mut degraded);
        let adult_mortality_rate =
            clamp_rate("adult_mortality_rate", profile.adult_mortality_rate, MAX_RATE, &mut degraded);
        let genetic_diversity = clamp_rate(
            "initial_genetic_diversity",
            profile.initial_genetic_diversity,
            1.0,
            &mut degraded,
        );

        let fertile_days = profile
            .menopause_age_days
            .saturating_sub(profile.puberty_age_days);
        let effective_gestation_days = profile
            .gestation_days
            .saturating_add(profile.interbirth_interval_days);

        let (cycles_per_reproductive_life, per_cycle_fertility_rate, per_cycle_adult_mortality_rate) =
            if effective_gestation_days > 0 {
                let cycle_years = days_to_years(effective_gestation_days);
                let conception = per_cycle_or_zero("base_fertility_rate", base_fertility_rate, cycle_years);
                let mortality =
                    per_cycle_or_zero("adult_mortality_rate", adult_mortality_rate, cycle_years);
                (
                    days_to_years(fertile_days) / cycle_years,
                    (conception * (1.0 - miscarriage_rate)).min(MAX_RATE),
                    mortality.min(MAX_RATE),
                )
            } else {
                warn!(
                    species = %profile.species_name,
                    effective_gestation_days,
                    "Effective gestation is not positive, derived rates set to 0"
                );
                degraded.push(DegradedInput::ZeroEffectiveGestation);
                (0.0, 0.0, 0.0)
            };

        Ok(Self {
            name: profile.species_name.clone(),
            puberty_age_days: profile.puberty_age_days,
            menopause_age_days: profile.menopause_age_days,
            lifespan_days: profile.lifespan_days,
            gestation_days: profile.gestation_days,
            interbirth_interval_days: profile.interbirth_interval_days,
            coupling_rate,
            max_children: profile.max_kids_per_primate,
            multiple_birth_chance,
            base_fertility_rate,
            miscarriage_rate,
            sterile_chance,
            female_birth_ratio,
            contraception_rate,
            infant_mortality_rate,
            maternal_mortality_rate,
            adult_mortality_rate,
            caloric_need: profile.calories_needed_per_primate,
            diet: profile.diet_type.clone(),
            genetic_diversity,
            fertility_rising_steepness: profile.fertility_rising_steepness,
            fertility_falling_steepness: profile.fertility_falling_steepness,
            strategy,
            marriage_type: profile.marriage_type,
            max_union_size: profile.max_union_size,
            fertile_days,
            effective_gestation_days,
            cycles_per_reproductive_life,
            per_cycle_fertility_rate,
            per_cycle_adult_mortality_rate,
            degraded,
        })
    }

    /// Fertility curve over this species' reproductive window.
    pub fn fertility_curve(&self) -> FertilityCurve {
        FertilityCurve::for_window(
            days_to_years(self.puberty_age_days),
            days_to_years(self.menopause_age_days),
            self.per_cycle_fertility_rate,
            self.fertility_rising_steepness,
            self.fertility_falling_steepness,
        )
    }

    /// Carrying capacity of an environment at the nominal adult need.
    pub fn carrying_capacity(&self, env: &EnvironmentProfile) -> CapacityEstimate {
        capacity::carrying_capacity(&self.diet, env, self.caloric_need)
    }

    /// Daily caloric need of one individual of this species.
    pub fn caloric_need_of(&self, sex: Sex, age_days: i64) -> f64 {
        capacity::caloric_need(
            self.caloric_need,
            sex,
            age_days,
            self.puberty_age_days,
            self.lifespan_days,
        )
    }

    /// Whether an age lies in the female window `[puberty, menopause)`.
    pub const fn in_fertile_window(&self, age_days: i64) -> bool {
        age_days >= self.puberty_age_days && age_days < self.menopause_age_days
    }

    /// Whether an age is at or past puberty.
    pub const fn is_mature(&self, age_days: i64) -> bool {
        age_days >= self.puberty_age_days
    }

    /// Age a newborn starts at: 0, or the full lifespan for reverse agers.
    pub const fn birth_age_days(&self) -> i64 {
        if self.strategy.ages_backward() {
            self.lifespan_days
        } else {
            0
        }
    }

    /// Days an individual of the given age has been alive.
    pub const fn days_lived(&self, age_days: i64) -> i64 {
        if self.strategy.ages_backward() {
            self.lifespan_days.saturating_sub(age_days)
        } else {
            age_days
        }
    }

    /// Ensure the species has positive cycle lengths.
    ///
    /// Parameter construction tolerates zero effective gestation; running
    /// a simulation does not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonPositiveGestation`] or
    /// [`ConfigurationError::NonPositiveEffectiveGestation`].
    pub const fn ensure_runnable(&self) -> Result<(), ConfigurationError> {
        if self.gestation_days <= 0 {
            return Err(ConfigurationError::NonPositiveGestation {
                gestation_days: self.gestation_days,
            });
        }
        if self.effective_gestation_days <= 0 {
            return Err(ConfigurationError::NonPositiveEffectiveGestation {
                effective_gestation_days: self.effective_gestation_days,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_durations(profile: &SpeciesProfile) -> Result<(), ConfigurationError> {
    if profile.lifespan_days <= 0 {
        return Err(ConfigurationError::NonPositiveLifespan {
            lifespan_days: profile.lifespan_days,
        });
    }
    let durations = [
        ("puberty_age_days", profile.puberty_age_days),
        ("menopause_age_days", profile.menopause_age_days),
        ("gestation_days", profile.gestation_days),
        ("interbirth_interval_days", profile.interbirth_interval_days),
    ];
    if let Some((field, days)) = durations.into_iter().find(|(_, days)| *days < 0) {
        return Err(ConfigurationError::NegativeDuration { field, days });
    }
    if profile.puberty_age_days > profile.menopause_age_days {
        return Err(ConfigurationError::PubertyAfterMenopause {
            puberty_age_days: profile.puberty_age_days,
            menopause_age_days: profile.menopause_age_days,
        });
    }
    Ok(())
}

/// Explicit strategy wins; otherwise at most one legacy flag may be set.
fn resolve_strategy(profile: &SpeciesProfile) -> Result<ReproductiveStrategy, ConfigurationError> {
    if let Some(strategy) = profile.reproductive_strategy {
        return Ok(strategy);
    }
    let candidates = [
        (profile.is_hermaphrodite, "is_hermaphrodite", ReproductiveStrategy::Hermaphroditic),
        (
            profile.is_sequential_species || profile.species_name == LEGACY_SEQUENTIAL_NAME,
            "is_sequential_species",
            ReproductiveStrategy::sequential(),
        ),
        (profile.ages_backward, "ages_backward", ReproductiveStrategy::ReverseAging),
        (
            profile.respawns_on_female_death || profile.species_name == LEGACY_RESPAWN_NAME,
            "respawns_on_female_death",
            ReproductiveStrategy::forced_respawn(),
        ),
    ];
    let set: Vec<_> = candidates.iter().filter(|(flag, _, _)| *flag).collect();
    match set.as_slice() {
        [] => Ok(ReproductiveStrategy::Standard),
        [(_, _, strategy)] => Ok(*strategy),
        many => Err(ConfigurationError::ConflictingStrategyFlags {
            flags: many
                .iter()
                .map(|(_, name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Clamp a probability-like parameter into `[0, upper]`, recording a repair.
fn clamp_rate(field: &str, value: f64, upper: f64, degraded: &mut Vec<DegradedInput>) -> f64 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, upper) };
    if clamped.to_bits() != value.to_bits() {
        warn!(parameter = field, supplied = value, clamped_to = clamped, "Rate out of range, clamped");
        degraded.push(DegradedInput::RateClamped {
            parameter: field.to_owned(),
            supplied: value,
            clamped_to: clamped,
        });
    }
    clamped
}

fn per_cycle_or_zero(field: &str, annual: f64, cycle_years: f64) -> f64 {
    annual_to_per_cycle_rate(annual, cycle_years).unwrap_or_else(|err| {
        warn!(parameter = field, error = %err, "Per-cycle rate conversion failed, using 0");
        0.0
    })
}
