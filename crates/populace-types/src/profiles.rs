//! Raw species and locale records as they appear in profile catalogs.
//!
//! These mirror the catalog field names one-to-one and carry no
//! validation. `populace-demography` turns a [`SpeciesProfile`] into
//! validated species parameters with derived rates.

use serde::{Deserialize, Serialize};

use crate::enums::{DietType, MarriageType, ReproductiveStrategy};

/// Species biology as read from a species catalog.
///
/// Every lifecycle, reproduction and mortality field is required; a
/// missing one fails deserialization. The lifecycle variant may be given
/// either as an explicit `reproductive_strategy` or through the legacy
/// boolean flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    /// Display name of the species.
    #[serde(rename = "Species_Name", alias = "species_name")]
    pub species_name: String,

    // --- Lifecycle ---
    /// Age (days) at which reproduction becomes possible.
    pub puberty_age_days: i64,
    /// Age (days) at which female reproduction stops.
    pub menopause_age_days: i64,
    /// Expected lifespan (days); the old-age hazard applies beyond it.
    pub lifespan_days: i64,

    // --- Reproduction ---
    /// Per-cycle probability that an unpaired adult seeks a union.
    pub coupling_rate: f64,
    /// Gestation length (days).
    pub gestation_days: i64,
    /// Recovery interval between births (days).
    pub interbirth_interval_days: i64,
    /// Maximum surviving children per individual.
    pub max_kids_per_primate: u32,
    /// Probability of each additional child in a litter.
    pub chance_of_multiple_birth: f64,
    /// Annual probability of conception for an eligible mother.
    pub base_fertility_rate: f64,
    /// Fraction of conceptions lost before birth.
    pub miscarriage_stillborn_rate: f64,
    /// Probability an individual is born sterile.
    pub sterile_chance: f64,
    /// Probability a child is female.
    pub sex_ratio_at_birth: f64,
    /// Per-cycle probability a mother uses contraception.
    pub contraception_abortion_use_rate: f64,

    // --- Lifecycle variant ---
    /// Explicit lifecycle variant; takes precedence over the legacy flags.
    #[serde(default)]
    pub reproductive_strategy: Option<ReproductiveStrategy>,
    /// Legacy flag for [`ReproductiveStrategy::Hermaphroditic`].
    #[serde(default)]
    pub is_hermaphrodite: bool,
    /// Legacy flag for [`ReproductiveStrategy::SequentialSexChange`].
    #[serde(default)]
    pub is_sequential_species: bool,
    /// Legacy flag for [`ReproductiveStrategy::ReverseAging`].
    #[serde(default)]
    pub ages_backward: bool,
    /// Legacy flag for [`ReproductiveStrategy::ForcedRespawn`].
    #[serde(default)]
    pub respawns_on_female_death: bool,

    // --- Unions ---
    /// Union structure used when pairing.
    #[serde(default)]
    pub marriage_type: MarriageType,
    /// Maximum union size.
    #[serde(default = "default_max_union_size")]
    pub max_union_size: usize,

    // --- Mortality ---
    /// Probability a newborn dies at birth.
    pub infant_mortality_rate: f64,
    /// Probability a mother dies after giving birth.
    pub maternal_mortality_rate: f64,
    /// Annual background adult mortality.
    pub adult_mortality_rate: f64,

    // --- Diet ---
    /// Daily caloric need of one adult.
    pub calories_needed_per_primate: f64,
    /// Food pools the species draws on.
    #[serde(default)]
    pub diet_type: DietType,

    // --- Genetics and fertility curve ---
    /// Genetic diversity multiplier applied to the mortality feedback.
    #[serde(default = "default_genetic_diversity")]
    pub initial_genetic_diversity: f64,
    /// Steepness of the rising edge of the fertility curve.
    pub fertility_rising_steepness: f64,
    /// Steepness of the falling edge of the fertility curve.
    pub fertility_falling_steepness: f64,
}

const fn default_max_union_size() -> usize {
    2
}

const fn default_genetic_diversity() -> f64 {
    1.0
}

/// Environment that bounds the population through its food energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    /// Locale name; catalogs fill it from the profile key when omitted.
    #[serde(default = "default_locale_name")]
    pub name: String,
    /// Biome label.
    #[serde(default = "default_biome_type")]
    pub biome_type: String,
    /// Area in square kilometres.
    #[serde(default)]
    pub area_km2: f64,
    /// Fresh water available (cubic metres); feeds autotrophs.
    #[serde(default)]
    pub water_availability_m3: f64,
    /// Daily energy available from prey.
    #[serde(default)]
    pub carnivore_calories: f64,
    /// Daily energy available from plants.
    #[serde(default)]
    pub herbivore_calories: f64,
    /// Daily energy available from grazing.
    #[serde(default)]
    pub ruminant_calories: f64,
}

fn default_locale_name() -> String {
    String::from("Unknown")
}

fn default_biome_type() -> String {
    String::from("Temperate")
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self {
            name: default_locale_name(),
            biome_type: default_biome_type(),
            area_km2: 0.0,
            water_availability_m3: 0.0,
            carnivore_calories: 0.0,
            herbivore_calories: 0.0,
            ruminant_calories: 0.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HUMAN: &str = r#"{
        "Species_Name": "Human",
        "puberty_age_days": 4745,
        "menopause_age_days": 18262,
        "lifespan_days": 27394,
        "coupling_rate": 0.3,
        "gestation_days": 280,
        "interbirth_interval_days": 365,
        "max_kids_per_primate": 12,
        "chance_of_multiple_birth": 0.012,
        "base_fertility_rate": 0.25,
        "miscarriage_stillborn_rate": 0.15,
        "sterile_chance": 0.1,
        "sex_ratio_at_birth": 0.49,
        "contraception_abortion_use_rate": 0.0,
        "infant_mortality_rate": 0.2,
        "maternal_mortality_rate": 0.01,
        "adult_mortality_rate": 0.01,
        "calories_needed_per_primate": 2000,
        "fertility_rising_steepness": 1.2,
        "fertility_falling_steepness": 0.4
    }"#;

    #[test]
    fn species_profile_fills_optional_fields() {
        let profile: SpeciesProfile = serde_json::from_str(HUMAN).unwrap();
        assert_eq!(profile.species_name, "Human");
        assert_eq!(profile.diet_type, DietType::Omnivore);
        assert_eq!(profile.marriage_type, MarriageType::Monogamy);
        assert_eq!(profile.max_union_size, 2);
        assert!(profile.reproductive_strategy.is_none());
        assert!((profile.initial_genetic_diversity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn species_profile_requires_mortality_fields() {
        let truncated = HUMAN.replace("\"adult_mortality_rate\": 0.01,", "");
        let profile: Result<SpeciesProfile, _> = serde_json::from_str(&truncated);
        assert!(profile.is_err());
    }

    #[test]
    fn environment_defaults_everything() {
        let env: Result<EnvironmentProfile, _> = serde_json::from_str(r#"{"area_km2": 12.5}"#);
        assert!(env.is_ok());
        let env = env.ok().unwrap_or_default();
        assert_eq!(env.name, "Unknown");
        assert_eq!(env.biome_type, "Temperate");
        assert!((env.area_km2 - 12.5).abs() < f64::EPSILON);
    }
}
