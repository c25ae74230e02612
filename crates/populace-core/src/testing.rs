//! Shared fixtures for unit tests.

use populace_demography::SpeciesParameters;
use populace_types::{DietType, EnvironmentProfile, MarriageType, ReproductiveStrategy, SpeciesProfile};

/// A primate-like profile with no background mortality.
pub fn profile(strategy: ReproductiveStrategy) -> SpeciesProfile {
    SpeciesProfile {
        species_name: String::from("Fixture Primate"),
        puberty_age_days: 4_380,
        menopause_age_days: 16_425,
        lifespan_days: 25_550,
        coupling_rate: 0.5,
        gestation_days: 270,
        interbirth_interval_days: 365,
        max_kids_per_primate: 8,
        chance_of_multiple_birth: 0.0,
        base_fertility_rate: 0.4,
        miscarriage_stillborn_rate: 0.0,
        sterile_chance: 0.0,
        sex_ratio_at_birth: 0.5,
        contraception_abortion_use_rate: 0.0,
        reproductive_strategy: Some(strategy),
        is_hermaphrodite: false,
        is_sequential_species: false,
        ages_backward: false,
        respawns_on_female_death: false,
        marriage_type: MarriageType::Monogamy,
        max_union_size: 2,
        infant_mortality_rate: 0.0,
        maternal_mortality_rate: 0.0,
        adult_mortality_rate: 0.0,
        calories_needed_per_primate: 2_000.0,
        diet_type: DietType::Omnivore,
        initial_genetic_diversity: 1.0,
        fertility_rising_steepness: 1.0,
        fertility_falling_steepness: 0.5,
    }
}

/// Validated parameters for [`profile`].
pub fn species(strategy: ReproductiveStrategy) -> SpeciesParameters {
    match SpeciesParameters::from_profile(&profile(strategy)) {
        Ok(params) => params,
        Err(err) => panic!("fixture profile rejected: {err}"),
    }
}

/// A locale that feeds 10 000 adults of the fixture species.
pub fn environment() -> EnvironmentProfile {
    EnvironmentProfile {
        name: String::from("Fixture Plains"),
        biome_type: String::from("Grassland"),
        area_km2: 5_000.0,
        water_availability_m3: 1_000_000.0,
        carnivore_calories: 5_000_000.0,
        herbivore_calories: 15_000_000.0,
        ruminant_calories: 0.0,
    }
}
