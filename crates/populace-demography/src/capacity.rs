//! Diet-based carrying capacity and individual caloric need.

use populace_types::{DegradedInput, DietType, EnvironmentProfile, Sex};
use serde::{Deserialize, Serialize};

/// Need multiplier for females.
pub const FEMALE_NEED_FACTOR: f64 = 0.9;

/// Need multiplier before puberty.
pub const JUVENILE_NEED_FACTOR: f64 = 0.5;

/// Need multiplier past the expected lifespan.
pub const ELDER_NEED_FACTOR: f64 = 0.75;

/// Result of a carrying-capacity evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEstimate {
    /// Maximum sustainable headcount.
    pub capacity: u64,
    /// Food energy the diet can draw on.
    pub available_energy: f64,
    /// Set when the diet label was not recognised.
    pub degraded: Option<DegradedInput>,
}

/// Food energy a diet can draw from an environment.
///
/// Unknown diets eat from every food pool and report a
/// [`DegradedInput::UnknownDietType`]; the caller decides when to log it.
pub fn available_energy(diet: &DietType, env: &EnvironmentProfile) -> (f64, Option<DegradedInput>) {
    match diet {
        DietType::Omnivore => (env.carnivore_calories + env.herbivore_calories, None),
        DietType::Carnivore => (env.carnivore_calories, None),
        DietType::Herbivore => (env.herbivore_calories, None),
        DietType::Ruminant => (env.ruminant_calories + env.herbivore_calories, None),
        DietType::Autotroph => (env.water_availability_m3, None),
        DietType::Unknown(label) => {
            let total = env.carnivore_calories + env.herbivore_calories + env.ruminant_calories;
            (total, Some(DegradedInput::UnknownDietType { label: label.clone() }))
        }
    }
}

/// Number of individuals the environment can feed.
///
/// `floor(energy / need)`. A non-positive need, or non-positive energy,
/// yields 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn carrying_capacity(
    diet: &DietType,
    env: &EnvironmentProfile,
    need_per_individual: f64,
) -> CapacityEstimate {
    let (available_energy, degraded) = available_energy(diet, env);
    let capacity = if need_per_individual.is_nan() || need_per_individual <= 0.0 {
        0
    } else {
        let ratio = (available_energy / need_per_individual).floor();
        if ratio.is_nan() || ratio <= 0.0 {
            0
        } else {
            // Saturating float-to-int conversion.
            ratio as u64
        }
    };
    CapacityEstimate {
        capacity,
        available_energy,
        degraded,
    }
}

/// Daily caloric need of one individual.
///
/// Starts from the adult need and applies the female, pre-puberty and
/// past-lifespan multipliers cumulatively.
pub const fn caloric_need(
    base_need: f64,
    sex: Sex,
    age_days: i64,
    puberty_age_days: i64,
    lifespan_days: i64,
) -> f64 {
    let mut need = base_need;
    if sex.is_female() {
        need *= FEMALE_NEED_FACTOR;
    }
    if age_days < puberty_age_days {
        need *= JUVENILE_NEED_FACTOR;
    }
    if age_days > lifespan_days {
        need *= ELDER_NEED_FACTOR;
    }
    need
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale() -> EnvironmentProfile {
        EnvironmentProfile {
            name: String::from("Savanna"),
            biome_type: String::from("Grassland"),
            area_km2: 1_000.0,
            water_availability_m3: 9_000.0,
            carnivore_calories: 200_000.0,
            herbivore_calories: 800_000.0,
            ruminant_calories: 400_000.0,
        }
    }

    #[test]
    fn diet_selects_food_pools() {
        let env = locale();
        let cases = [
            (DietType::Omnivore, 1_000_000.0),
            (DietType::Carnivore, 200_000.0),
            (DietType::Herbivore, 800_000.0),
            (DietType::Ruminant, 1_200_000.0),
            (DietType::Autotroph, 9_000.0),
        ];
        for (diet, expected) in cases {
            let (energy, degraded) = available_energy(&diet, &env);
            assert!((energy - expected).abs() < f64::EPSILON, "{diet}");
            assert!(degraded.is_none());
        }
    }

    #[test]
    fn unknown_diet_eats_everything_and_degrades() {
        let estimate = carrying_capacity(&DietType::Unknown(String::from("rocks")), &locale(), 1_000.0);
        assert_eq!(estimate.capacity, 1_400);
        assert!(matches!(
            estimate.degraded,
            Some(DegradedInput::UnknownDietType { ref label }) if label == "rocks"
        ));
    }

    #[test]
    fn capacity_floors_the_ratio() {
        let estimate = carrying_capacity(&DietType::Carnivore, &locale(), 3_000.0);
        assert_eq!(estimate.capacity, 66);
    }

    #[test]
    fn non_positive_need_gives_zero_capacity() {
        assert_eq!(carrying_capacity(&DietType::Omnivore, &locale(), 0.0).capacity, 0);
        assert_eq!(carrying_capacity(&DietType::Omnivore, &locale(), -5.0).capacity, 0);
    }

    #[test]
    fn empty_environment_gives_zero_capacity() {
        let env = EnvironmentProfile::default();
        assert_eq!(carrying_capacity(&DietType::Omnivore, &env, 2_000.0).capacity, 0);
    }

    #[test]
    fn caloric_need_applies_multipliers() {
        let adult_male = caloric_need(2_000.0, Sex::Male, 10_000, 4_000, 25_000);
        let juvenile_female = caloric_need(2_000.0, Sex::Female, 1_000, 4_000, 25_000);
        let elder_male = caloric_need(2_000.0, Sex::Male, 30_000, 4_000, 25_000);
        assert!((adult_male - 2_000.0).abs() < f64::EPSILON);
        assert!((juvenile_female - 900.0).abs() < 1e-9);
        assert!((elder_male - 1_500.0).abs() < 1e-9);
    }
}
