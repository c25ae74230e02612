//! Starting populations.
//!
//! A run starts either from explicit seeds (a scenario) or from a random
//! population of a given size with uniformly distributed ages.

use populace_demography::SpeciesParameters;
use populace_types::{AgentSeed, ReproductiveStrategy, Sex};
use rand::Rng;
use tracing::debug;

use crate::population::Population;

/// Size of a random starting population when none is configured.
pub const DEFAULT_STARTING_POPULATION: usize = 100;

/// How to build the cycle-0 population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialPopulation {
    /// Random individuals with ages uniform over `[0, lifespan]`.
    Random {
        /// Number of individuals.
        size: usize,
    },
    /// Explicit individuals, typically from a scenario catalog.
    Seeds(Vec<AgentSeed>),
}

impl Default for InitialPopulation {
    fn default() -> Self {
        Self::Random {
            size: DEFAULT_STARTING_POPULATION,
        }
    }
}

/// Build the starting population.
pub fn seed_population<R: Rng + ?Sized>(
    params: &SpeciesParameters,
    initial: &InitialPopulation,
    rng: &mut R,
) -> Population {
    let mut population = Population::new(params.strategy.is_hermaphroditic());
    match initial {
        InitialPopulation::Random { size } => {
            for _ in 0..*size {
                let age_days = rng.random_range(0..=params.lifespan_days.max(0));
                let sex = random_sex(params, age_days, rng);
                let fertile = rng.random::<f64>() >= params.sterile_chance;
                population.spawn(sex, age_days, fertile);
            }
        }
        InitialPopulation::Seeds(seeds) => {
            for seed in seeds {
                let sex = if params.strategy.is_hermaphroditic() {
                    Sex::Female
                } else {
                    Sex::from_is_female(seed.is_female)
                };
                population.spawn(sex, seed.age_days, seed.is_initially_fertile);
            }
        }
    }
    debug!(
        species = %params.name,
        individuals = population.len(),
        "Seeded starting population"
    );
    population
}

/// Sex of a randomly generated starting individual.
///
/// Sequential species are male until their transition age.
fn random_sex<R: Rng + ?Sized>(params: &SpeciesParameters, age_days: i64, rng: &mut R) -> Sex {
    match params.strategy {
        ReproductiveStrategy::Hermaphroditic => Sex::Female,
        ReproductiveStrategy::SequentialSexChange {
            transition_age_days,
            ..
        } => {
            if age_days < transition_age_days {
                Sex::Male
            } else {
                Sex::Female
            }
        }
        ReproductiveStrategy::Standard
        | ReproductiveStrategy::ReverseAging
        | ReproductiveStrategy::ForcedRespawn { .. } => {
            Sex::from_is_female(rng.random::<f64>() < params.female_birth_ratio)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::testing::species;

    #[test]
    fn random_population_has_requested_size_and_valid_ages() {
        let params = species(ReproductiveStrategy::Standard);
        let mut rng = SmallRng::seed_from_u64(42);
        let population = seed_population(&params, &InitialPopulation::Random { size: 500 }, &mut rng);
        assert_eq!(population.len(), 500);
        assert!(
            population
                .agents()
                .all(|agent| (0..=params.lifespan_days).contains(&agent.age_days))
        );
        let (females, males) = population.count_by_sex();
        assert!(females > 150 && males > 150);
    }

    #[test]
    fn hermaphrodites_are_seeded_female() {
        let params = species(ReproductiveStrategy::Hermaphroditic);
        let mut rng = SmallRng::seed_from_u64(7);
        let seeds = vec![AgentSeed {
            is_female: false,
            age_days: 5_000,
            is_initially_fertile: true,
        }];
        let population = seed_population(&params, &InitialPopulation::Seeds(seeds), &mut rng);
        assert_eq!(population.count_by_sex(), (1, 0));
    }

    #[test]
    fn sequential_species_are_male_until_transition() {
        let params = species(ReproductiveStrategy::sequential());
        let mut rng = SmallRng::seed_from_u64(3);
        let population = seed_population(&params, &InitialPopulation::Random { size: 300 }, &mut rng);
        for agent in population.agents() {
            assert_eq!(agent.is_female(), agent.age_days >= 12_783);
        }
    }

    #[test]
    fn seeds_are_taken_verbatim() {
        let params = species(ReproductiveStrategy::Standard);
        let mut rng = SmallRng::seed_from_u64(1);
        let seeds = vec![
            AgentSeed {
                is_female: true,
                age_days: 4_000,
                is_initially_fertile: false,
            },
            AgentSeed {
                is_female: false,
                age_days: 9_000,
                is_initially_fertile: true,
            },
        ];
        let population = seed_population(&params, &InitialPopulation::Seeds(seeds), &mut rng);
        let agents: Vec<_> = population.agents().collect();
        assert_eq!(agents.len(), 2);
        assert!(agents.first().is_some_and(|a| a.is_female() && !a.fertile && a.age_days == 4_000));
        assert!(agents.get(1).is_some_and(|a| !a.is_female() && a.fertile && a.age_days == 9_000));
    }
}
