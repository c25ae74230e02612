//! Cross-cycle totals and end-of-run statistics.
//!
//! [`RunAggregator`] accumulates per-cycle counts as the run progresses
//! and derives the [`RunSummary`] once it stops.

use populace_demography::SpeciesParameters;
use populace_types::{CycleSnapshot, EndReason, RunSummary, days_to_years};
use rand::Rng;

use crate::cycle::CycleOutcome;
use crate::population::Population;

/// Populations above this size use a sampled median age.
pub const MEDIAN_SAMPLE_THRESHOLD: usize = 5_000;

/// Individuals drawn for a sampled median age.
pub const MEDIAN_SAMPLE_SIZE: usize = 1_000;

/// Fraction of lifespan lived that counts as a completed life.
pub const COMPLETED_LIFE_FRACTION: f64 = 0.98;

// ---------------------------------------------------------------------------
// Median age
// ---------------------------------------------------------------------------

/// Exact median; the mean of the two middle values for even counts.
pub fn exact_median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let lower = sorted.get(mid.checked_sub(1)?)?;
        let upper = sorted.get(mid)?;
        Some((lower + upper) / 2.0)
    } else {
        sorted.get(mid).copied()
    }
}

/// Median age, exact up to [`MEDIAN_SAMPLE_THRESHOLD`] values and
/// estimated from a uniform sample of [`MEDIAN_SAMPLE_SIZE`] above it.
pub fn median_age<R: Rng + ?Sized>(ages: &[f64], rng: &mut R) -> Option<f64> {
    if ages.len() <= MEDIAN_SAMPLE_THRESHOLD {
        return exact_median(ages);
    }
    let sample: Vec<f64> = rand::seq::index::sample(rng, ages.len(), MEDIAN_SAMPLE_SIZE)
        .into_iter()
        .filter_map(|index| ages.get(index).copied())
        .collect();
    exact_median(&sample)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Events per 1000 individuals per year.
#[allow(clippy::cast_precision_loss)]
pub fn crude_rate(events: u64, average_population: f64, years: f64) -> f64 {
    if average_population <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    events as f64 / average_population / years * 1_000.0
}

/// Mean healthy children per completed life, corrected for infant loss.
///
/// The cohort is everyone who has lived at least 98% of the lifespan;
/// when nobody has, it falls back to everyone past menopause. Returns 0
/// when both cohorts are empty.
#[allow(clippy::cast_precision_loss)]
pub fn total_fertility_rate(population: &Population, params: &SpeciesParameters) -> f64 {
    let lived = |age_days: i64| params.days_lived(age_days);
    let completed_threshold = params.lifespan_days as f64 * COMPLETED_LIFE_FRACTION;
    let completed: Vec<u32> = population
        .agents()
        .filter(|agent| lived(agent.age_days) as f64 >= completed_threshold)
        .map(|agent| agent.healthy_children)
        .collect();
    let cohort = if completed.is_empty() {
        population
            .agents()
            .filter(|agent| lived(agent.age_days) >= params.menopause_age_days)
            .map(|agent| agent.healthy_children)
            .collect()
    } else {
        completed
    };
    if cohort.is_empty() {
        return 0.0;
    }
    let children: f64 = cohort.iter().map(|&count| f64::from(count)).sum();
    let mean = children / cohort.len() as f64;
    let survival = 1.0 - params.infant_mortality_rate;
    if survival > 0.0 { mean / survival } else { mean }
}

// ---------------------------------------------------------------------------
// RunAggregator
// ---------------------------------------------------------------------------

/// Accumulates per-cycle results for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct RunAggregator {
    species_name: String,
    initial_population: usize,
    total_births: u64,
    total_deaths: u64,
    total_culled: u64,
    old_age_deaths: u64,
    cycles: u64,
    history: Vec<CycleSnapshot>,
}

impl RunAggregator {
    /// Start aggregating from the seeded state.
    pub fn new(species_name: &str, initial: &CycleSnapshot) -> Self {
        Self {
            species_name: species_name.to_owned(),
            initial_population: initial.total_population,
            total_births: 0,
            total_deaths: 0,
            total_culled: 0,
            old_age_deaths: 0,
            cycles: 0,
            history: vec![initial.clone()],
        }
    }

    /// Fold one cycle into the totals.
    pub fn record(&mut self, outcome: &CycleOutcome) {
        let snapshot = &outcome.snapshot;
        self.total_births = self.total_births.saturating_add(snapshot.births);
        self.total_deaths = self.total_deaths.saturating_add(snapshot.deaths);
        self.total_culled = self.total_culled.saturating_add(snapshot.culled);
        self.old_age_deaths = self.old_age_deaths.saturating_add(snapshot.old_age_deaths);
        self.cycles = self.cycles.saturating_add(1);
        self.history.push(snapshot.clone());
    }

    /// Surviving births so far.
    pub const fn total_births(&self) -> u64 {
        self.total_births
    }

    /// Deaths so far.
    pub const fn total_deaths(&self) -> u64 {
        self.total_deaths
    }

    /// Mean population over every recorded cycle after seeding; the
    /// initial population when no cycle ran.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_population(&self) -> f64 {
        let after_seeding: Vec<usize> = self
            .history
            .iter()
            .filter(|snapshot| snapshot.cycle != 0)
            .map(|snapshot| snapshot.total_population)
            .collect();
        if after_seeding.is_empty() {
            return self.initial_population as f64;
        }
        let total: f64 = after_seeding.iter().map(|&size| size as f64).sum();
        total / after_seeding.len() as f64
    }

    /// Derive the final statistics.
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(
        self,
        population: &Population,
        params: &SpeciesParameters,
        elapsed_days: i64,
        end_reason: EndReason,
        median_age_years: Option<f64>,
    ) -> RunSummary {
        let elapsed_years = days_to_years(elapsed_days);
        let rate_years = elapsed_years.max(1.0);
        let average_population = self.average_population();
        let crude_birth_rate = crude_rate(self.total_births, average_population, rate_years);
        let crude_death_rate = crude_rate(self.total_deaths, average_population, rate_years);
        let final_population = population.len();

        RunSummary {
            species_name: self.species_name,
            final_population,
            initial_population: self.initial_population,
            total_births: self.total_births,
            total_deaths: self.total_deaths,
            total_culled: self.total_culled,
            old_age_death_share: (self.total_deaths > 0)
                .then(|| self.old_age_deaths as f64 / self.total_deaths as f64),
            total_fertility_rate: total_fertility_rate(population, params),
            crude_birth_rate,
            crude_death_rate,
            rate_of_natural_increase: crude_birth_rate - crude_death_rate,
            population_change_percent: (self.initial_population > 0).then(|| {
                final_population as f64 / self.initial_population as f64 * 100.0
            }),
            median_age_years,
            cycles_completed: self.cycles,
            elapsed_years,
            end_reason,
            history: self.history,
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use populace_types::{ReproductiveStrategy, Sex};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::cycle::DeathTally;
    use crate::testing::species;

    fn snapshot(cycle: u64, population: usize, births: u64, deaths: u64) -> CycleSnapshot {
        CycleSnapshot {
            cycle,
            day: 0,
            total_population: population,
            female_count: population / 2,
            male_count: population.saturating_sub(population / 2),
            births,
            deaths,
            culled: 0,
            old_age_deaths: deaths / 2,
            eligible_mothers: 0,
            carrying_capacity: 10_000,
            median_age_years: None,
        }
    }

    fn outcome(snapshot: CycleSnapshot) -> CycleOutcome {
        CycleOutcome {
            snapshot,
            deaths: DeathTally::default(),
            unions_formed: 0,
            respawns: 0,
            end_reason: None,
        }
    }

    #[test]
    fn exact_median_handles_odd_and_even() {
        assert_eq!(exact_median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(exact_median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(exact_median(&[]), None);
    }

    #[test]
    fn large_populations_use_a_sample() {
        let ages: Vec<f64> = (0..10_000).map(|i| f64::from(i % 100)).collect();
        let mut rng = SmallRng::seed_from_u64(42);
        let median = median_age(&ages, &mut rng).unwrap_or(f64::NAN);
        assert!((40.0..=60.0).contains(&median));
    }

    #[test]
    fn crude_rate_is_per_thousand_per_year() {
        assert!((crude_rate(50, 1_000.0, 2.0) - 25.0).abs() < 1e-12);
        assert!(crude_rate(50, 0.0, 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_population_skips_cycle_zero() {
        let mut aggregator = RunAggregator::new("Fixture", &snapshot(0, 1_000, 0, 0));
        aggregator.record(&outcome(snapshot(1, 100, 0, 0)));
        aggregator.record(&outcome(snapshot(2, 300, 0, 0)));
        assert!((aggregator.average_population() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn finish_derives_rates() {
        let params = species(ReproductiveStrategy::Standard);
        let mut population = Population::new(false);
        for _ in 0..200 {
            population.spawn(Sex::Female, 5_000, true);
        }
        let mut aggregator = RunAggregator::new("Fixture", &snapshot(0, 100, 0, 0));
        aggregator.record(&outcome(snapshot(1, 200, 120, 20)));
        // Two years at 200 average: 120 births -> 300 per 1000 per year.
        let days = (2.0 * populace_types::EARTH_YEAR_DAYS).round();
        #[allow(clippy::cast_possible_truncation)]
        let summary = aggregator.finish(&population, &params, days as i64, EndReason::RunLengthReached, Some(13.7));
        assert!((summary.crude_birth_rate - 300.0).abs() < 0.5);
        assert!((summary.crude_death_rate - 50.0).abs() < 0.1);
        assert!((summary.rate_of_natural_increase - 250.0).abs() < 0.5);
        assert_eq!(summary.population_change_percent, Some(200.0));
        assert_eq!(summary.old_age_death_share, Some(0.5));
        assert_eq!(summary.history.len(), 2);
        assert_eq!(summary.cycles_completed, 1);
    }

    #[test]
    fn short_runs_use_one_year_floor() {
        let params = species(ReproductiveStrategy::Standard);
        let population = Population::new(false);
        let mut aggregator = RunAggregator::new("Fixture", &snapshot(0, 100, 0, 0));
        aggregator.record(&outcome(snapshot(1, 100, 10, 0)));
        let summary = aggregator.finish(&population, &params, 30, EndReason::Extinct, None);
        assert!((summary.crude_birth_rate - 100.0).abs() < 1e-9);
        assert_eq!(summary.old_age_death_share, None);
    }

    #[test]
    fn fertility_rate_prefers_completed_lives() {
        let params = species(ReproductiveStrategy::Standard);
        let mut population = Population::new(false);
        let old = population.spawn(Sex::Female, 25_500, true);
        let past_menopause = population.spawn(Sex::Female, 17_000, true);
        for _ in 0..4 {
            if let Some(agent) = population.get_mut(old) {
                agent.record_child();
            }
        }
        if let Some(agent) = population.get_mut(past_menopause) {
            agent.record_child();
        }
        assert!((total_fertility_rate(&population, &params) - 4.0).abs() < 1e-12);

        population.remove(old);
        assert!((total_fertility_rate(&population, &params) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fertility_rate_corrects_for_infant_loss() {
        let mut params = species(ReproductiveStrategy::Standard);
        params.infant_mortality_rate = 0.5;
        let mut population = Population::new(false);
        let id = population.spawn(Sex::Female, 25_500, true);
        if let Some(agent) = population.get_mut(id) {
            agent.record_child();
        }
        assert!((total_fertility_rate(&population, &params) - 2.0).abs() < 1e-12);
    }
}
