//! The per-cycle stochastic state machine.
//!
//! [`CycleEngine::advance_cycle`] executes the ten phases of a
//! reproductive cycle strictly in order:
//!
//! 1. **Advance time** -- age everyone; reverse agers at zero die
//! 2. **Sex change** -- sequential males past the threshold become female
//! 3. **Old age** -- forward agers past lifespan face the old-age hazard
//! 4. **Cohort counts** -- sexes and fertile cohorts among survivors
//! 5. **Modifiers** -- diversity-adjusted mortality and marriage chance
//! 6. **Coupling** -- unpaired adults draw and are paired greedily
//! 7. **Birth** -- eligible mothers conceive, litters face infant mortality
//! 8. **Post-birth mortality** -- maternal and adult deaths
//! 9. **Consolidation** -- merge newborns and respawns, cull to capacity
//! 10. **Termination** -- extinction checks
//!
//! All randomness comes from the single generator injected at
//! construction. The engine never fails mid-cycle.

use std::collections::BTreeSet;

use populace_demography::{
    ConfigurationError, FertilityCurve, SpeciesParameters, diversity_adjusted_rate,
    effective_breeding_population, fertility, genetic_adjuster, lifespan_modifier,
    marriage_chance, old_age_hazard,
};
use populace_types::{
    AgentId, CycleSnapshot, DeathCause, DegradedInput, EndReason, EnvironmentProfile,
    MarriageType, ReproductiveStrategy, Sex, days_to_years,
};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::population::Population;
use crate::seeding::{self, InitialPopulation};
use crate::summary;

/// Most children a single conception can produce.
pub const MAX_LITTER_SIZE: u32 = 16;

/// Individuals younger than this (years lived) skip adult mortality.
pub const MIN_ADULT_MORTALITY_AGE_YEARS: f64 = 0.5;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How carrying capacity is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// Fixed at construction from the nominal adult need.
    #[default]
    Static,
    /// Re-evaluated each cycle from the population's mean caloric need.
    CompositionAdjusted,
}

/// Engine construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Capacity evaluation mode.
    #[serde(default)]
    pub capacity_mode: CapacityMode,
    /// Fixed capacity that bypasses the diet calculation entirely.
    #[serde(default)]
    pub carrying_capacity_override: Option<u64>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Deaths in one cycle, by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathTally {
    /// Old-age deaths.
    pub old_age: u64,
    /// Newborns lost at birth.
    pub infant: u64,
    /// Mothers lost after giving birth.
    pub maternal: u64,
    /// Background adult deaths.
    pub adult: u64,
    /// Individuals culled to capacity.
    pub culled: u64,
}

impl DeathTally {
    /// Count one death.
    pub const fn record(&mut self, cause: DeathCause) {
        let slot = match cause {
            DeathCause::OldAge => &mut self.old_age,
            DeathCause::Infant => &mut self.infant,
            DeathCause::Maternal => &mut self.maternal,
            DeathCause::Adult => &mut self.adult,
            DeathCause::Culled => &mut self.culled,
        };
        *slot = slot.saturating_add(1);
    }

    /// Deaths of every cause.
    pub const fn total(&self) -> u64 {
        self.old_age
            .saturating_add(self.infant)
            .saturating_add(self.maternal)
            .saturating_add(self.adult)
            .saturating_add(self.culled)
    }
}

/// Result of one call to [`CycleEngine::advance_cycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    /// State after consolidation.
    pub snapshot: CycleSnapshot,
    /// Deaths by cause.
    pub deaths: DeathTally,
    /// Unions formed during coupling.
    pub unions_formed: u64,
    /// Forced-respawn replacements added.
    pub respawns: u64,
    /// Set when the population can no longer continue.
    pub end_reason: Option<EndReason>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A newborn or replacement waiting for consolidation.
#[derive(Debug, Clone, Copy)]
struct PendingAgent {
    sex: Sex,
    age_days: i64,
    fertile: bool,
}

/// Cycle-wide probabilities computed in phase 5.
#[derive(Debug, Clone, Copy)]
struct CycleModifiers {
    adult_mortality: f64,
    infant_mortality: f64,
    marriage_chance: f64,
}

/// The population state machine.
#[derive(Debug)]
pub struct CycleEngine<R: Rng> {
    params: SpeciesParameters,
    environment: EnvironmentProfile,
    options: EngineOptions,
    fertility_curve: FertilityCurve,
    rng: R,
    population: Population,
    cycle: u64,
    day: i64,
    carrying_capacity: u64,
    genetic_diversity: f64,
    history: Vec<CycleSnapshot>,
    degraded: Vec<DegradedInput>,
}

impl<R: Rng> CycleEngine<R> {
    /// Build an engine, seed the population, and record the cycle-0
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when gestation or effective
    /// gestation is not positive.
    pub fn new(
        params: SpeciesParameters,
        environment: EnvironmentProfile,
        initial: &InitialPopulation,
        options: EngineOptions,
        mut rng: R,
    ) -> Result<Self, ConfigurationError> {
        params.ensure_runnable()?;

        let mut degraded = params.degraded.clone();
        let estimate = params.carrying_capacity(&environment);
        if let Some(issue) = estimate.degraded {
            warn!(species = %params.name, issue = %issue, "Degraded input");
            degraded.push(issue);
        }
        let carrying_capacity = options
            .carrying_capacity_override
            .unwrap_or(estimate.capacity);

        let population = seeding::seed_population(&params, initial, &mut rng);
        let fertility_curve = params.fertility_curve();
        let genetic_diversity = params.genetic_diversity;

        let mut engine = Self {
            params,
            environment,
            options,
            fertility_curve,
            rng,
            population,
            cycle: 0,
            day: 0,
            carrying_capacity,
            genetic_diversity,
            history: Vec::new(),
            degraded,
        };
        let initial_snapshot = engine.snapshot(0, 0, DeathTally::default());
        info!(
            species = %engine.params.name,
            strategy = %engine.params.strategy,
            locale = %engine.environment.name,
            carrying_capacity = engine.carrying_capacity,
            starting_population = initial_snapshot.total_population,
            "Cycle engine initialized"
        );
        engine.history.push(initial_snapshot);
        Ok(engine)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Species parameters the engine runs with.
    pub const fn params(&self) -> &SpeciesParameters {
        &self.params
    }

    /// Environment the engine runs in.
    pub const fn environment(&self) -> &EnvironmentProfile {
        &self.environment
    }

    /// Current population.
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Cycles completed so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Simulated day reached.
    pub const fn day(&self) -> i64 {
        self.day
    }

    /// Carrying capacity applied at the last consolidation.
    pub const fn carrying_capacity(&self) -> u64 {
        self.carrying_capacity
    }

    /// Genetic diversity scalar.
    pub const fn genetic_diversity(&self) -> f64 {
        self.genetic_diversity
    }

    /// Every snapshot recorded so far, cycle 0 first.
    pub fn history(&self) -> &[CycleSnapshot] {
        &self.history
    }

    /// Inputs repaired during setup.
    pub fn degraded_inputs(&self) -> &[DegradedInput] {
        &self.degraded
    }

    /// Median age (years lived) of the current population, sampling large
    /// populations with the engine's generator.
    pub fn sampled_median_age(&mut self) -> Option<f64> {
        let ages = self.ages_lived_years();
        summary::median_age(&ages, &mut self.rng)
    }

    /// Length of the next cycle: gestation first, effective gestation after.
    pub const fn next_cycle_length(&self) -> i64 {
        if self.cycle == 0 {
            self.params.gestation_days
        } else {
            self.params.effective_gestation_days
        }
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    /// Advance the population by one reproductive cycle.
    pub fn advance_cycle(&mut self) -> CycleOutcome {
        let cycle_length = self.next_cycle_length();
        self.cycle = self.cycle.saturating_add(1);
        self.day = self.day.saturating_add(cycle_length);

        let mut deaths = DeathTally::default();
        let mut pending: Vec<PendingAgent> = Vec::new();

        // Phases 1-3.
        self.advance_ages(cycle_length, &mut deaths, &mut pending);
        self.apply_sex_change();
        self.apply_old_age(&mut deaths, &mut pending);

        // Phases 4-5.
        let modifiers = self.cycle_modifiers();

        // Phase 6.
        let unions_formed = self.form_unions(modifiers.marriage_chance);

        // Phase 7.
        let (mothers, eligible_mothers, births) =
            self.births(modifiers.infant_mortality, &mut deaths, &mut pending);

        // Phase 8.
        self.post_birth_mortality(&mothers, modifiers.adult_mortality, &mut deaths, &mut pending);

        // Phase 9.
        let respawns = u64::try_from(pending.len())
            .unwrap_or(u64::MAX)
            .saturating_sub(births);
        self.consolidate(&pending, &mut deaths);

        // Phase 10.
        let end_reason = self.termination();

        let snapshot = self.snapshot(births, eligible_mothers, deaths);
        self.history.push(snapshot.clone());

        debug!(
            cycle = self.cycle,
            day = self.day,
            population = snapshot.total_population,
            births,
            deaths = deaths.total(),
            culled = deaths.culled,
            eligible_mothers,
            unions_formed,
            "Cycle complete"
        );
        if let Some(reason) = end_reason {
            info!(cycle = self.cycle, day = self.day, reason = %reason, "Population cannot continue");
        }

        CycleOutcome {
            snapshot,
            deaths,
            unions_formed,
            respawns,
            end_reason,
        }
    }

    // -----------------------------------------------------------------------
    // Phases 1-3: aging, sex change, old age
    // -----------------------------------------------------------------------

    fn advance_ages(
        &mut self,
        cycle_length: i64,
        deaths: &mut DeathTally,
        pending: &mut Vec<PendingAgent>,
    ) {
        let backward = self.params.strategy.ages_backward();
        let mut expired = Vec::new();
        for agent in self.population.agents_mut() {
            if backward {
                agent.age_days = agent.age_days.saturating_sub(cycle_length);
                if agent.age_days <= 0 {
                    expired.push(agent.id);
                }
            } else {
                agent.age_days = agent.age_days.saturating_add(cycle_length);
            }
        }
        for id in expired {
            self.kill(id, DeathCause::OldAge, deaths, pending);
        }
    }

    fn apply_sex_change(&mut self) {
        let ReproductiveStrategy::SequentialSexChange {
            transition_age_days,
            post_transition_age_days,
        } = self.params.strategy
        else {
            return;
        };
        let changing: Vec<AgentId> = self
            .population
            .agents()
            .filter(|agent| agent.sex == Sex::Male && agent.age_days > transition_age_days)
            .map(|agent| agent.id)
            .collect();
        for id in changing {
            self.population
                .change_sex(id, Sex::Female, post_transition_age_days);
        }
    }

    fn apply_old_age(&mut self, deaths: &mut DeathTally, pending: &mut Vec<PendingAgent>) {
        if self.params.strategy.ages_backward() {
            return;
        }
        let lifespan_days = self.params.lifespan_days;
        let lifespan_years = days_to_years(lifespan_days);
        let elderly: Vec<(AgentId, f64, Sex)> = self
            .population
            .agents()
            .filter(|agent| agent.age_days > lifespan_days)
            .map(|agent| (agent.id, agent.age_years(), agent.sex))
            .collect();
        for (id, age_years, sex) in elderly {
            let hazard = old_age_hazard(age_years, lifespan_years, lifespan_modifier(sex));
            if self.rng.random::<f64>() < hazard {
                self.kill(id, DeathCause::OldAge, deaths, pending);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phases 4-5: cohort counts and modifiers
    // -----------------------------------------------------------------------

    fn cycle_modifiers(&self) -> CycleModifiers {
        let hermaphroditic = self.params.strategy.is_hermaphroditic();
        let mut females = 0_usize;
        let mut males = 0_usize;
        let mut fertile_females = 0_usize;
        let mut fertile_males = 0_usize;
        for agent in self.population.agents() {
            if hermaphroditic || agent.is_female() {
                females = females.saturating_add(1);
                if agent.fertile && self.params.in_fertile_window(agent.age_days) {
                    fertile_females = fertile_females.saturating_add(1);
                }
            } else {
                males = males.saturating_add(1);
                if agent.fertile && self.params.is_mature(agent.age_days) {
                    fertile_males = fertile_males.saturating_add(1);
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let breeding = if hermaphroditic {
            fertile_females as f64
        } else {
            effective_breeding_population(fertile_females, fertile_males)
        };
        let adjuster = genetic_adjuster(breeding, self.genetic_diversity);
        let modifiers = CycleModifiers {
            adult_mortality: diversity_adjusted_rate(
                self.params.per_cycle_adult_mortality_rate,
                adjuster,
            ),
            infant_mortality: diversity_adjusted_rate(self.params.infant_mortality_rate, adjuster),
            marriage_chance: marriage_chance(
                self.params.coupling_rate,
                females,
                males,
                hermaphroditic,
            ),
        };
        debug!(
            cycle = self.cycle,
            females,
            males,
            fertile_females,
            fertile_males,
            breeding_population = breeding,
            genetic_adjuster = adjuster,
            adult_mortality = modifiers.adult_mortality,
            infant_mortality = modifiers.infant_mortality,
            marriage_chance = modifiers.marriage_chance,
            "Cycle modifiers"
        );
        modifiers
    }

    // -----------------------------------------------------------------------
    // Phase 6: coupling
    // -----------------------------------------------------------------------

    fn form_unions(&mut self, chance: f64) -> u64 {
        let candidates: Vec<(AgentId, Sex)> = self
            .population
            .agents()
            .filter(|agent| agent.union.is_none() && self.params.is_mature(agent.age_days))
            .map(|agent| (agent.id, agent.sex))
            .collect();
        let mut winners: Vec<(AgentId, Sex)> = candidates
            .into_iter()
            .filter(|_| self.rng.random::<f64>() < chance)
            .collect();
        winners.shuffle(&mut self.rng);

        let groups = self.group_winners(&winners);
        let marriage_type = self.params.marriage_type;
        let max_size = self.params.max_union_size;
        let mut formed = 0_u64;
        for group in groups {
            if self
                .population
                .form_union(marriage_type, max_size, &group)
                .is_some()
            {
                formed = formed.saturating_add(1);
            }
        }
        formed
    }

    /// Split shuffled winners into union-sized groups.
    fn group_winners(&self, winners: &[(AgentId, Sex)]) -> Vec<Vec<AgentId>> {
        let max_size = self.params.max_union_size.max(1);
        let ids = || winners.iter().map(|(id, _)| *id);

        if self.params.marriage_type == MarriageType::Asexual {
            return ids().map(|id| vec![id]).collect();
        }

        if self.params.strategy.is_hermaphroditic() {
            let group_size = match self.params.marriage_type {
                MarriageType::Polygamy => max_size.max(2),
                MarriageType::Monogamy | MarriageType::Asexual => 2,
            };
            let all: Vec<AgentId> = ids().collect();
            return all
                .chunks(group_size)
                .filter(|group| group.len() >= 2)
                .map(<[AgentId]>::to_vec)
                .collect();
        }

        let females: Vec<AgentId> = winners
            .iter()
            .filter(|(_, sex)| sex.is_female())
            .map(|(id, _)| *id)
            .collect();
        let males = winners
            .iter()
            .filter(|(_, sex)| !sex.is_female())
            .map(|(id, _)| *id);
        let partners_per_male = match self.params.marriage_type {
            MarriageType::Polygamy => max_size.max(2).saturating_sub(1),
            MarriageType::Monogamy | MarriageType::Asexual => 1,
        };
        males
            .zip(females.chunks(partners_per_male))
            .map(|(male, wives)| {
                let mut group = Vec::with_capacity(wives.len().saturating_add(1));
                group.push(male);
                group.extend_from_slice(wives);
                group
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Phase 7: birth
    // -----------------------------------------------------------------------

    /// Returns the mothers who gave birth, the eligible-mother count, and
    /// the number of surviving newborns.
    fn births(
        &mut self,
        infant_mortality: f64,
        deaths: &mut DeathTally,
        pending: &mut Vec<PendingAgent>,
    ) -> (BTreeSet<AgentId>, u64, u64) {
        let eligible: Vec<(AgentId, f64)> = self
            .population
            .agents()
            .filter(|agent| {
                agent.is_female()
                    && agent.fertile
                    && self.params.in_fertile_window(agent.age_days)
                    && agent.healthy_children < self.params.max_children
                    && self.population.in_viable_union(agent.id)
            })
            .map(|agent| (agent.id, agent.age_years()))
            .collect();
        let eligible_count = u64::try_from(eligible.len()).unwrap_or(u64::MAX);

        let mut mothers = BTreeSet::new();
        let mut births = 0_u64;
        for (mother, age_years) in eligible {
            let mut rate = self.fertility_curve.rate_at(age_years);
            if self.rng.random::<f64>() < self.params.contraception_rate {
                rate *= fertility::CONTRACEPTION_FERTILITY_FACTOR;
            }
            if self.rng.random::<f64>() >= rate {
                continue;
            }
            mothers.insert(mother);

            let mut litter = 1_u32;
            while litter < MAX_LITTER_SIZE
                && self.rng.random::<f64>() < self.params.multiple_birth_chance
            {
                litter = litter.saturating_add(1);
            }

            for _ in 0..litter {
                if self.rng.random::<f64>() < infant_mortality {
                    deaths.record(DeathCause::Infant);
                    continue;
                }
                let child = self.newborn();
                pending.push(child);
                births = births.saturating_add(1);
                if let Some(agent) = self.population.get_mut(mother) {
                    agent.record_child();
                }
            }
        }
        (mothers, eligible_count, births)
    }

    fn newborn(&mut self) -> PendingAgent {
        let sex = if self.params.strategy.is_hermaphroditic() {
            Sex::Female
        } else {
            Sex::from_is_female(self.rng.random::<f64>() < self.params.female_birth_ratio)
        };
        PendingAgent {
            sex,
            age_days: self.params.birth_age_days(),
            fertile: self.rng.random::<f64>() >= self.params.sterile_chance,
        }
    }

    // -----------------------------------------------------------------------
    // Phase 8: post-birth mortality
    // -----------------------------------------------------------------------

    fn post_birth_mortality(
        &mut self,
        mothers: &BTreeSet<AgentId>,
        adult_mortality: f64,
        deaths: &mut DeathTally,
        pending: &mut Vec<PendingAgent>,
    ) {
        let survivors: Vec<(AgentId, i64)> = self
            .population
            .agents()
            .map(|agent| (agent.id, agent.age_days))
            .collect();
        for (id, age_days) in survivors {
            if mothers.contains(&id) {
                if self.rng.random::<f64>() < self.params.maternal_mortality_rate {
                    self.kill(id, DeathCause::Maternal, deaths, pending);
                }
            } else if days_to_years(self.params.days_lived(age_days)) > MIN_ADULT_MORTALITY_AGE_YEARS
                && self.rng.random::<f64>() < adult_mortality
            {
                self.kill(id, DeathCause::Adult, deaths, pending);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 9: consolidation
    // -----------------------------------------------------------------------

    fn consolidate(&mut self, pending: &[PendingAgent], deaths: &mut DeathTally) {
        for entrant in pending {
            self.population
                .spawn(entrant.sex, entrant.age_days, entrant.fertile);
        }

        if self.options.carrying_capacity_override.is_none()
            && self.options.capacity_mode == CapacityMode::CompositionAdjusted
        {
            self.carrying_capacity = self.composition_adjusted_capacity();
        }

        let capacity = usize::try_from(self.carrying_capacity).unwrap_or(usize::MAX);
        let size = self.population.len();
        if size <= capacity {
            return;
        }
        let keep: BTreeSet<usize> = rand::seq::index::sample(&mut self.rng, size, capacity)
            .into_iter()
            .collect();
        let culled = self.population.retain_positions(&keep);
        for _ in &culled {
            deaths.record(DeathCause::Culled);
        }
        debug!(
            cycle = self.cycle,
            culled = culled.len(),
            capacity = self.carrying_capacity,
            "Culled to carrying capacity"
        );
    }

    /// Capacity from the mean caloric need of the current population.
    #[allow(clippy::cast_precision_loss)]
    fn composition_adjusted_capacity(&self) -> u64 {
        if self.population.is_empty() {
            return self.params.carrying_capacity(&self.environment).capacity;
        }
        let total_need: f64 = self
            .population
            .agents()
            .map(|agent| self.params.caloric_need_of(agent.sex, agent.age_days))
            .sum();
        let mean_need = total_need / self.population.len() as f64;
        populace_demography::carrying_capacity(&self.params.diet, &self.environment, mean_need)
            .capacity
    }

    // -----------------------------------------------------------------------
    // Phase 10: termination
    // -----------------------------------------------------------------------

    fn termination(&self) -> Option<EndReason> {
        if self.population.is_empty() {
            return Some(EndReason::Extinct);
        }
        if self.params.strategy.requires_both_sexes() {
            let (females, males) = self.population.count_by_sex();
            if females == 0 || males == 0 {
                return Some(EndReason::SexExtinct);
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Remove an individual, count the death, and queue a forced respawn
    /// when a female of a respawning species dies.
    fn kill(
        &mut self,
        id: AgentId,
        cause: DeathCause,
        deaths: &mut DeathTally,
        pending: &mut Vec<PendingAgent>,
    ) {
        let Some(agent) = self.population.remove(id) else {
            return;
        };
        deaths.record(cause);
        if let ReproductiveStrategy::ForcedRespawn { respawn_age_days } = self.params.strategy
            && agent.is_female()
        {
            let fertile = self.rng.random::<f64>() >= self.params.sterile_chance;
            pending.push(PendingAgent {
                sex: Sex::Male,
                age_days: respawn_age_days,
                fertile,
            });
        }
    }

    fn ages_lived_years(&self) -> Vec<f64> {
        self.population
            .agents()
            .map(|agent| days_to_years(self.params.days_lived(agent.age_days)))
            .collect()
    }

    fn snapshot(&mut self, births: u64, eligible_mothers: u64, deaths: DeathTally) -> CycleSnapshot {
        let median_age_years = self.sampled_median_age();
        let (female_count, male_count) = if self.params.strategy.is_hermaphroditic() {
            (self.population.len(), 0)
        } else {
            self.population.count_by_sex()
        };
        CycleSnapshot {
            cycle: self.cycle,
            day: self.day,
            total_population: self.population.len(),
            female_count,
            male_count,
            births,
            deaths: deaths.total(),
            culled: deaths.culled,
            old_age_deaths: deaths.old_age,
            eligible_mothers,
            carrying_capacity: self.carrying_capacity,
            median_age_years,
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::testing::{environment, species};

    fn engine(
        strategy: ReproductiveStrategy,
        initial: &InitialPopulation,
        seed: u64,
    ) -> CycleEngine<SmallRng> {
        let params = species(strategy);
        let result = CycleEngine::new(
            params,
            environment(),
            initial,
            EngineOptions::default(),
            SmallRng::seed_from_u64(seed),
        );
        let Ok(engine) = result else {
            panic!("engine construction failed");
        };
        engine
    }

    fn seeds(specs: &[(bool, i64)]) -> InitialPopulation {
        InitialPopulation::Seeds(
            specs
                .iter()
                .map(|&(is_female, age_days)| populace_types::AgentSeed {
                    is_female,
                    age_days,
                    is_initially_fertile: true,
                })
                .collect(),
        )
    }

    #[test]
    fn construction_records_cycle_zero() {
        let engine = engine(ReproductiveStrategy::Standard, &InitialPopulation::Random { size: 50 }, 1);
        assert_eq!(engine.history().len(), 1);
        let first = engine.history().first();
        assert!(first.is_some_and(|s| s.cycle == 0 && s.total_population == 50 && s.births == 0));
    }

    #[test]
    fn zero_gestation_is_rejected() {
        let mut params = species(ReproductiveStrategy::Standard);
        params.gestation_days = 0;
        let result = CycleEngine::new(
            params,
            environment(),
            &InitialPopulation::default(),
            EngineOptions::default(),
            SmallRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(ConfigurationError::NonPositiveGestation { .. })));
    }

    #[test]
    fn first_cycle_uses_gestation_then_effective_gestation() {
        let mut engine = engine(ReproductiveStrategy::Standard, &InitialPopulation::Random { size: 50 }, 2);
        let gestation = engine.params().gestation_days;
        let effective = engine.params().effective_gestation_days;
        engine.advance_cycle();
        assert_eq!(engine.day(), gestation);
        engine.advance_cycle();
        assert_eq!(engine.day(), gestation + effective);
        assert_eq!(engine.cycle(), 2);
    }

    #[test]
    fn single_sex_population_ends_in_one_cycle() {
        let initial = seeds(&[(true, 6_000), (true, 7_000), (true, 8_000)]);
        let mut engine = engine(ReproductiveStrategy::Standard, &initial, 3);
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.end_reason, Some(EndReason::SexExtinct));
    }

    #[test]
    fn single_sex_is_fine_for_hermaphrodites() {
        let initial = seeds(&[(true, 6_000), (true, 7_000), (true, 8_000)]);
        let mut engine = engine(ReproductiveStrategy::Hermaphroditic, &initial, 3);
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.end_reason, None);
        assert_eq!(outcome.snapshot.male_count, 0);
    }

    #[test]
    fn reverse_agers_die_at_zero() {
        let initial = seeds(&[(true, 100), (false, 100), (true, 20_000), (false, 20_000)]);
        let mut engine = engine(ReproductiveStrategy::ReverseAging, &initial, 4);
        let outcome = engine.advance_cycle();
        assert!(outcome.deaths.old_age >= 2);
        assert!(engine.population().agents().all(|agent| agent.age_days > 0));
    }

    #[test]
    fn reverse_aging_newborns_start_at_lifespan() {
        let mut params = species(ReproductiveStrategy::ReverseAging);
        params.per_cycle_fertility_rate = 0.999;
        params.fertility_rising_steepness = 0.0;
        params.fertility_falling_steepness = 0.0;
        params.coupling_rate = 1.0;
        params.infant_mortality_rate = 0.0;
        params.per_cycle_adult_mortality_rate = 0.0;
        params.maternal_mortality_rate = 0.0;
        let lifespan = params.lifespan_days;
        // Reverse agers count down, so "young adults" hold large ages.
        let initial = seeds(&[(true, 15_000), (false, 15_000), (true, 15_000), (false, 15_000)]);
        let Ok(mut engine) = CycleEngine::new(
            params,
            environment(),
            &initial,
            EngineOptions::default(),
            SmallRng::seed_from_u64(5),
        ) else {
            panic!("engine construction failed");
        };
        let outcome = engine.advance_cycle();
        assert!(outcome.snapshot.births > 0);
        assert!(engine.population().agents().any(|agent| agent.age_days == lifespan));
    }

    #[test]
    fn sequential_males_turn_female_past_threshold() {
        let initial = seeds(&[(false, 12_700), (true, 6_000)]);
        let mut engine = engine(ReproductiveStrategy::sequential(), &initial, 6);
        engine.advance_cycle();
        let changed = engine
            .population()
            .agents()
            .find(|agent| agent.age_days == 5_479);
        assert!(changed.is_some_and(|agent| agent.is_female()));
    }

    #[test]
    fn forced_respawn_replaces_dead_females() {
        let mut params = species(ReproductiveStrategy::forced_respawn());
        params.per_cycle_adult_mortality_rate = 0.0;
        params.coupling_rate = 0.0;
        // Far past lifespan: the old-age hazard is effectively certain.
        let initial = seeds(&[(true, 60_000), (true, 60_000), (false, 6_000)]);
        let Ok(mut engine) = CycleEngine::new(
            params,
            environment(),
            &initial,
            EngineOptions::default(),
            SmallRng::seed_from_u64(8),
        ) else {
            panic!("engine construction failed");
        };
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.deaths.old_age, 2);
        assert_eq!(outcome.respawns, 2);
        let respawned = engine
            .population()
            .agents()
            .filter(|agent| !agent.is_female() && agent.age_days == 4_748)
            .count();
        assert_eq!(respawned, 2);
    }

    #[test]
    fn unions_stay_consistent_across_cycles() {
        let mut params = species(ReproductiveStrategy::Standard);
        params.per_cycle_adult_mortality_rate = 0.2;
        params.maternal_mortality_rate = 0.1;
        let Ok(mut engine) = CycleEngine::new(
            params,
            environment(),
            &InitialPopulation::Random { size: 400 },
            EngineOptions::default(),
            SmallRng::seed_from_u64(9),
        ) else {
            panic!("engine construction failed");
        };
        for _ in 0..20 {
            let outcome = engine.advance_cycle();
            assert!(engine.population().unions_consistent());
            if outcome.end_reason.is_some() {
                break;
            }
        }
    }

    #[test]
    fn population_never_exceeds_capacity() {
        let mut params = species(ReproductiveStrategy::Standard);
        params.coupling_rate = 1.0;
        params.per_cycle_fertility_rate = 0.99;
        params.fertility_rising_steepness = 0.0;
        params.fertility_falling_steepness = 0.0;
        let options = EngineOptions {
            capacity_mode: CapacityMode::Static,
            carrying_capacity_override: Some(150),
        };
        let Ok(mut engine) = CycleEngine::new(
            params,
            environment(),
            &InitialPopulation::Random { size: 140 },
            options,
            SmallRng::seed_from_u64(10),
        ) else {
            panic!("engine construction failed");
        };
        for _ in 0..15 {
            let outcome = engine.advance_cycle();
            assert!(outcome.snapshot.total_population <= 150);
            if outcome.end_reason.is_some() {
                break;
            }
        }
    }

    #[test]
    fn composition_adjusted_capacity_grows_for_juveniles() {
        let params = species(ReproductiveStrategy::Standard);
        let options = EngineOptions {
            capacity_mode: CapacityMode::CompositionAdjusted,
            carrying_capacity_override: None,
        };
        let initial = seeds(&[(true, 100), (false, 100)]);
        let Ok(mut engine) = CycleEngine::new(
            params,
            environment(),
            &initial,
            options,
            SmallRng::seed_from_u64(11),
        ) else {
            panic!("engine construction failed");
        };
        let nominal = engine.carrying_capacity();
        engine.advance_cycle();
        assert!(engine.carrying_capacity() > nominal);
    }

    /// Parameters where every adult pairs and nearly every mother conceives.
    fn eager_breeders(strategy: ReproductiveStrategy) -> SpeciesParameters {
        let mut params = species(strategy);
        params.per_cycle_fertility_rate = 0.999;
        params.fertility_rising_steepness = 0.0;
        params.fertility_falling_steepness = 0.0;
        params.coupling_rate = 3.0;
        params
    }

    fn adults(females: usize, males: usize) -> InitialPopulation {
        let specs: Vec<(bool, i64)> = std::iter::repeat_n((true, 7_000), females)
            .chain(std::iter::repeat_n((false, 7_000), males))
            .collect();
        seeds(&specs)
    }

    fn build(params: SpeciesParameters, initial: &InitialPopulation, seed: u64) -> CycleEngine<SmallRng> {
        let Ok(engine) = CycleEngine::new(
            params,
            environment(),
            initial,
            EngineOptions::default(),
            SmallRng::seed_from_u64(seed),
        ) else {
            panic!("engine construction failed");
        };
        engine
    }

    #[test]
    fn certain_infant_mortality_loses_every_newborn() {
        let mut params = eager_breeders(ReproductiveStrategy::Standard);
        params.infant_mortality_rate = 1.0;
        let mut engine = build(params, &adults(20, 20), 12);
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.snapshot.births, 0);
        assert!(outcome.deaths.infant > 0);
        assert_eq!(outcome.snapshot.total_population, 40);
        assert!(engine.population().agents().all(|agent| agent.healthy_children == 0));
    }

    #[test]
    fn multiple_births_produce_litters() {
        let mut params = eager_breeders(ReproductiveStrategy::Standard);
        params.multiple_birth_chance = 0.9;
        let mut engine = build(params, &adults(10, 10), 13);
        let outcome = engine.advance_cycle();
        let recorded: u64 = engine
            .population()
            .agents()
            .map(|agent| u64::from(agent.healthy_children))
            .sum();
        assert_eq!(recorded, outcome.snapshot.births);
        assert!(outcome.snapshot.births > 10);
        assert!(engine.population().agents().any(|agent| agent.healthy_children >= 2));
        assert!(outcome.snapshot.births <= 10 * u64::from(MAX_LITTER_SIZE));
    }

    #[test]
    fn contraception_cuts_conception() {
        let mut params = eager_breeders(ReproductiveStrategy::Standard);
        let mut open = build(params.clone(), &adults(200, 200), 14);
        params.contraception_rate = 1.0;
        let mut protected = build(params, &adults(200, 200), 14);

        let open_births = open.advance_cycle().snapshot.births;
        let protected_births = protected.advance_cycle().snapshot.births;
        assert!(open_births >= 190);
        assert!(protected_births > 0 && protected_births <= 60);
    }

    #[test]
    fn certain_maternal_mortality_kills_every_mother() {
        let mut params = eager_breeders(ReproductiveStrategy::Standard);
        params.maternal_mortality_rate = 1.0;
        let mut engine = build(params, &adults(10, 10), 15);
        let outcome = engine.advance_cycle();
        let surviving_founders = engine
            .population()
            .agents()
            .filter(|agent| agent.is_female() && agent.age_days == 7_270)
            .count();
        assert_eq!(outcome.snapshot.eligible_mothers, 10);
        assert!(outcome.deaths.maternal > 0);
        assert_eq!(outcome.deaths.maternal + u64::try_from(surviving_founders).unwrap_or(u64::MAX), 10);
        assert_eq!(outcome.deaths.adult, 0);
        assert!(
            engine
                .population()
                .agents()
                .filter(|agent| agent.is_female() && agent.age_days == 7_270)
                .all(|agent| agent.healthy_children == 0)
        );
    }

    #[test]
    fn polygamy_groups_one_male_with_several_females() {
        let mut params = eager_breeders(ReproductiveStrategy::Standard);
        params.marriage_type = MarriageType::Polygamy;
        params.max_union_size = 4;
        let mut engine = build(params, &adults(30, 10), 16);
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.unions_formed, 10);
        let population = engine.population();
        for union in population.unions() {
            let females = union
                .members
                .iter()
                .filter(|id| population.get(**id).is_some_and(|agent| agent.is_female()))
                .count();
            assert_eq!(union.members.len() - females, 1);
            assert_eq!(females, 3);
        }
        assert!(population.unions_consistent());
    }

    #[test]
    fn asexual_unions_hold_one_member() {
        let mut params = eager_breeders(ReproductiveStrategy::Hermaphroditic);
        params.marriage_type = MarriageType::Asexual;
        params.max_union_size = 1;
        let mut engine = build(params, &adults(6, 0), 17);
        let outcome = engine.advance_cycle();
        assert_eq!(outcome.unions_formed, 6);
        assert!(engine.population().unions().all(|union| union.members.len() == 1));
        assert!(outcome.snapshot.births > 0);
        assert_eq!(outcome.end_reason, None);
    }

    #[test]
    fn large_population_snapshot_reports_a_median() {
        let specs: Vec<(bool, i64)> = (0..6_000_i64).map(|i| (i % 2 == 0, i * 4)).collect();
        let engine = engine(ReproductiveStrategy::Standard, &seeds(&specs), 18);
        let exact = summary::exact_median(&engine.ages_lived_years()).unwrap_or(f64::NAN);
        let reported = engine
            .history()
            .first()
            .and_then(|snapshot| snapshot.median_age_years)
            .unwrap_or(f64::NAN);
        assert!((reported - exact).abs() < 3.0);
    }

    #[test]
    fn death_tally_totals_all_causes() {
        let mut tally = DeathTally::default();
        tally.record(DeathCause::OldAge);
        tally.record(DeathCause::Culled);
        tally.record(DeathCause::Culled);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.culled, 2);
    }
}
