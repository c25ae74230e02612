//! Per-cycle and end-of-run output records.

use serde::{Deserialize, Serialize};

use crate::enums::EndReason;

/// Population state and event counts captured after one cycle.
///
/// Cycle 0 is the seeded population before any cycle ran; its event
/// counts are all zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    /// Cycle index, starting at 0 for the seeded state.
    pub cycle: u64,
    /// Simulated day reached at the end of the cycle.
    pub day: i64,
    /// Individuals alive after consolidation.
    pub total_population: usize,
    /// Female individuals (every individual for hermaphrodites).
    pub female_count: usize,
    /// Male individuals.
    pub male_count: usize,
    /// Surviving newborns added this cycle.
    pub births: u64,
    /// Deaths of every cause this cycle, culling included.
    pub deaths: u64,
    /// Individuals removed to enforce carrying capacity.
    pub culled: u64,
    /// Deaths from old age this cycle.
    pub old_age_deaths: u64,
    /// Mothers that met every eligibility condition this cycle.
    pub eligible_mothers: u64,
    /// Carrying capacity in force at consolidation.
    pub carrying_capacity: u64,
    /// Median age in years of the consolidated population, sampled above
    /// 5 000 individuals.
    pub median_age_years: Option<f64>,
}

/// Aggregated statistics for a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Species the run simulated.
    pub species_name: String,
    /// Individuals alive at the end.
    pub final_population: usize,
    /// Individuals alive at cycle 0.
    pub initial_population: usize,
    /// Surviving births across the run.
    pub total_births: u64,
    /// Deaths of every cause across the run.
    pub total_deaths: u64,
    /// Individuals culled across the run.
    pub total_culled: u64,
    /// Old-age deaths as a fraction of all deaths; `None` with no deaths.
    pub old_age_death_share: Option<f64>,
    /// Mean healthy children per completed reproductive life, corrected
    /// for infant mortality.
    pub total_fertility_rate: f64,
    /// Births per 1000 individuals per year.
    pub crude_birth_rate: f64,
    /// Deaths per 1000 individuals per year.
    pub crude_death_rate: f64,
    /// Crude birth rate minus crude death rate.
    pub rate_of_natural_increase: f64,
    /// Final population as a percentage of the initial one; `None` when
    /// the run started empty.
    pub population_change_percent: Option<f64>,
    /// Median age in years of the final population.
    pub median_age_years: Option<f64>,
    /// Cycles executed after seeding.
    pub cycles_completed: u64,
    /// Simulated years elapsed.
    pub elapsed_years: f64,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Every recorded snapshot, cycle 0 first.
    pub history: Vec<CycleSnapshot>,
}
