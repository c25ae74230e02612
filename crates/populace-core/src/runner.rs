//! Run-to-completion control.
//!
//! [`run_to_completion`] drives [`CycleEngine::advance_cycle`] until the
//! requested run length, an optional cycle limit, or extinction stops it.
//! Every completed cycle is reported to a [`CycleCallback`] sink, which is
//! how the engine binary prints progress without the core touching any
//! output.

use populace_types::{EARTH_YEAR_DAYS, EndReason, RunSummary};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cycle::{CycleEngine, CycleOutcome};
use crate::population::Population;
use crate::summary::RunAggregator;

/// When a run stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunBounds {
    /// Simulated years to run for.
    pub years: f64,
    /// Optional hard limit on cycles.
    pub max_cycles: Option<u64>,
}

impl RunBounds {
    /// Run length in whole days, rounded up. Non-positive years give 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn target_days(&self) -> i64 {
        let days = (self.years * EARTH_YEAR_DAYS).ceil();
        if days.is_nan() || days <= 0.0 {
            0
        } else {
            // Saturating float-to-int conversion.
            days as i64
        }
    }
}

/// Sink for per-cycle and end-of-run results.
///
/// Implementations can log, render, or export results. The callback
/// receives the cycle outcome together with the population it describes.
pub trait CycleCallback: Send {
    /// Called after each cycle completes.
    fn on_cycle_complete(&mut self, outcome: &CycleOutcome, population: &Population);

    /// Called once after the summary is computed.
    fn on_run_complete(&mut self, _summary: &RunSummary, _population: &Population) {}
}

/// A callback that ignores everything.
pub struct NoOpCallback;

impl CycleCallback for NoOpCallback {
    fn on_cycle_complete(&mut self, _outcome: &CycleOutcome, _population: &Population) {}
}

/// Advance the engine until a stop condition fires and summarise the run.
///
/// Checks, in order before every cycle: the day counter against the run
/// length, then the cycle limit. After every cycle the engine's own
/// extinction verdict ends the run.
pub fn run_to_completion<R: Rng>(
    engine: &mut CycleEngine<R>,
    bounds: &RunBounds,
    callback: &mut dyn CycleCallback,
) -> RunSummary {
    let target_days = bounds.target_days();
    let initial = engine.history().first().cloned();
    let mut aggregator = match initial {
        Some(snapshot) => RunAggregator::new(&engine.params().name, &snapshot),
        None => {
            warn!("Engine has no seeded snapshot, aggregating from an empty start");
            RunAggregator::new(&engine.params().name, &empty_snapshot())
        }
    };

    info!(
        species = %engine.params().name,
        years = bounds.years,
        target_days,
        max_cycles = ?bounds.max_cycles,
        "Run starting"
    );

    let end_reason = loop {
        if engine.day() >= target_days {
            break EndReason::RunLengthReached;
        }
        if let Some(limit) = bounds.max_cycles
            && engine.cycle() >= limit
        {
            break EndReason::CycleLimitReached;
        }
        let outcome = engine.advance_cycle();
        aggregator.record(&outcome);
        callback.on_cycle_complete(&outcome, engine.population());
        if let Some(reason) = outcome.end_reason {
            break reason;
        }
    };

    let median_age = engine.sampled_median_age();
    let summary = aggregator.finish(
        engine.population(),
        engine.params(),
        engine.day(),
        end_reason,
        median_age,
    );
    callback.on_run_complete(&summary, engine.population());
    log_run_end(&summary);
    summary
}

/// Log the end-of-run summary at INFO.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        species = %summary.species_name,
        reason = %summary.end_reason,
        cycles = summary.cycles_completed,
        elapsed_years = summary.elapsed_years,
        final_population = summary.final_population,
        total_births = summary.total_births,
        total_deaths = summary.total_deaths,
        "Run ended"
    );
    if summary.cycles_completed == 0 {
        warn!("Run ended with no cycles executed");
    }
}

fn empty_snapshot() -> populace_types::CycleSnapshot {
    populace_types::CycleSnapshot {
        cycle: 0,
        day: 0,
        total_population: 0,
        female_count: 0,
        male_count: 0,
        births: 0,
        deaths: 0,
        culled: 0,
        old_age_deaths: 0,
        eligible_mothers: 0,
        carrying_capacity: 0,
        median_age_years: None,
    }
}
