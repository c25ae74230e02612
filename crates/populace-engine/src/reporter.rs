//! Console reporting and history export.
//!
//! [`ConsoleReporter`] is the engine's [`CycleCallback`]: it logs a
//! progress line every few cycles, then prints the end-of-run summary and
//! the population pyramid. [`write_history`] saves the summary with its
//! full cycle history as JSON for plotting elsewhere.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use populace_core::runner::CycleCallback;
use populace_core::{CycleOutcome, Population};
use populace_demography::SpeciesParameters;
use populace_types::{CycleSnapshot, EARTH_YEAR_DAYS, RunSummary, days_to_years};
use tracing::info;

use crate::error::EngineError;

/// Width of one side of the pyramid, in bar characters.
const PYRAMID_WIDTH: usize = 30;

/// Number of age brackets a lifespan is split into.
const PYRAMID_BRACKETS_PER_LIFESPAN: i64 = 15;

/// Progress reports per run when no interval is configured.
const REPORTS_PER_RUN: i64 = 5;

const PYRAMID_BAR: char = '█';

// ---------------------------------------------------------------------------
// ConsoleReporter
// ---------------------------------------------------------------------------

/// Logs progress and prints the final report.
pub struct ConsoleReporter {
    hermaphroditic: bool,
    lifespan_days: i64,
    log_interval: u64,
    show_pyramid: bool,
    cycles_since_log: u64,
    last_snapshot: Option<CycleSnapshot>,
}

impl ConsoleReporter {
    /// Create a reporter for a species, logging every `log_interval`
    /// cycles.
    pub fn new(params: &SpeciesParameters, log_interval: u64, show_pyramid: bool) -> Self {
        Self {
            hermaphroditic: params.strategy.is_hermaphroditic(),
            lifespan_days: params.lifespan_days,
            log_interval: log_interval.max(1),
            show_pyramid,
            cycles_since_log: 0,
            last_snapshot: None,
        }
    }

    /// Log one snapshot as a progress line.
    pub fn log_snapshot(&self, snapshot: &CycleSnapshot) {
        let year = days_to_years(snapshot.day);
        if self.hermaphroditic {
            info!(
                cycle = snapshot.cycle,
                day = snapshot.day,
                year = format_args!("{year:.1}"),
                population = snapshot.total_population,
                median_age = ?snapshot.median_age_years,
                births = snapshot.births,
                deaths = snapshot.deaths,
                eligible_mothers = snapshot.eligible_mothers,
                "Cycle report"
            );
        } else {
            info!(
                cycle = snapshot.cycle,
                day = snapshot.day,
                year = format_args!("{year:.1}"),
                population = snapshot.total_population,
                median_age = ?snapshot.median_age_years,
                females = snapshot.female_count,
                males = snapshot.male_count,
                sex_ratio = ?sex_ratio(snapshot),
                births = snapshot.births,
                deaths = snapshot.deaths,
                eligible_mothers = snapshot.eligible_mothers,
                "Cycle report"
            );
        }
    }
}

impl CycleCallback for ConsoleReporter {
    fn on_cycle_complete(&mut self, outcome: &CycleOutcome, _population: &Population) {
        self.cycles_since_log = self.cycles_since_log.saturating_add(1);
        if self.cycles_since_log >= self.log_interval || outcome.end_reason.is_some() {
            self.log_snapshot(&outcome.snapshot);
            self.cycles_since_log = 0;
            self.last_snapshot = None;
        } else {
            self.last_snapshot = Some(outcome.snapshot.clone());
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary, population: &Population) {
        if let Some(snapshot) = self.last_snapshot.take() {
            self.log_snapshot(&snapshot);
        }
        print!("{}", SummaryReport(summary));
        if self.show_pyramid {
            print!(
                "{}",
                PyramidChart {
                    population,
                    lifespan_days: self.lifespan_days,
                    hermaphroditic: self.hermaphroditic,
                }
            );
        }
    }
}

/// Cycles between progress reports: about five reports per run.
pub fn default_log_interval(target_days: i64, effective_gestation_days: i64) -> u64 {
    let per_report = effective_gestation_days.saturating_mul(REPORTS_PER_RUN);
    if per_report <= 0 {
        return 1;
    }
    let cycles = target_days.checked_div(per_report).unwrap_or(0);
    u64::try_from(cycles).unwrap_or(0).max(1)
}

#[allow(clippy::cast_precision_loss)]
fn sex_ratio(snapshot: &CycleSnapshot) -> Option<f64> {
    (snapshot.female_count > 0)
        .then(|| snapshot.male_count as f64 / snapshot.female_count as f64)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// The end-of-run summary block.
pub struct SummaryReport<'a>(pub &'a RunSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        writeln!(f, "\n--- Simulation Finished ({}) ---", summary.end_reason)?;
        writeln!(f, "Species: {}", summary.species_name)?;
        writeln!(f, "Final Population: {}", summary.final_population)?;
        writeln!(f, "Elapsed: {}", format_duration(summary.elapsed_years))?;
        writeln!(f, "Total Births: {}", summary.total_births)?;
        writeln!(
            f,
            "Total Deaths: {} ({} culled)",
            summary.total_deaths, summary.total_culled
        )?;
        match summary.old_age_death_share {
            Some(share) => writeln!(f, "Died of Old Age: {:.2}%", share * 100.0)?,
            None => writeln!(f, "Died of Old Age: N/A (0 deaths)")?,
        }
        writeln!(f, "Cycles Completed: {}", summary.cycles_completed)?;
        writeln!(f, "Total Fertility Rate: {:.2}", summary.total_fertility_rate)?;
        writeln!(
            f,
            "Crude Birth Rate: {:.2} per 1,000/year",
            summary.crude_birth_rate
        )?;
        writeln!(
            f,
            "Crude Death Rate: {:.2} per 1,000/year",
            summary.crude_death_rate
        )?;
        writeln!(
            f,
            "Rate of Natural Increase: {:.2} per 1,000/year",
            summary.rate_of_natural_increase
        )?;
        match summary.population_change_percent {
            Some(change) => writeln!(f, "Population Change: {change:.2}%")?,
            None => writeln!(f, "Population Change: N/A")?,
        }
        match summary.median_age_years {
            Some(median) => writeln!(f, "Median Age: {median:.1} years"),
            None => writeln!(f, "Median Age: N/A"),
        }
    }
}

/// Human-readable duration: `"5 years, 3 months, 2 days"`.
///
/// Zero-valued parts are dropped; an empty duration reads `"0 days"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(years: f64) -> String {
    let years = if years.is_finite() { years.max(0.0) } else { 0.0 };
    let whole_years = years.trunc();
    let months_float = (years - whole_years) * 12.0;
    let whole_months = months_float.trunc();
    let days = ((months_float - whole_months) * (EARTH_YEAR_DAYS / 12.0)).round();

    let parts: Vec<String> = [
        (whole_years as u64, "year"),
        (whole_months as u64, "month"),
        (days as u64, "day"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, unit)| {
        if count == 1 {
            format!("{count} {unit}")
        } else {
            format!("{count} {unit}s")
        }
    })
    .collect();

    if parts.is_empty() {
        String::from("0 days")
    } else {
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Pyramid
// ---------------------------------------------------------------------------

/// Head counts for one age bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bracket {
    start: i64,
    females: usize,
    males: usize,
}

/// An ASCII age pyramid, males left and females right.
///
/// Hermaphroditic populations get a single-sided chart. Brackets span a
/// fifteenth of the lifespan (at least one year) and bars are scaled so the
/// fullest bracket is [`PYRAMID_WIDTH`] wide.
pub struct PyramidChart<'a> {
    /// Population to chart.
    pub population: &'a Population,
    /// Species lifespan, which sets the bracket width.
    pub lifespan_days: i64,
    /// Draw a single "Individuals" side.
    pub hermaphroditic: bool,
}

impl fmt::Display for PyramidChart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- Population Pyramid ---")?;
        let brackets = age_brackets(self.population, self.lifespan_days);
        if brackets.is_empty() {
            return writeln!(f, "Population is extinct.");
        }

        let fullest = brackets
            .iter()
            .map(|bracket| bracket.females.max(bracket.males))
            .max()
            .unwrap_or(0)
            .max(1);
        let span = bracket_years(self.lifespan_days);
        let bar = |count: usize| -> String {
            let length = count.saturating_mul(PYRAMID_WIDTH).checked_div(fullest).unwrap_or(0);
            std::iter::repeat_n(PYRAMID_BAR, length).collect()
        };
        let double_width = PYRAMID_WIDTH.saturating_mul(2);

        if self.hermaphroditic {
            writeln!(f, "| Age | {:<double_width$}", "Individuals")?;
            writeln!(f, "+-----+--{}", "-".repeat(double_width))?;
        } else {
            writeln!(f, "{:>PYRAMID_WIDTH$} | Age | {:<PYRAMID_WIDTH$}", "Males", "Females")?;
            let dashes = "-".repeat(PYRAMID_WIDTH);
            writeln!(f, "{dashes}-+-----+--{dashes}")?;
        }

        for bracket in &brackets {
            let end = bracket.start.saturating_add(span).saturating_sub(1);
            let label = format!("{}-{end}", bracket.start);
            if self.hermaphroditic {
                writeln!(f, "| {label:^5} | {}", bar(bracket.females))?;
            } else {
                writeln!(
                    f,
                    "{:>PYRAMID_WIDTH$} | {label:^5} | {}",
                    bar(bracket.males),
                    bar(bracket.females)
                )?;
            }
        }
        Ok(())
    }
}

/// Years covered by one pyramid bracket.
fn bracket_years(lifespan_days: i64) -> i64 {
    let whole_year = EARTH_YEAR_DAYS.round();
    #[allow(clippy::cast_possible_truncation)]
    let year_days = whole_year as i64;
    let lifespan_years = lifespan_days.checked_div(year_days).unwrap_or(0);
    lifespan_years
        .checked_div(PYRAMID_BRACKETS_PER_LIFESPAN)
        .unwrap_or(0)
        .max(1)
}

/// Count individuals per bracket, from age 0 up to the oldest individual.
#[allow(clippy::cast_possible_truncation)]
fn age_brackets(population: &Population, lifespan_days: i64) -> Vec<Bracket> {
    let ages: Vec<(i64, bool)> = population
        .agents()
        .map(|agent| (agent.age_years().max(0.0).trunc() as i64, agent.is_female()))
        .collect();
    let Some(oldest) = ages.iter().map(|(age, _)| *age).max() else {
        return Vec::new();
    };

    let span = bracket_years(lifespan_days);
    let count = oldest.checked_div(span).unwrap_or(0).saturating_add(1);
    let mut brackets: Vec<Bracket> = (0..count)
        .map(|index| Bracket {
            start: index.saturating_mul(span),
            ..Bracket::default()
        })
        .collect();

    for (age, is_female) in ages {
        let index = usize::try_from(age.checked_div(span).unwrap_or(0)).unwrap_or(0);
        if let Some(bracket) = brackets.get_mut(index) {
            if is_female {
                bracket.females = bracket.females.saturating_add(1);
            } else {
                bracket.males = bracket.males.saturating_add(1);
            }
        }
    }
    brackets
}

// ---------------------------------------------------------------------------
// History export
// ---------------------------------------------------------------------------

/// Write the run summary, including the per-cycle history, as pretty JSON.
pub fn write_history(path: &Path, summary: &RunSummary) -> Result<(), EngineError> {
    let io_error = |source| EngineError::HistoryIo {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    info!(path = %path.display(), cycles = summary.history.len(), "History written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use populace_types::{EndReason, Sex};

    use super::*;

    const LIFESPAN_DAYS: i64 = 75 * 365;

    fn day_of_years(years: i64) -> i64 {
        years.saturating_mul(365).saturating_add(10)
    }

    fn chart(population: &Population, hermaphroditic: bool) -> String {
        PyramidChart {
            population,
            lifespan_days: LIFESPAN_DAYS,
            hermaphroditic,
        }
        .to_string()
    }

    fn summary() -> RunSummary {
        RunSummary {
            species_name: String::from("Test Primate"),
            final_population: 120,
            initial_population: 100,
            total_births: 40,
            total_deaths: 20,
            total_culled: 5,
            old_age_death_share: Some(0.25),
            total_fertility_rate: 2.1,
            crude_birth_rate: 30.0,
            crude_death_rate: 15.0,
            rate_of_natural_increase: 15.0,
            population_change_percent: Some(120.0),
            median_age_years: Some(24.3),
            cycles_completed: 9,
            elapsed_years: 2.5,
            end_reason: EndReason::RunLengthReached,
            history: Vec::new(),
        }
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(0.0), "0 days");
        assert_eq!(format_duration(-4.0), "0 days");
        assert_eq!(format_duration(1.0), "1 year");
        assert_eq!(format_duration(10.0), "10 years");
        assert_eq!(format_duration(0.5), "6 months");
        assert_eq!(format_duration(2.5), "2 years, 6 months");
        assert_eq!(format_duration(3.0 / EARTH_YEAR_DAYS), "3 days");
        assert_eq!(format_duration(1.0 / EARTH_YEAR_DAYS), "1 day");
    }

    #[test]
    fn log_interval_targets_five_reports() {
        // 100 years of 365-day cycles.
        assert_eq!(default_log_interval(36_524, 365), 20);
        assert_eq!(default_log_interval(100, 365), 1);
        assert_eq!(default_log_interval(36_524, 0), 1);
    }

    #[test]
    fn bracket_spans_a_fifteenth_of_lifespan() {
        assert_eq!(bracket_years(LIFESPAN_DAYS), 5);
        assert_eq!(bracket_years(365), 1);
        assert_eq!(bracket_years(0), 1);
    }

    #[test]
    fn pyramid_counts_both_sexes() {
        let mut population = Population::new(false);
        population.spawn(Sex::Female, day_of_years(2), true);
        population.spawn(Sex::Female, day_of_years(3), true);
        population.spawn(Sex::Male, day_of_years(4), true);
        population.spawn(Sex::Male, day_of_years(12), true);

        let brackets = age_brackets(&population, LIFESPAN_DAYS);
        assert_eq!(brackets.len(), 3);
        assert_eq!(brackets.first().map(|b| (b.females, b.males)), Some((2, 1)));
        assert_eq!(brackets.get(1).map(|b| (b.females, b.males)), Some((0, 0)));
        assert_eq!(brackets.get(2).map(|b| (b.start, b.males)), Some((10, 1)));

        let chart = chart(&population, false);
        assert!(chart.contains("Males"));
        assert!(chart.contains("Females"));
        assert!(chart.contains("0-4"));
        assert!(chart.contains("10-14"));
        let full_bar: String = std::iter::repeat_n(PYRAMID_BAR, PYRAMID_WIDTH).collect();
        assert!(chart.contains(&full_bar));
    }

    #[test]
    fn hermaphrodite_pyramid_is_single_sided() {
        let mut population = Population::new(true);
        population.spawn(Sex::Female, day_of_years(1), true);
        let chart = chart(&population, true);
        assert!(chart.contains("Individuals"));
        assert!(!chart.contains("Males"));
    }

    #[test]
    fn empty_population_is_extinct() {
        let chart = chart(&Population::new(false), false);
        assert!(chart.contains("Population is extinct."));
    }

    #[test]
    fn summary_lists_headline_figures() {
        let text = SummaryReport(&summary()).to_string();
        assert!(text.contains("Final Population: 120"));
        assert!(text.contains("Elapsed: 2 years, 6 months"));
        assert!(text.contains("Died of Old Age: 25.00%"));
        assert!(text.contains("Population Change: 120.00%"));
    }

    #[test]
    fn history_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        write_history(&path, &summary()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let decoded: RunSummary = serde_json::from_str(&contents).unwrap();
        assert_eq!(decoded, summary());
    }

    #[test]
    fn history_to_missing_directory_fails() {
        let result = write_history(Path::new("/nonexistent/dir/history.json"), &summary());
        assert!(matches!(result, Err(EngineError::HistoryIo { .. })));
    }
}
