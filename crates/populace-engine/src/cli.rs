//! Command-line flags.
//!
//! Every flag is optional and overrides the matching value from
//! `populace-config.yaml`.

use std::path::PathBuf;

use clap::Parser;
use populace_core::SimulationConfig;

/// Run an age-structured population simulation.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "populace-engine",
    version,
    about = "Simulate an age-structured population cycle by cycle"
)]
pub struct Cli {
    /// Run configuration file.
    #[arg(long, default_value = "populace-config.yaml")]
    pub config: PathBuf,

    /// Species profile name.
    #[arg(long)]
    pub species: Option<String>,

    /// Locale profile name.
    #[arg(long)]
    pub locale: Option<String>,

    /// Scenario name; seeds the founders instead of a random population.
    #[arg(long)]
    pub scenario: Option<String>,

    /// Simulated years to run.
    #[arg(long)]
    pub years: Option<f64>,

    /// Random seed for a reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hard limit on cycles.
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Write the cycle history and summary as JSON to this path.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Skip the population pyramid.
    #[arg(long)]
    pub no_pyramid: bool,
}

impl Cli {
    /// Overlay the flags that were given onto a loaded configuration.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(species) = &self.species {
            config.profiles.species.clone_from(species);
        }
        if let Some(locale) = &self.locale {
            config.profiles.locale.clone_from(locale);
        }
        if self.scenario.is_some() {
            config.profiles.scenario.clone_from(&self.scenario);
        }
        if let Some(years) = self.years {
            config.run.years = years;
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
        if self.max_cycles.is_some() {
            config.run.max_cycles = self.max_cycles;
        }
        if self.history.is_some() {
            config.output.history_path.clone_from(&self.history);
        }
        if self.no_pyramid {
            config.output.pyramid = false;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn defaults_leave_config_untouched() {
        let cli = Cli::try_parse_from(["populace-engine"]).unwrap();
        assert_eq!(cli.config, Path::new("populace-config.yaml"));

        let mut config = SimulationConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "populace-engine",
            "--species",
            "merlin",
            "--scenario",
            "founders",
            "--years",
            "25.5",
            "--seed",
            "99",
            "--max-cycles",
            "12",
            "--history",
            "out.json",
            "--no-pyramid",
        ])
        .unwrap();

        let mut config = SimulationConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.profiles.species, "merlin");
        assert_eq!(config.profiles.scenario.as_deref(), Some("founders"));
        assert!((config.run.years - 25.5).abs() < f64::EPSILON);
        assert_eq!(config.run.seed, Some(99));
        assert_eq!(config.run.max_cycles, Some(12));
        assert_eq!(config.output.history_path, Some(PathBuf::from("out.json")));
        assert!(!config.output.pyramid);
        assert_eq!(config.profiles.locale, SimulationConfig::default().profiles.locale);
    }

    #[test]
    fn rejects_malformed_years() {
        let cli = Cli::try_parse_from(["populace-engine", "--years", "forever"]);
        assert!(cli.is_err());
    }
}
