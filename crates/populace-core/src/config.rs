//! Configuration loading and typed config structures for the Populace
//! simulator.
//!
//! The run configuration lives in `populace-config.yaml`. Species, locale
//! and scenario definitions live in separate catalogs: JSON or YAML maps
//! from profile name to record, chosen by file extension.
//!
//! [`SimulationConfig::prepare`] turns a configuration into everything the
//! cycle engine needs, applying the recoverable fallbacks (an unusable
//! scenario degrades to a random population) and surfacing the fatal ones
//! as [`ConfigError`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use populace_demography::{ConfigurationError, SpeciesParameters};
use populace_types::{DegradedInput, EnvironmentProfile, Scenario, SpeciesProfile};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cycle::{CapacityMode, EngineOptions};
use crate::runner::RunBounds;
use crate::seeding::{DEFAULT_STARTING_POPULATION, InitialPopulation};

/// Errors that can occur when loading configuration or profiles.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A named profile is missing from its catalog.
    #[error("{kind} profile '{name}' not found in {path}")]
    ProfileNotFound {
        /// Catalog kind (species, locale, scenario).
        kind: &'static str,
        /// Requested profile name.
        name: String,
        /// Catalog that was searched.
        path: PathBuf,
    },

    /// The species profile cannot be simulated.
    #[error("invalid species configuration: {source}")]
    Configuration {
        /// The underlying configuration error.
        #[from]
        source: ConfigurationError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Top-level run configuration.
///
/// Mirrors the structure of `populace-config.yaml`. Every section and
/// field has a default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run length, seed and starting population.
    #[serde(default)]
    pub run: RunConfig,

    /// Which profiles to load and from where.
    #[serde(default)]
    pub profiles: ProfilesConfig,

    /// Carrying capacity evaluation.
    #[serde(default)]
    pub capacity: CapacityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output artifacts.
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = read(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Run bounds from the `run` section.
    pub const fn bounds(&self) -> RunBounds {
        RunBounds {
            years: self.run.years,
            max_cycles: self.run.max_cycles,
        }
    }

    /// Engine options from the `capacity` section.
    pub const fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            capacity_mode: self.capacity.mode,
            carrying_capacity_override: self.capacity.override_capacity,
        }
    }

    /// Load every profile and build the inputs of a run.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the species or locale catalog cannot
    /// be read or lacks the requested profile, or when the species cannot
    /// be simulated. Scenario problems never fail; they degrade to a
    /// random population.
    pub fn prepare(&self) -> Result<PreparedRun, ConfigError> {
        let profile = load_species(&self.profiles.species_file, &self.profiles.species)?;
        let params = SpeciesParameters::from_profile(&profile)?;
        params.ensure_runnable()?;
        let environment = load_locale(&self.profiles.locale_file, &self.profiles.locale)?;

        let mut degraded = params.degraded.clone();
        let initial = match &self.profiles.scenario {
            Some(name) => match load_scenario(&self.profiles.scenario_file, name) {
                Ok(scenario) => {
                    info!(
                        scenario = %name,
                        individuals = scenario.population.len(),
                        "Loaded scenario population"
                    );
                    InitialPopulation::Seeds(scenario.population)
                }
                Err(err) => {
                    let issue = DegradedInput::ScenarioUnavailable {
                        scenario: name.clone(),
                        reason: err.to_string(),
                    };
                    warn!(issue = %issue, "Degraded input");
                    degraded.push(issue);
                    self.random_population()
                }
            },
            None => self.random_population(),
        };

        Ok(PreparedRun {
            params,
            environment,
            initial,
            options: self.engine_options(),
            bounds: self.bounds(),
            degraded,
        })
    }

    const fn random_population(&self) -> InitialPopulation {
        InitialPopulation::Random {
            size: self.run.starting_population,
        }
    }
}

/// Everything a run needs, resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRun {
    /// Validated species.
    pub params: SpeciesParameters,
    /// Locale the species lives in.
    pub environment: EnvironmentProfile,
    /// Cycle-0 population.
    pub initial: InitialPopulation,
    /// Engine options.
    pub options: EngineOptions,
    /// Stop conditions.
    pub bounds: RunBounds,
    /// Inputs repaired along the way.
    pub degraded: Vec<DegradedInput>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Run length and seeding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    /// Simulated years to run.
    #[serde(default = "default_years")]
    pub years: f64,

    /// Random seed; a fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Size of a random starting population.
    #[serde(default = "default_starting_population")]
    pub starting_population: usize,

    /// Optional hard limit on cycles.
    #[serde(default)]
    pub max_cycles: Option<u64>,

    /// Cycles between progress reports; about five per run when absent.
    #[serde(default)]
    pub log_interval_cycles: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            seed: None,
            starting_population: default_starting_population(),
            max_cycles: None,
            log_interval_cycles: None,
        }
    }
}

/// Profile catalogs and the names to pick from them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfilesConfig {
    /// Species catalog path.
    #[serde(default = "default_species_file")]
    pub species_file: PathBuf,

    /// Species profile name.
    #[serde(default = "default_species")]
    pub species: String,

    /// Locale catalog path.
    #[serde(default = "default_locale_file")]
    pub locale_file: PathBuf,

    /// Locale profile name.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Scenario catalog path.
    #[serde(default = "default_scenario_file")]
    pub scenario_file: PathBuf,

    /// Scenario name; a random population is seeded when absent.
    #[serde(default)]
    pub scenario: Option<String>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            species_file: default_species_file(),
            species: default_species(),
            locale_file: default_locale_file(),
            locale: default_locale(),
            scenario_file: default_scenario_file(),
            scenario: None,
        }
    }
}

/// Carrying capacity evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CapacityConfig {
    /// Static or composition-adjusted.
    #[serde(default)]
    pub mode: CapacityMode,

    /// Fixed capacity that bypasses the diet calculation.
    #[serde(default, rename = "override")]
    pub override_capacity: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Output artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Write the cycle history and summary as JSON to this path.
    #[serde(default)]
    pub history_path: Option<PathBuf>,

    /// Print the population pyramid at the end of the run.
    #[serde(default = "default_pyramid")]
    pub pyramid: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            pyramid: default_pyramid(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// Load a catalog mapping profile names to records.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
/// as JSON.
///
/// # Errors
///
/// Returns [`ConfigError::Io`], [`ConfigError::Yaml`] or
/// [`ConfigError::Json`].
pub fn load_catalog<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, ConfigError> {
    let contents = read(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yml::from_str(&contents)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Load one species profile.
///
/// # Errors
///
/// Returns [`ConfigError::ProfileNotFound`] when the name is absent, or a
/// read/parse error for the catalog itself.
pub fn load_species(path: &Path, name: &str) -> Result<SpeciesProfile, ConfigError> {
    pick(load_catalog(path)?, "species", name, path)
}

/// Load one locale profile, naming it after its catalog key.
///
/// # Errors
///
/// Returns [`ConfigError::ProfileNotFound`] when the name is absent, or a
/// read/parse error for the catalog itself.
pub fn load_locale(path: &Path, name: &str) -> Result<EnvironmentProfile, ConfigError> {
    let mut locale: EnvironmentProfile = pick(load_catalog(path)?, "locale", name, path)?;
    name.clone_into(&mut locale.name);
    Ok(locale)
}

/// Load one scenario.
///
/// # Errors
///
/// Returns [`ConfigError::ProfileNotFound`] when the name is absent, or a
/// read/parse error for the catalog itself.
pub fn load_scenario(path: &Path, name: &str) -> Result<Scenario, ConfigError> {
    pick(load_catalog(path)?, "scenario", name, path)
}

fn pick<T>(
    mut catalog: BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
    path: &Path,
) -> Result<T, ConfigError> {
    catalog.remove(name).ok_or_else(|| ConfigError::ProfileNotFound {
        kind,
        name: name.to_owned(),
        path: path.to_path_buf(),
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_years() -> f64 {
    400.0
}

const fn default_starting_population() -> usize {
    DEFAULT_STARTING_POPULATION
}

fn default_species_file() -> PathBuf {
    PathBuf::from("data/demographics.json")
}

fn default_species() -> String {
    String::from("human")
}

fn default_locale_file() -> PathBuf {
    PathBuf::from("data/locales.json")
}

fn default_locale() -> String {
    String::from("savanna")
}

fn default_scenario_file() -> PathBuf {
    PathBuf::from("data/scenarios.json")
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_pyramid() -> bool {
    true
}
