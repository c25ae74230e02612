//! Enumeration types for the Populace simulator.
//!
//! Closed sets that drive branching in the cycle engine: sex, union
//! structure, diet, the species lifecycle variant, death causes, run end
//! reasons, and the recoverable input diagnostics.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

/// Biological sex of an individual.
///
/// Hermaphroditic species record every individual as [`Sex::Female`] and
/// treat them as capable of both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Carries offspring.
    Female,
    /// Sires offspring.
    Male,
}

impl Sex {
    /// Return `true` for [`Sex::Female`].
    pub const fn is_female(self) -> bool {
        matches!(self, Self::Female)
    }

    /// Map the legacy boolean flag used by profile files.
    pub const fn from_is_female(is_female: bool) -> Self {
        if is_female { Self::Female } else { Self::Male }
    }
}

impl core::fmt::Display for Sex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

// ---------------------------------------------------------------------------
// Union structure
// ---------------------------------------------------------------------------

/// Structure of a breeding union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarriageType {
    /// One female-role and one male-role member.
    #[default]
    Monogamy,
    /// One male-role member with several female-role members.
    Polygamy,
    /// A single self-sufficient member.
    Asexual,
}

impl MarriageType {
    /// Fewest members a union of this type needs to breed.
    pub const fn min_members(self) -> usize {
        match self {
            Self::Asexual => 1,
            Self::Monogamy | Self::Polygamy => 2,
        }
    }
}

impl core::fmt::Display for MarriageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Monogamy => write!(f, "monogamy"),
            Self::Polygamy => write!(f, "polygamy"),
            Self::Asexual => write!(f, "asexual"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diet
// ---------------------------------------------------------------------------

/// Diet category that selects which food-energy pools feed the species.
///
/// Profile files spell diets as free-form lowercase strings. Anything not
/// recognised is preserved as [`DietType::Unknown`] and later degrades to
/// the sum of all food pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DietType {
    /// Carnivore and herbivore pools.
    #[default]
    Omnivore,
    /// Carnivore pool only.
    Carnivore,
    /// Herbivore pool only.
    Herbivore,
    /// Ruminant and herbivore pools.
    Ruminant,
    /// Water availability stands in for food energy.
    Autotroph,
    /// Unrecognised diet label, kept verbatim for diagnostics.
    Unknown(String),
}

impl From<String> for DietType {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "omnivore" => Self::Omnivore,
            "carnivore" => Self::Carnivore,
            "herbivore" => Self::Herbivore,
            "ruminant" => Self::Ruminant,
            "autotroph" => Self::Autotroph,
            _ => Self::Unknown(label),
        }
    }
}

impl From<DietType> for String {
    fn from(diet: DietType) -> Self {
        diet.to_string()
    }
}

impl core::fmt::Display for DietType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Omnivore => write!(f, "omnivore"),
            Self::Carnivore => write!(f, "carnivore"),
            Self::Herbivore => write!(f, "herbivore"),
            Self::Ruminant => write!(f, "ruminant"),
            Self::Autotroph => write!(f, "autotroph"),
            Self::Unknown(label) => write!(f, "{label}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reproductive strategy
// ---------------------------------------------------------------------------

/// Age (days) past which a male of a sequential species turns female.
pub const DEFAULT_TRANSITION_AGE_DAYS: i64 = 12_783;

/// Age (days) a sequential-species individual restarts at after its change.
pub const DEFAULT_POST_TRANSITION_AGE_DAYS: i64 = 5_479;

/// Age (days) of the adult male that replaces a dead female in a
/// forced-respawn species.
pub const DEFAULT_RESPAWN_AGE_DAYS: i64 = 4_748;

/// Species lifecycle variant.
///
/// Exactly one variant applies to a species; the cycle engine branches on
/// it instead of on loose boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReproductiveStrategy {
    /// Two fixed sexes, forward aging.
    #[default]
    Standard,
    /// Every individual can fill either reproductive role.
    Hermaphroditic,
    /// Males change to females once they pass a transition age.
    SequentialSexChange {
        /// Age (days) above which a male becomes female.
        #[serde(default = "default_transition_age_days")]
        transition_age_days: i64,
        /// Age (days) the individual is reset to after the change.
        #[serde(default = "default_post_transition_age_days")]
        post_transition_age_days: i64,
    },
    /// Individuals are born at full lifespan and count down to zero.
    ReverseAging,
    /// Every female death spawns a replacement adult male.
    ForcedRespawn {
        /// Age (days) of the replacement male.
        #[serde(default = "default_respawn_age_days")]
        respawn_age_days: i64,
    },
}

const fn default_transition_age_days() -> i64 {
    DEFAULT_TRANSITION_AGE_DAYS
}

const fn default_post_transition_age_days() -> i64 {
    DEFAULT_POST_TRANSITION_AGE_DAYS
}

const fn default_respawn_age_days() -> i64 {
    DEFAULT_RESPAWN_AGE_DAYS
}

impl ReproductiveStrategy {
    /// Sequential sex change with the standard thresholds.
    pub const fn sequential() -> Self {
        Self::SequentialSexChange {
            transition_age_days: DEFAULT_TRANSITION_AGE_DAYS,
            post_transition_age_days: DEFAULT_POST_TRANSITION_AGE_DAYS,
        }
    }

    /// Forced respawn with the standard replacement age.
    pub const fn forced_respawn() -> Self {
        Self::ForcedRespawn {
            respawn_age_days: DEFAULT_RESPAWN_AGE_DAYS,
        }
    }

    /// Return `true` when every individual fills both roles.
    pub const fn is_hermaphroditic(self) -> bool {
        matches!(self, Self::Hermaphroditic)
    }

    /// Return `true` when individuals age towards zero.
    pub const fn ages_backward(self) -> bool {
        matches!(self, Self::ReverseAging)
    }

    /// Return `true` for sequential sex-changing species.
    pub const fn is_sequential(self) -> bool {
        matches!(self, Self::SequentialSexChange { .. })
    }

    /// Return `true` when the loss of one sex ends the run.
    ///
    /// Hermaphrodites never need a second sex, and sequential species can
    /// regrow their female cohort from males.
    pub const fn requires_both_sexes(self) -> bool {
        !matches!(self, Self::Hermaphroditic | Self::SequentialSexChange { .. })
    }
}

impl core::fmt::Display for ReproductiveStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Hermaphroditic => write!(f, "hermaphroditic"),
            Self::SequentialSexChange { .. } => write!(f, "sequential sex change"),
            Self::ReverseAging => write!(f, "reverse aging"),
            Self::ForcedRespawn { .. } => write!(f, "forced respawn"),
        }
    }
}

// ---------------------------------------------------------------------------
// Death causes and run termination
// ---------------------------------------------------------------------------

/// Why an individual left the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Old-age hazard, or reaching age zero for reverse agers.
    OldAge,
    /// Newborn failed the infant survival draw.
    Infant,
    /// Mother died after giving birth.
    Maternal,
    /// Background adult mortality.
    Adult,
    /// Removed to bring the population down to carrying capacity.
    Culled,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OldAge => write!(f, "old age"),
            Self::Infant => write!(f, "infant mortality"),
            Self::Maternal => write!(f, "maternal mortality"),
            Self::Adult => write!(f, "adult mortality"),
            Self::Culled => write!(f, "culled"),
        }
    }
}

/// Why a run stopped advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The day counter reached the requested run length.
    RunLengthReached,
    /// The optional cycle limit was reached first.
    CycleLimitReached,
    /// No individuals remain.
    Extinct,
    /// One sex vanished in a species that needs both.
    SexExtinct,
}

impl core::fmt::Display for EndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RunLengthReached => write!(f, "run length reached"),
            Self::CycleLimitReached => write!(f, "cycle limit reached"),
            Self::Extinct => write!(f, "population extinct"),
            Self::SexExtinct => write!(f, "one sex extinct"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recoverable input diagnostics
// ---------------------------------------------------------------------------

/// A recoverable problem with the inputs, handled by a safe fallback.
///
/// These never abort a run. They are logged when detected and kept on the
/// structure that absorbed them so callers can surface them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegradedInput {
    /// Diet label was not recognised; all food pools were summed.
    UnknownDietType {
        /// The unrecognised label.
        label: String,
    },
    /// A probability parameter was outside its valid range and was clamped.
    RateClamped {
        /// Profile field name.
        parameter: String,
        /// Value as supplied.
        supplied: f64,
        /// Value actually used.
        clamped_to: f64,
    },
    /// Scenario data could not be used; a random population was seeded.
    ScenarioUnavailable {
        /// Scenario name that was requested.
        scenario: String,
        /// Why it could not be used.
        reason: String,
    },
    /// Gestation plus inter-birth interval was not positive; derived
    /// per-cycle rates fell back to zero.
    ZeroEffectiveGestation,
}

impl core::fmt::Display for DegradedInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownDietType { label } => {
                write!(f, "unknown diet type '{label}', using all food sources")
            }
            Self::RateClamped {
                parameter,
                supplied,
                clamped_to,
            } => write!(f, "{parameter} = {supplied} out of range, clamped to {clamped_to}"),
            Self::ScenarioUnavailable { scenario, reason } => {
                write!(f, "scenario '{scenario}' unavailable ({reason}), seeding randomly")
            }
            Self::ZeroEffectiveGestation => {
                write!(f, "effective gestation is not positive, derived rates set to 0")
            }
        }
    }
}
