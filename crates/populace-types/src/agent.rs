//! Individuals and the breeding unions that group them.

use serde::{Deserialize, Serialize};

use crate::calendar::days_to_years;
use crate::enums::{MarriageType, Sex};
use crate::ids::{AgentId, UnionId};

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One biological individual.
///
/// Fertility is fixed when the individual is created and does not change
/// with age; age windows are applied separately by the cycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable arena identifier.
    pub id: AgentId,
    /// Current sex. Only sequential species ever change it.
    pub sex: Sex,
    /// Age in days. Reverse-aging species count down towards zero.
    pub age_days: i64,
    /// Whether the individual can reproduce at all.
    pub fertile: bool,
    /// Children that survived the infant mortality draw.
    pub healthy_children: u32,
    /// Union the individual currently belongs to.
    pub union: Option<UnionId>,
}

impl Agent {
    /// Create an unpaired individual with no children.
    pub const fn new(id: AgentId, sex: Sex, age_days: i64, fertile: bool) -> Self {
        Self {
            id,
            sex,
            age_days,
            fertile,
            healthy_children: 0,
            union: None,
        }
    }

    /// Age in fractional years.
    pub const fn age_years(&self) -> f64 {
        days_to_years(self.age_days)
    }

    /// Return `true` for female individuals.
    pub const fn is_female(&self) -> bool {
        self.sex.is_female()
    }

    /// Return `true` while the individual belongs to a union.
    pub const fn is_coupled(&self) -> bool {
        self.union.is_some()
    }

    /// Record one surviving child.
    pub const fn record_child(&mut self) {
        self.healthy_children = self.healthy_children.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Union
// ---------------------------------------------------------------------------

/// A breeding relationship between one or more individuals.
///
/// Members are stored by id and validated against the population arena by
/// the owner. A dissolved union is never reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    /// Stable arena identifier.
    pub id: UnionId,
    /// Union structure.
    pub marriage_type: MarriageType,
    /// Maximum number of members.
    pub max_size: usize,
    /// Member ids in joining order.
    pub members: Vec<AgentId>,
    /// Set once the union is emptied or loses its role composition.
    pub dissolved: bool,
}

impl Union {
    /// Create an empty, open union.
    pub const fn new(id: UnionId, marriage_type: MarriageType, max_size: usize) -> Self {
        Self {
            id,
            marriage_type,
            max_size,
            members: Vec::new(),
            dissolved: false,
        }
    }

    /// Return `true` when no further members can join.
    pub const fn is_full(&self) -> bool {
        self.members.len() >= self.max_size
    }

    /// Add a member. Returns `false` when the union is dissolved, full, or
    /// already contains the individual.
    pub fn add_member(&mut self, agent: AgentId) -> bool {
        if self.dissolved || self.is_full() || self.members.contains(&agent) {
            return false;
        }
        self.members.push(agent);
        true
    }

    /// Remove a member. An emptied union is dissolved.
    pub fn remove_member(&mut self, agent: AgentId) {
        self.members.retain(|member| *member != agent);
        if self.members.is_empty() {
            self.dissolved = true;
        }
    }

    /// Mark the union dissolved and hand back its remaining members.
    pub fn dissolve(&mut self) -> Vec<AgentId> {
        self.dissolved = true;
        std::mem::take(&mut self.members)
    }

    /// Check the role composition given the sexes of the current members.
    ///
    /// Asexual unions need one member. Hermaphroditic members fill either
    /// role, so any two suffice. Everything else needs at least one female
    /// and one male.
    pub fn is_viable<I>(&self, member_sexes: I, hermaphroditic: bool) -> bool
    where
        I: IntoIterator<Item = Sex>,
    {
        if self.dissolved {
            return false;
        }
        let mut total = 0_usize;
        let mut has_female = false;
        let mut has_male = false;
        for sex in member_sexes {
            total = total.saturating_add(1);
            match sex {
                Sex::Female => has_female = true,
                Sex::Male => has_male = true,
            }
        }
        match self.marriage_type {
            MarriageType::Asexual => total >= 1,
            MarriageType::Monogamy | MarriageType::Polygamy if hermaphroditic => total >= 2,
            MarriageType::Monogamy | MarriageType::Polygamy => has_female && has_male,
        }
    }
}

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

/// Externally supplied description of one starting individual.
///
/// Field names follow the scenario catalog format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSeed {
    /// Whether the individual starts female.
    pub is_female: bool,
    /// Starting age in days.
    pub age_days: i64,
    /// Whether the individual is fertile.
    #[serde(default = "default_initially_fertile")]
    pub is_initially_fertile: bool,
}

const fn default_initially_fertile() -> bool {
    true
}

/// A named starting population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Starting individuals.
    #[serde(default)]
    pub population: Vec<AgentSeed>,
}
