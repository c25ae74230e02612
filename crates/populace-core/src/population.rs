//! The population arena and union registry.
//!
//! Individuals are keyed by [`AgentId`] and unions by [`UnionId`], both
//! assigned monotonically and never reused. Union membership is kept
//! consistent on every removal: a dead or culled member is dropped from
//! its union, and a union that empties or loses its role composition is
//! dissolved and forgotten, leaving its remaining members unpaired.

use std::collections::{BTreeMap, BTreeSet};

use populace_types::{Agent, AgentId, MarriageType, Sex, Union, UnionId};

/// Arena of living individuals plus the unions between them.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Living individuals, keyed by ID.
    agents: BTreeMap<AgentId, Agent>,
    /// Active unions, keyed by ID. Dissolved unions are removed.
    unions: BTreeMap<UnionId, Union>,
    /// Next individual ID to hand out.
    next_agent: AgentId,
    /// Next union ID to hand out.
    next_union: UnionId,
    /// Whether members fill either reproductive role.
    hermaphroditic: bool,
}

impl Population {
    /// Create an empty population.
    pub fn new(hermaphroditic: bool) -> Self {
        Self {
            hermaphroditic,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Individuals
    // -----------------------------------------------------------------------

    /// Add a new unpaired individual and return its ID.
    pub fn spawn(&mut self, sex: Sex, age_days: i64, fertile: bool) -> AgentId {
        let id = self.next_agent;
        self.next_agent = id.next();
        self.agents.insert(id, Agent::new(id, sex, age_days, fertile));
        id
    }

    /// Number of living individuals.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether nobody is alive.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Look up a living individual.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Look up a living individual mutably.
    ///
    /// Callers must not change `union`; use the union methods instead.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Iterate over living individuals in ID order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Iterate mutably over living individuals in ID order.
    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// IDs of all living individuals in ID order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Count females and males.
    pub fn count_by_sex(&self) -> (usize, usize) {
        self.agents.values().fold((0_usize, 0_usize), |(f, m), agent| {
            if agent.is_female() {
                (f.saturating_add(1), m)
            } else {
                (f, m.saturating_add(1))
            }
        })
    }

    /// Remove an individual, keeping its union consistent.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        if let Some(union_id) = agent.union
            && let Some(union) = self.unions.get_mut(&union_id)
        {
            union.remove_member(id);
            self.revalidate_union(union_id);
        }
        Some(agent)
    }

    /// Change an individual's sex, re-checking its union.
    pub fn change_sex(&mut self, id: AgentId, sex: Sex, age_days: i64) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        agent.sex = sex;
        agent.age_days = age_days;
        if let Some(union_id) = agent.union {
            self.revalidate_union(union_id);
        }
    }

    /// Keep only the individuals at the given positions of the ID order,
    /// rebuilding the arena. Returns the individuals that were dropped.
    pub fn retain_positions(&mut self, keep: &BTreeSet<usize>) -> Vec<Agent> {
        let previous = std::mem::take(&mut self.agents);
        let mut dropped = Vec::new();
        for (position, (id, agent)) in previous.into_iter().enumerate() {
            if keep.contains(&position) {
                self.agents.insert(id, agent);
            } else {
                dropped.push(agent);
            }
        }
        self.prune_unions();
        dropped
    }

    // -----------------------------------------------------------------------
    // Unions
    // -----------------------------------------------------------------------

    /// Iterate over active unions in ID order.
    pub fn unions(&self) -> impl Iterator<Item = &Union> {
        self.unions.values()
    }

    /// Look up an active union.
    pub fn union(&self, id: UnionId) -> Option<&Union> {
        self.unions.get(&id)
    }

    /// Whether the individual belongs to a union that can breed.
    pub fn in_viable_union(&self, id: AgentId) -> bool {
        self.agents
            .get(&id)
            .and_then(|agent| agent.union)
            .and_then(|union_id| self.unions.get(&union_id))
            .is_some_and(|union| self.union_is_viable(union))
    }

    /// Form a union from unpaired, living individuals.
    ///
    /// Returns `None` without changing anything when a member is missing,
    /// already paired, listed twice, or the group does not fit or cannot
    /// breed under the marriage type.
    pub fn form_union(
        &mut self,
        marriage_type: MarriageType,
        max_size: usize,
        members: &[AgentId],
    ) -> Option<UnionId> {
        let distinct: BTreeSet<AgentId> = members.iter().copied().collect();
        if members.is_empty() || distinct.len() != members.len() || members.len() > max_size {
            return None;
        }
        let all_unpaired = members
            .iter()
            .all(|id| self.agents.get(id).is_some_and(|agent| agent.union.is_none()));
        if !all_unpaired {
            return None;
        }

        let id = self.next_union;
        let mut union = Union::new(id, marriage_type, max_size);
        for member in members {
            union.add_member(*member);
        }
        if !self.union_is_viable(&union) {
            return None;
        }

        self.next_union = id.next();
        for member in members {
            if let Some(agent) = self.agents.get_mut(member) {
                agent.union = Some(id);
            }
        }
        self.unions.insert(id, union);
        Some(id)
    }

    /// Check every membership link in both directions.
    ///
    /// Every paired individual must be listed by exactly its own union,
    /// and every union member must be alive and point back.
    pub fn unions_consistent(&self) -> bool {
        let mut seen = BTreeSet::new();
        for union in self.unions.values() {
            if union.dissolved || !self.union_is_viable(union) {
                return false;
            }
            for member in &union.members {
                if !seen.insert(*member) {
                    return false;
                }
                let points_back = self
                    .agents
                    .get(member)
                    .is_some_and(|agent| agent.union == Some(union.id));
                if !points_back {
                    return false;
                }
            }
        }
        self.agents
            .values()
            .filter(|agent| agent.union.is_some())
            .all(|agent| seen.contains(&agent.id))
    }

    fn union_is_viable(&self, union: &Union) -> bool {
        let sexes = union
            .members
            .iter()
            .filter_map(|member| self.agents.get(member).map(|agent| agent.sex));
        union.is_viable(sexes, self.hermaphroditic)
    }

    /// Dissolve the union if it lost its composition.
    fn revalidate_union(&mut self, union_id: UnionId) {
        let viable = self
            .unions
            .get(&union_id)
            .is_some_and(|union| self.union_is_viable(union));
        if viable {
            return;
        }
        if let Some(mut union) = self.unions.remove(&union_id) {
            for member in union.dissolve() {
                if let Some(agent) = self.agents.get_mut(&member) {
                    agent.union = None;
                }
            }
        }
    }

    /// Drop dead members from every union, then dissolve broken ones.
    fn prune_unions(&mut self) {
        let union_ids: Vec<UnionId> = self.unions.keys().copied().collect();
        for union_id in union_ids {
            if let Some(union) = self.unions.get_mut(&union_id) {
                let dead: Vec<AgentId> = union
                    .members
                    .iter()
                    .copied()
                    .filter(|member| !self.agents.contains_key(member))
                    .collect();
                for member in dead {
                    union.remove_member(member);
                }
            }
            self.revalidate_union(union_id);
        }
    }
}
