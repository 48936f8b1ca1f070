//! Main swarm plus sub-swarms

use std::collections::HashSet;

use crate::entity::EntityId;
use crate::population::Population;
use crate::{Error, Result};

/// A main swarm and its niches.
///
/// No entity identity appears twice across all populations.
#[derive(Debug, Clone)]
pub struct NichingSwarms {
    main_swarm: Population,
    sub_swarms: Vec<Population>,
}

impl NichingSwarms {
    /// Pair a main swarm with its sub-swarms, rejecting shared identities
    pub fn of(main_swarm: Population, sub_swarms: Vec<Population>) -> Result<Self> {
        let swarms = Self::from_parts(main_swarm, sub_swarms);
        swarms.validate()?;
        Ok(swarms)
    }

    pub(crate) fn from_parts(main_swarm: Population, sub_swarms: Vec<Population>) -> Self {
        Self {
            main_swarm,
            sub_swarms,
        }
    }

    pub fn main_swarm(&self) -> &Population {
        &self.main_swarm
    }

    pub fn sub_swarms(&self) -> &[Population] {
        &self.sub_swarms
    }

    pub fn into_parts(self) -> (Population, Vec<Population>) {
        (self.main_swarm, self.sub_swarms)
    }

    /// Main swarm first, then sub-swarms in order
    pub fn populations(&self) -> impl Iterator<Item = &Population> {
        core::iter::once(&self.main_swarm).chain(self.sub_swarms.iter())
    }

    /// Identities of every population, main swarm first
    pub fn membership(&self) -> Vec<Vec<EntityId>> {
        self.populations().map(|p| p.topology().ids()).collect()
    }

    /// Total number of entities across all populations
    pub fn entity_count(&self) -> usize {
        self.populations().map(|p| p.topology().len()).sum()
    }

    /// Check that no identity is shared between or within populations
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.entity_count());
        for population in self.populations() {
            for entity in population.topology() {
                if !seen.insert(entity.id()) {
                    return Err(Error::DuplicateEntity(entity.id()));
                }
            }
        }
        Ok(())
    }

    /// Panic with the full membership if the identity invariant is broken.
    ///
    /// `candidate` is the entity whose niche creation produced this value.
    pub(crate) fn assert_membership(&self, candidate: EntityId) {
        if let Err(err) = self.validate() {
            panic!(
                "{err} after creating a niche for {candidate}; membership: {:?}",
                self.membership()
            );
        }
    }

    /// Advance every population by one iteration, main swarm first.
    ///
    /// Membership is unchanged. Returns the number of fitness evaluations
    /// performed.
    pub fn iterate(&mut self) -> Result<u64> {
        let before: u64 = self.populations().map(Population::evaluations).sum();
        self.main_swarm.perform_iteration()?;
        for sub_swarm in self.sub_swarms.iter_mut() {
            sub_swarm.perform_iteration()?;
        }
        let after: u64 = self.populations().map(Population::evaluations).sum();
        Ok(after - before)
    }
}
