//! Population topologies
//!
//! A [`Topology`] is the ordered membership of one population. Identities are
//! unique within a topology. Iteration steps only ever receive mutable access
//! to the entities themselves (`&mut [Particle]`), so membership can change
//! only by building a new topology.

use std::collections::HashSet;

use crate::algorithms::Neighbourhood;
use crate::entity::{EntityId, Particle};
use crate::problem::Objective;
use crate::{Error, Result};

/// Ordered collection of particles with no duplicate identities
#[derive(Debug, Clone, Default)]
pub struct Topology {
    entities: Vec<Particle>,
}

impl Topology {
    /// Build a topology, rejecting duplicate identities
    pub fn new(entities: Vec<Particle>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.id()) {
                return Err(Error::DuplicateEntity(entity.id()));
            }
        }
        Ok(Self { entities })
    }

    /// Build a topology from entities already known to be unique.
    ///
    /// Uniqueness is still checked in debug builds.
    pub(crate) fn from_unique(entities: Vec<Particle>) -> Self {
        debug_assert!(
            Self::new(entities.clone()).is_ok(),
            "topology built from duplicate identities"
        );
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Particle> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.entities
    }

    /// Mutable access to the entities without the ability to add or remove any
    pub fn entities_mut(&mut self) -> &mut [Particle] {
        &mut self.entities
    }

    pub fn into_entities(self) -> Vec<Particle> {
        self.entities
    }

    /// Identities in topology order
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(Particle::id).collect()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id() == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Particle> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    /// Copy of this topology with every entity in `excluded` filtered out
    pub fn without(&self, excluded: &[EntityId]) -> Topology {
        Self {
            entities: self
                .entities
                .iter()
                .filter(|e| !excluded.contains(&e.id()))
                .cloned()
                .collect(),
        }
    }

    /// Entity with the best personal-best fitness; ties go to the first
    pub fn best(&self, objective: Objective) -> Option<&Particle> {
        self.entities.iter().fold(None, |best, candidate| match best {
            Some(current) if !objective.is_better(candidate.best_fitness(), current.best_fitness()) => {
                Some(current)
            }
            _ => Some(candidate),
        })
    }

    /// Entity nearest to `target` under `distance`, excluding `target` itself.
    ///
    /// Ties are broken by topology order and `NaN` distances are skipped.
    /// Returns `None` when `target` is not a member or no other member has a
    /// comparable distance.
    pub fn closest_to<F>(&self, target: EntityId, mut distance: F) -> Option<(&Particle, f64)>
    where
        F: FnMut(&Particle, &Particle) -> f64,
    {
        let target = self.get(target)?;
        let mut closest: Option<(&Particle, f64)> = None;
        for candidate in self.entities.iter().filter(|e| e.id() != target.id()) {
            let d = distance(target, candidate);
            if d.is_nan() {
                continue;
            }
            match closest {
                Some((_, best)) if d >= best => {}
                _ => closest = Some((candidate, d)),
            }
        }
        closest
    }
}

impl<'a> IntoIterator for &'a Topology {
    type Item = &'a Particle;
    type IntoIter = core::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Point every entity at the best personal best in its neighbourhood.
///
/// Ties go to the first entity in topology order.
pub(crate) fn update_neighbourhood_bests(
    entities: &mut [Particle],
    neighbourhood: Neighbourhood,
    objective: Objective,
) {
    let len = entities.len();
    let bests: Vec<EntityId> = (0..len)
        .map(|i| {
            let mut best = i;
            let mut best_fitness = f64::NAN;
            let mut first = true;
            for j in neighbourhood.members(i, len) {
                let fitness = entities[j].best_fitness();
                if first || objective.is_better(fitness, best_fitness) {
                    best = j;
                    best_fitness = fitness;
                    first = false;
                }
            }
            entities[best].id()
        })
        .collect();

    for (entity, best) in entities.iter_mut().zip(bests) {
        entity.set_neighbourhood_best(best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ParticleBehavior;
    use crate::problem::euclidean_distance;

    fn at(position: &[f64]) -> Particle {
        Particle::new(position.to_vec(), ParticleBehavior::default())
    }

    #[test]
    fn new_rejects_duplicate_identities() {
        let p = at(&[0.0]);
        let result = Topology::new(vec![p.clone(), p.clone()]);
        assert!(matches!(result, Err(Error::DuplicateEntity(id)) if id == p.id()));
    }

    #[test]
    fn without_filters_by_identity_and_keeps_order() {
        let a = at(&[0.0]);
        let b = at(&[1.0]);
        let c = at(&[2.0]);
        let topology = Topology::new(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        let rest = topology.without(&[b.id()]);
        assert_eq!(rest.ids(), vec![a.id(), c.id()]);
        assert_eq!(topology.len(), 3);
    }

    #[test]
    fn closest_to_prefers_nearest_then_first() {
        let origin = at(&[0.0, 0.0]);
        let near = at(&[1.0, 0.0]);
        let also_near = at(&[0.0, 1.0]);
        let far = at(&[5.0, 5.0]);
        let topology =
            Topology::new(vec![far.clone(), origin.clone(), near.clone(), also_near]).unwrap();

        let (closest, d) = topology
            .closest_to(origin.id(), |a, b| euclidean_distance(a.position(), b.position()))
            .unwrap();
        assert_eq!(closest.id(), near.id());
        assert_eq!(d, 1.0);
    }

    #[test]
    fn closest_to_skips_incomparable_distances() {
        let origin = at(&[0.0]);
        let near = at(&[1.0]);
        let broken = at(&[f64::NAN]);
        let far = at(&[4.0]);
        let topology =
            Topology::new(vec![origin.clone(), near.clone(), broken.clone(), far]).unwrap();
        let dist = |a: &Particle, b: &Particle| euclidean_distance(a.position(), b.position());

        let (closest, d) = topology.closest_to(origin.id(), dist).unwrap();
        assert_eq!(closest.id(), near.id());
        assert_eq!(d, 1.0);

        let only_broken = Topology::new(vec![origin.clone(), broken]).unwrap();
        assert!(only_broken.closest_to(origin.id(), dist).is_none());
    }

    #[test]
    fn closest_to_needs_a_member_target_and_a_neighbour() {
        let lone = at(&[0.0]);
        let topology = Topology::new(vec![lone.clone()]).unwrap();
        let dist = |a: &Particle, b: &Particle| euclidean_distance(a.position(), b.position());
        assert!(topology.closest_to(lone.id(), dist).is_none());
        assert!(topology.closest_to(EntityId::next(), dist).is_none());
    }

    #[test]
    fn global_neighbourhood_points_everyone_at_the_best() {
        let problem_free_fitness = [3.0, 1.0, 2.0];
        let mut entities: Vec<Particle> = problem_free_fitness
            .iter()
            .map(|&f| {
                let mut p = at(&[f]);
                // Evaluate against f(x) = x so best fitness equals position.
                p.evaluate(&Identity);
                p
            })
            .collect();
        update_neighbourhood_bests(&mut entities, Neighbourhood::Global, Objective::Minimise);
        let best = entities[1].id();
        assert!(entities.iter().all(|e| e.neighbourhood_best() == best));
        assert!(entities[1].is_neighbourhood_best());
    }

    #[test]
    fn ring_neighbourhood_is_local() {
        let fitness = [5.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        let mut entities: Vec<Particle> = fitness
            .iter()
            .map(|&f| {
                let mut p = at(&[f]);
                p.evaluate(&Identity);
                p
            })
            .collect();
        update_neighbourhood_bests(&mut entities, Neighbourhood::ring(3), Objective::Minimise);
        // index 1 sees {0, 1, 2}: best is index 2
        assert_eq!(entities[1].neighbourhood_best(), entities[2].id());
        // index 0 wraps to {5, 0, 1}: best is index 5
        assert_eq!(entities[0].neighbourhood_best(), entities[5].id());
    }

    #[derive(Debug)]
    struct Identity;

    impl crate::problem::Problem for Identity {
        fn evaluate(&self, position: &[f64]) -> f64 {
            position[0]
        }

        fn domain(&self) -> &crate::problem::Domain {
            unreachable!("domain is not consulted when evaluating")
        }
    }
}
