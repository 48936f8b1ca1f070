//! Niche merging

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::niching::swarms::NichingSwarms;
use crate::population::Population;
use crate::problem::{euclidean_distance, Objective};
use crate::topology::Topology;

/// Fuses sub-swarms that converged on the same region
pub trait NicheMerging: fmt::Debug {
    /// Merge overlapping sub-swarms into a new snapshot
    fn merge(&self, swarms: &NichingSwarms) -> NichingSwarms;
}

/// Merges two sub-swarms when their best positions are closer than
/// `threshold` or their radii overlap.
///
/// The radius of a sub-swarm is the largest distance between a member's
/// position and the swarm's best position. Members of the absorbed swarm
/// are relocated into the first swarm and follow its best.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusOverlapMerge {
    pub threshold: f64,
}

impl Default for RadiusOverlapMerge {
    fn default() -> Self {
        Self { threshold: 1e-3 }
    }
}

impl RadiusOverlapMerge {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn overlaps(&self, a: &Population, b: &Population, objective: Objective) -> bool {
        let (Some(best_a), Some(best_b)) = (a.topology().best(objective), b.topology().best(objective))
        else {
            return false;
        };
        let distance = euclidean_distance(best_a.best_position(), best_b.best_position());
        distance < self.threshold || distance < radius(a, objective) + radius(b, objective)
    }
}

/// Largest distance of a member from the swarm's best position
pub fn radius(population: &Population, objective: Objective) -> f64 {
    let topology = population.topology();
    let Some(best) = topology.best(objective) else {
        return 0.0;
    };
    topology
        .iter()
        .map(|p| euclidean_distance(p.position(), best.best_position()))
        .fold(0.0, f64::max)
}

fn absorb(into: &Population, other: &Population, objective: Objective) -> Population {
    let mut entities = into.topology().as_slice().to_vec();
    entities.extend(other.topology().iter().cloned());
    let mut topology = Topology::from_unique(entities);
    if let Some(best) = topology.best(objective).map(|p| p.id()) {
        for entity in topology.entities_mut() {
            entity.set_neighbourhood_best(best);
        }
    }
    let mut merged = into.clone();
    merged.set_topology(topology);
    merged
}

impl NicheMerging for RadiusOverlapMerge {
    fn merge(&self, swarms: &NichingSwarms) -> NichingSwarms {
        let objective = swarms
            .main_swarm()
            .problem()
            .map(|p| p.objective())
            .unwrap_or_default();
        let mut sub_swarms = swarms.sub_swarms().to_vec();

        'search: loop {
            for i in 0..sub_swarms.len() {
                for j in (i + 1)..sub_swarms.len() {
                    if self.overlaps(&sub_swarms[i], &sub_swarms[j], objective) {
                        let absorbed = sub_swarms.remove(j);
                        sub_swarms[i] = absorb(&sub_swarms[i], &absorbed, objective);
                        debug!(
                            into = i,
                            absorbed = j,
                            entities = sub_swarms[i].topology().len(),
                            "niches merged"
                        );
                        continue 'search;
                    }
                }
            }
            break;
        }

        let merged = NichingSwarms::from_parts(swarms.main_swarm().clone(), sub_swarms);
        debug_assert!(merged.validate().is_ok());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Particle, ParticleBehavior};

    fn niche(positions: &[f64]) -> Population {
        #[derive(Debug)]
        struct Abs(crate::problem::Domain);

        impl crate::problem::Problem for Abs {
            fn evaluate(&self, position: &[f64]) -> f64 {
                position[0].abs()
            }

            fn domain(&self) -> &crate::problem::Domain {
                &self.0
            }
        }

        let problem = Abs(crate::problem::Domain::uniform(1, -100.0, 100.0).unwrap());
        let particles = positions
            .iter()
            .map(|&x| {
                let mut p = Particle::new(vec![x], ParticleBehavior::default());
                p.evaluate(&problem);
                p
            })
            .collect();
        Population::pso().with_topology(Topology::new(particles).unwrap())
    }

    fn swarms(niches: Vec<Population>) -> NichingSwarms {
        NichingSwarms::of(Population::pso(), niches).unwrap()
    }

    #[test]
    fn radius_is_the_farthest_member() {
        assert_eq!(radius(&niche(&[1.0, 3.0, -2.0]), Objective::Minimise), 3.0);
        assert_eq!(radius(&Population::pso(), Objective::Minimise), 0.0);
    }

    #[test]
    fn overlapping_niches_merge_and_follow_one_leader() {
        let input = swarms(vec![niche(&[10.0, 12.0]), niche(&[11.0, 13.0])]);
        let before: usize = input.entity_count();

        let merged = RadiusOverlapMerge::default().merge(&input);
        assert_eq!(merged.sub_swarms().len(), 1);
        assert_eq!(merged.entity_count(), before);

        let topology = merged.sub_swarms()[0].topology();
        let leader = topology.best(Objective::Minimise).unwrap().id();
        assert!(topology.iter().all(|p| p.neighbourhood_best() == leader));
        assert_eq!(input.sub_swarms().len(), 2);
    }

    #[test]
    fn distant_niches_stay_apart() {
        let input = swarms(vec![niche(&[10.0, 10.5]), niche(&[50.0, 50.5])]);
        let merged = RadiusOverlapMerge::default().merge(&input);
        assert_eq!(merged.sub_swarms().len(), 2);
    }

    #[test]
    fn merging_cascades_until_stable() {
        let input = swarms(vec![
            niche(&[10.0, 11.0]),
            niche(&[30.0, 31.0]),
            niche(&[10.5, 11.5]),
            niche(&[30.5, 31.5]),
        ]);
        let merged = RadiusOverlapMerge::default().merge(&input);
        assert_eq!(merged.sub_swarms().len(), 2);
        assert_eq!(merged.membership().iter().map(Vec::len).sum::<usize>(), 8);
    }
}
