//! Niche creation
//!
//! A creation strategy turns one main-swarm entity into a new sub-swarm.
//! It never mutates the snapshot it is given; the result is a new
//! [`NichingSwarms`] that still satisfies the identity invariant.

use core::fmt;

use tracing::{debug, trace};

use crate::boundary::BoundaryConstraint;
use crate::control::ControlParameter;
use crate::entity::{EntityId, ParticleBehavior};
use crate::niching::swarms::NichingSwarms;
use crate::population::Population;
use crate::problem::euclidean_distance;
use crate::stopping::StoppingCondition;
use crate::topology::Topology;
use crate::velocity::{ClampingVelocity, GcVelocity, StandardVelocity, VelocityProvider};

/// Builds a new niche around one entity of the main swarm
pub trait NicheCreationStrategy: fmt::Debug {
    /// Create a niche for `niching_entity`.
    ///
    /// Returns `swarms` unchanged when the entity cannot seed a niche.
    fn create(&self, swarms: &NichingSwarms, niching_entity: EntityId) -> NichingSwarms;
}

/// NichePSO niche creation.
///
/// The candidate is replicated under a new identity and paired with its
/// closest main-swarm neighbour, which is relocated (not copied). Both
/// receive their own copy of the prototype behavior and form a new sub-swarm
/// built from the prototype sub-swarm. The original candidate is dropped.
#[derive(Debug, Clone)]
pub struct ClosestNeighbourNicheCreation {
    sub_swarm: Population,
    behavior: ParticleBehavior,
}

impl Default for ClosestNeighbourNicheCreation {
    fn default() -> Self {
        let sub_swarm = Population::pso()
            .with_boundary_constraint(BoundaryConstraint::Clamping)
            .with_stopping_condition(StoppingCondition::MaximumIterations(500));

        let standard = VelocityProvider::Standard(StandardVelocity::new(
            ControlParameter::update_on_iteration(ControlParameter::linearly_varying(0.7, 0.2)),
            ControlParameter::constant(1.2),
            ControlParameter::constant(1.2),
        ));
        let clamped = VelocityProvider::Clamping(ClampingVelocity::new(
            ControlParameter::constant(1.0),
            standard,
        ));
        let behavior = ParticleBehavior::new(VelocityProvider::GuaranteedConvergence(
            GcVelocity::new(clamped).with_rho(ControlParameter::constant(0.01)),
        ));

        Self::new(sub_swarm, behavior)
    }
}

impl ClosestNeighbourNicheCreation {
    /// Use `sub_swarm` as the prototype for new niches and attach copies of
    /// `behavior` to their two founding particles
    pub fn new(sub_swarm: Population, behavior: ParticleBehavior) -> Self {
        Self {
            sub_swarm,
            behavior,
        }
    }

    pub fn sub_swarm(&self) -> &Population {
        &self.sub_swarm
    }

    pub fn behavior(&self) -> &ParticleBehavior {
        &self.behavior
    }
}

/// Seed for the `ordinal`-th niche created at `iteration` of a swarm seeded
/// with `seed`
fn niche_seed(seed: u64, iteration: u32, ordinal: usize) -> u64 {
    let salt = (u64::from(iteration) << 32) ^ ordinal as u64;
    seed ^ salt.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl NicheCreationStrategy for ClosestNeighbourNicheCreation {
    fn create(&self, swarms: &NichingSwarms, niching_entity: EntityId) -> NichingSwarms {
        let main = swarms.main_swarm();
        let topology = main.topology();

        let Some(candidate) = topology.get(niching_entity) else {
            trace!(candidate = %niching_entity, "candidate not in main swarm, no niche created");
            return swarms.clone();
        };
        if topology.len() <= 1 {
            trace!(candidate = %niching_entity, "main swarm too small, no niche created");
            return swarms.clone();
        }

        let problem = main.problem();
        let Some((nearest, distance)) = topology.closest_to(niching_entity, |a, b| match problem {
            Some(problem) => problem.distance(a, b),
            None => euclidean_distance(a.position(), b.position()),
        }) else {
            trace!(candidate = %niching_entity, "no comparable neighbour, no niche created");
            return swarms.clone();
        };

        let mut founder = candidate.replicate();
        let founder_id = founder.id();
        founder.set_neighbourhood_best(founder_id);
        founder.set_behavior(self.behavior.clone());

        let mut neighbour = nearest.clone();
        let neighbour_id = neighbour.id();
        neighbour.set_neighbourhood_best(founder_id);
        neighbour.set_behavior(self.behavior.clone());

        let mut niche = self.sub_swarm.clone();
        if let Some(problem) = problem {
            niche.set_problem(problem.clone());
        }
        niche.reseed(niche_seed(
            main.seed(),
            main.iterations(),
            swarms.sub_swarms().len(),
        ));
        niche.set_topology(Topology::from_unique(vec![founder, neighbour]));

        let mut new_main = main.clone();
        new_main.set_topology(topology.without(&[niching_entity, neighbour_id]));

        let mut sub_swarms = swarms.sub_swarms().to_vec();
        sub_swarms.push(niche);

        let created = NichingSwarms::from_parts(new_main, sub_swarms);
        created.assert_membership(niching_entity);

        debug!(
            candidate = %niching_entity,
            founder = %founder_id,
            neighbour = %neighbour_id,
            distance,
            niches = created.sub_swarms().len(),
            "niche created"
        );
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Particle;

    fn particle(position: &[f64]) -> Particle {
        Particle::new(position.to_vec(), ParticleBehavior::default())
    }

    fn swarms_of(particles: Vec<Particle>) -> NichingSwarms {
        let main = Population::pso().with_topology(Topology::new(particles).unwrap());
        NichingSwarms::of(main, Vec::new()).unwrap()
    }

    #[test]
    fn default_prototype_matches_niche_pso() {
        let creation = ClosestNeighbourNicheCreation::default();
        let prototype = creation.sub_swarm();
        assert_eq!(
            prototype.strategy().boundary_constraint(),
            BoundaryConstraint::Clamping
        );
        assert_eq!(
            prototype.stopping_conditions(),
            &[StoppingCondition::MaximumIterations(500)]
        );
        assert!(prototype.topology().is_empty());

        let VelocityProvider::GuaranteedConvergence(gc) = creation.behavior().velocity_provider()
        else {
            panic!("expected guaranteed convergence at the head of the chain");
        };
        assert_eq!(gc.rho, ControlParameter::constant(0.01));
        assert_eq!(creation.behavior().velocity_provider().depth(), 3);

        let VelocityProvider::Clamping(clamping) = gc.delegate.as_ref() else {
            panic!("expected velocity clamping below guaranteed convergence");
        };
        assert_eq!(clamping.maximum, ControlParameter::constant(1.0));

        let VelocityProvider::Standard(standard) = clamping.delegate.as_ref() else {
            panic!("expected the standard update at the end of the chain");
        };
        assert_eq!(
            standard.inertia,
            ControlParameter::update_on_iteration(ControlParameter::linearly_varying(0.7, 0.2))
        );
        assert_eq!(standard.social, ControlParameter::constant(1.2));
        assert_eq!(standard.cognitive, ControlParameter::constant(1.2));
    }

    #[test]
    fn founder_leads_the_new_niche() {
        let b = particle(&[0.0, 0.0]);
        let c = particle(&[1.0, 0.0]);
        let far = particle(&[5.0, 5.0]);
        let swarms = swarms_of(vec![b.clone(), c.clone(), far.clone()]);

        let result = ClosestNeighbourNicheCreation::default().create(&swarms, b.id());
        let niche = &result.sub_swarms()[0];
        let [founder, neighbour] = niche.topology().as_slice() else {
            panic!("niche must hold exactly two particles");
        };

        assert_ne!(founder.id(), b.id());
        assert_eq!(founder.position(), b.position());
        assert_eq!(neighbour.id(), c.id());
        assert_eq!(founder.neighbourhood_best(), founder.id());
        assert_eq!(neighbour.neighbourhood_best(), founder.id());
        assert_eq!(result.main_swarm().topology().ids(), vec![far.id()]);
    }

    #[test]
    fn founders_receive_independent_behaviors() {
        let b = particle(&[0.0]);
        let c = particle(&[1.0]);
        let swarms = swarms_of(vec![b.clone(), c]);
        let creation = ClosestNeighbourNicheCreation::default();

        let result = creation.create(&swarms, b.id());
        let mut niche = result.sub_swarms()[0].clone();
        let mut topology = niche.topology().clone();
        topology.entities_mut()[0]
            .update_control_parameters(true, true, crate::control::Progress::default());
        niche.set_topology(topology);

        let [founder, neighbour] = niche.topology().as_slice() else {
            panic!("niche must hold exactly two particles");
        };
        assert_ne!(founder.behavior(), neighbour.behavior());
        assert_eq!(neighbour.behavior(), creation.behavior());
    }

    #[test]
    fn input_snapshot_is_left_untouched() {
        let b = particle(&[0.0]);
        let c = particle(&[1.0]);
        let swarms = swarms_of(vec![b.clone(), c.clone()]);
        let before = swarms.membership();

        let _ = ClosestNeighbourNicheCreation::default().create(&swarms, b.id());
        assert_eq!(swarms.membership(), before);
        assert!(swarms.sub_swarms().is_empty());
    }

    #[test]
    fn niches_inherit_the_main_swarm_problem_and_get_their_own_stream() {
        use crate::problem::{Domain, Problem};
        use std::sync::Arc;

        #[derive(Debug)]
        struct Flat(Domain);

        impl Problem for Flat {
            fn evaluate(&self, _position: &[f64]) -> f64 {
                0.0
            }

            fn domain(&self) -> &Domain {
                &self.0
            }
        }

        let problem: Arc<dyn Problem> = Arc::new(Flat(Domain::uniform(1, 0.0, 1.0).unwrap()));
        let b = particle(&[0.0]);
        let d = particle(&[0.1]);
        let c = particle(&[0.9]);
        let e = particle(&[1.0]);
        let main = Population::pso()
            .with_problem(problem.clone())
            .with_seed(99)
            .with_topology(Topology::new(vec![b.clone(), d, c.clone(), e]).unwrap());
        let swarms = NichingSwarms::of(main, Vec::new()).unwrap();

        let creation = ClosestNeighbourNicheCreation::default();
        let once = creation.create(&swarms, b.id());
        let twice = creation.create(&once, c.id());

        let niches = twice.sub_swarms();
        assert_eq!(niches.len(), 2);
        for niche in niches {
            assert!(Arc::ptr_eq(niche.problem().unwrap(), &problem));
        }
        assert_ne!(niches[0].seed(), niches[1].seed());
    }
}
