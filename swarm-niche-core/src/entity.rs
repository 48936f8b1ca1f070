//! Entities and particles
//!
//! Entity identity is an opaque [`EntityId`] token, never value equality.
//! `Clone` on a [`Particle`] is a structural copy that keeps the identity
//! (the same entity seen in a rebuilt snapshot); [`Particle::replicate`] is
//! the deep clone that mints a new identity.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::control::Progress;
use crate::problem::Problem;
use crate::velocity::{VelocityContext, VelocityProvider};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Mint a fresh, process-unique identity
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A member of a population
pub trait Entity {
    /// Identity of the entity
    fn id(&self) -> EntityId;

    /// Current candidate solution
    fn position(&self) -> &[f64];

    /// Fitness of the current position (`NaN` until evaluated)
    fn fitness(&self) -> f64;
}

/// Per-particle update strategies, cloned onto particles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleBehavior {
    velocity_provider: VelocityProvider,
}

impl ParticleBehavior {
    pub fn new(velocity_provider: VelocityProvider) -> Self {
        Self { velocity_provider }
    }

    pub fn velocity_provider(&self) -> &VelocityProvider {
        &self.velocity_provider
    }

    pub fn velocity_provider_mut(&mut self) -> &mut VelocityProvider {
        &mut self.velocity_provider
    }

    pub fn set_velocity_provider(&mut self, velocity_provider: VelocityProvider) {
        self.velocity_provider = velocity_provider;
    }
}

/// Position/velocity/fitness record with identity
#[derive(Debug, Clone)]
pub struct Particle {
    id: EntityId,
    position: Vec<f64>,
    velocity: Vec<f64>,
    fitness: f64,
    best_position: Vec<f64>,
    best_fitness: f64,
    neighbourhood_best: EntityId,
    behavior: ParticleBehavior,
}

impl Particle {
    /// Create an unevaluated particle at rest.
    ///
    /// The particle starts as its own neighbourhood best.
    pub fn new(position: Vec<f64>, behavior: ParticleBehavior) -> Self {
        let id = EntityId::next();
        Self {
            id,
            velocity: vec![0.0; position.len()],
            best_position: position.clone(),
            position,
            fitness: f64::NAN,
            best_fitness: f64::NAN,
            neighbourhood_best: id,
            behavior,
        }
    }

    /// Set the initial velocity
    ///
    /// # Panics
    ///
    /// Panics if the velocity and position dimensions differ.
    pub fn with_velocity(mut self, velocity: Vec<f64>) -> Self {
        assert_eq!(
            velocity.len(),
            self.position.len(),
            "velocity dimension must match position dimension"
        );
        self.velocity = velocity;
        self
    }

    /// Deep clone under a new identity.
    ///
    /// State is copied; a self-referencing neighbourhood best follows the new
    /// identity.
    pub fn replicate(&self) -> Self {
        let id = EntityId::next();
        let neighbourhood_best = if self.neighbourhood_best == self.id {
            id
        } else {
            self.neighbourhood_best
        };
        Self {
            id,
            neighbourhood_best,
            ..self.clone()
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn best_position(&self) -> &[f64] {
        &self.best_position
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn dimensions(&self) -> usize {
        self.position.len()
    }

    pub fn neighbourhood_best(&self) -> EntityId {
        self.neighbourhood_best
    }

    pub fn set_neighbourhood_best(&mut self, id: EntityId) {
        self.neighbourhood_best = id;
    }

    /// Whether the particle is its own neighbourhood best
    pub fn is_neighbourhood_best(&self) -> bool {
        self.neighbourhood_best == self.id
    }

    pub fn behavior(&self) -> &ParticleBehavior {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut ParticleBehavior {
        &mut self.behavior
    }

    pub fn set_behavior(&mut self, behavior: ParticleBehavior) {
        self.behavior = behavior;
    }

    pub fn position_mut(&mut self) -> &mut [f64] {
        &mut self.position
    }

    pub fn velocity_mut(&mut self) -> &mut [f64] {
        &mut self.velocity
    }

    /// Position and velocity, borrowed together
    pub fn kinematics_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.position, &mut self.velocity)
    }

    /// Compute the next velocity through the attached behavior.
    ///
    /// `neighbourhood_best` is the best position of the particle's
    /// neighbourhood best.
    pub fn update_velocity<R: Rng + ?Sized>(
        &mut self,
        neighbourhood_best: &[f64],
        progress: Progress,
        rng: &mut R,
    ) {
        let ctx = VelocityContext {
            position: &self.position,
            velocity: &self.velocity,
            personal_best: &self.best_position,
            neighbourhood_best,
            is_neighbourhood_best: self.neighbourhood_best == self.id,
            progress,
        };
        let velocity = self.behavior.velocity_provider.velocity(&ctx, rng);
        self.velocity = velocity;
    }

    /// `x ← x + v`
    pub fn update_position(&mut self) {
        for (x, v) in self.position.iter_mut().zip(&self.velocity) {
            *x += v;
        }
    }

    /// Evaluate the current position and update the personal best.
    ///
    /// Returns whether the personal best improved.
    pub fn evaluate(&mut self, problem: &dyn Problem) -> bool {
        self.fitness = problem.evaluate(&self.position);
        if problem
            .objective()
            .is_better(self.fitness, self.best_fitness)
        {
            self.best_fitness = self.fitness;
            self.best_position.clone_from(&self.position);
            true
        } else {
            false
        }
    }

    /// Let the behavior adapt after evaluation.
    ///
    /// `was_neighbourhood_best` is the leader flag the particle moved with,
    /// taken before neighbourhood bests were recomputed.
    pub fn update_control_parameters(
        &mut self,
        was_neighbourhood_best: bool,
        improved: bool,
        progress: Progress,
    ) {
        self.behavior
            .velocity_provider
            .update_control_parameters(was_neighbourhood_best, improved, progress);
    }
}

impl Entity for Particle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> &[f64] {
        &self.position
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Domain, Objective};

    #[derive(Debug)]
    struct SumOfSquares(Domain);

    impl Problem for SumOfSquares {
        fn evaluate(&self, position: &[f64]) -> f64 {
            position.iter().map(|x| x * x).sum()
        }

        fn domain(&self) -> &Domain {
            &self.0
        }

        fn objective(&self) -> Objective {
            Objective::Minimise
        }
    }

    #[test]
    fn new_particle_is_its_own_neighbourhood_best() {
        let p = Particle::new(vec![1.0, 2.0], ParticleBehavior::default());
        assert_eq!(p.neighbourhood_best(), p.id());
        assert!(p.fitness().is_nan());
        assert_eq!(p.velocity(), &[0.0, 0.0]);
    }

    #[test]
    fn replicate_mints_new_identity_and_copies_state() {
        let mut p = Particle::new(vec![1.0, 2.0], ParticleBehavior::default());
        p.velocity_mut()[0] = 0.5;
        let r = p.replicate();
        assert_ne!(r.id(), p.id());
        assert_eq!(r.position(), p.position());
        assert_eq!(r.velocity(), p.velocity());
        assert_eq!(r.neighbourhood_best(), r.id());
    }

    #[test]
    fn replicate_keeps_foreign_neighbourhood_best() {
        let leader = Particle::new(vec![0.0], ParticleBehavior::default());
        let mut follower = Particle::new(vec![1.0], ParticleBehavior::default());
        follower.set_neighbourhood_best(leader.id());
        assert_eq!(follower.replicate().neighbourhood_best(), leader.id());
    }

    #[test]
    fn clone_keeps_identity() {
        let p = Particle::new(vec![1.0], ParticleBehavior::default());
        assert_eq!(p.clone().id(), p.id());
    }

    #[test]
    fn evaluate_tracks_personal_best() {
        let problem = SumOfSquares(Domain::uniform(1, -10.0, 10.0).unwrap());
        let mut p = Particle::new(vec![3.0], ParticleBehavior::default());
        assert!(p.evaluate(&problem));
        assert_eq!(p.best_fitness(), 9.0);

        p.position_mut()[0] = 4.0;
        assert!(!p.evaluate(&problem));
        assert_eq!(p.fitness(), 16.0);
        assert_eq!(p.best_fitness(), 9.0);
        assert_eq!(p.best_position(), &[3.0]);
    }

    #[test]
    fn update_position_adds_velocity() {
        let mut p =
            Particle::new(vec![1.0, 1.0], ParticleBehavior::default()).with_velocity(vec![0.5, -2.0]);
        p.update_position();
        assert_eq!(p.position(), &[1.5, -1.0]);
    }
}
