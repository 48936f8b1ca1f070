//! Single-population algorithms
//!
//! A [`Population`] owns one topology and the iteration strategy that
//! advances it. The optimisation problem is shared through an [`Arc`] and
//! never mutated. Every population owns its own seeded RNG, so a cloned
//! prototype replays exactly unless it is reseeded.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::algorithms::Neighbourhood;
use crate::boundary::BoundaryConstraint;
use crate::control::Progress;
use crate::entity::{Particle, ParticleBehavior};
use crate::iteration::{IterationContext, IterationStrategy, SynchronousIterationStrategy};
use crate::problem::{Objective, Problem};
use crate::stopping::{RunStatus, StoppingCondition};
use crate::topology::{update_neighbourhood_bests, Topology};
use crate::{Error, Result};

/// One population advanced by one iteration strategy
#[derive(Debug, Clone)]
pub struct Population {
    topology: Topology,
    strategy: Box<dyn IterationStrategy>,
    problem: Option<Arc<dyn Problem>>,
    stopping_conditions: Vec<StoppingCondition>,
    neighbourhood: Neighbourhood,
    seed: u64,
    rng: StdRng,
    iterations: u32,
    evaluations: u64,
}

impl Population {
    /// Empty population advanced by `strategy`
    pub fn new(strategy: impl IterationStrategy + 'static) -> Self {
        Self {
            topology: Topology::default(),
            strategy: Box::new(strategy),
            problem: None,
            stopping_conditions: Vec::new(),
            neighbourhood: Neighbourhood::default(),
            seed: 0,
            rng: StdRng::seed_from_u64(0),
            iterations: 0,
            evaluations: 0,
        }
    }

    /// Empty particle swarm with a synchronous update
    pub fn pso() -> Self {
        Self::new(SynchronousIterationStrategy::new())
    }

    pub fn with_problem(mut self, problem: Arc<dyn Problem>) -> Self {
        self.problem = Some(problem);
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_stopping_condition(mut self, condition: StoppingCondition) -> Self {
        self.stopping_conditions.push(condition);
        self
    }

    pub fn with_neighbourhood(mut self, neighbourhood: Neighbourhood) -> Self {
        self.neighbourhood = neighbourhood;
        self
    }

    pub fn with_boundary_constraint(mut self, constraint: BoundaryConstraint) -> Self {
        self.strategy.set_boundary_constraint(constraint);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    pub fn problem(&self) -> Option<&Arc<dyn Problem>> {
        self.problem.as_ref()
    }

    pub fn set_problem(&mut self, problem: Arc<dyn Problem>) {
        self.problem = Some(problem);
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Replace the whole membership
    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
    }

    pub fn strategy(&self) -> &dyn IterationStrategy {
        self.strategy.as_ref()
    }

    pub fn strategy_mut(&mut self) -> &mut dyn IterationStrategy {
        self.strategy.as_mut()
    }

    pub fn stopping_conditions(&self) -> &[StoppingCondition] {
        &self.stopping_conditions
    }

    pub fn neighbourhood(&self) -> Neighbourhood {
        self.neighbourhood
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the random stream from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            iterations: self.iterations,
            evaluations: self.evaluations,
        }
    }

    /// Run progress: the furthest along of all stopping conditions
    pub fn progress(&self) -> Progress {
        let status = self.status();
        let percentage = self
            .stopping_conditions
            .iter()
            .map(|c| c.percentage_complete(&status))
            .fold(0.0, f64::max);
        Progress::new(self.iterations, percentage)
    }

    /// Whether any stopping condition is met (never, without conditions)
    pub fn is_finished(&self) -> bool {
        let status = self.status();
        self.stopping_conditions
            .iter()
            .any(|c| c.is_completed(&status))
    }

    fn objective(&self) -> Objective {
        self.problem
            .as_ref()
            .map(|p| p.objective())
            .unwrap_or_default()
    }

    /// Entity with the best personal best
    pub fn best(&self) -> Option<&Particle> {
        self.topology.best(self.objective())
    }

    /// Replace the topology with `size` evaluated particles sampled
    /// uniformly from the problem domain, each carrying a copy of `behavior`
    pub fn initialise(&mut self, size: usize, behavior: &ParticleBehavior) -> Result<()> {
        let problem = self.problem.clone().ok_or(Error::ProblemNotSet)?;
        let domain = problem.domain();
        let mut particles: Vec<Particle> = (0..size)
            .map(|_| Particle::new(domain.sample(&mut self.rng), behavior.clone()))
            .collect();
        for particle in particles.iter_mut() {
            particle.evaluate(problem.as_ref());
        }
        self.evaluations += size as u64;
        update_neighbourhood_bests(&mut particles, self.neighbourhood, problem.objective());
        self.topology = Topology::from_unique(particles);
        Ok(())
    }

    /// Advance one generation through the iteration strategy
    pub fn perform_iteration(&mut self) -> Result<()> {
        let problem = self.problem.clone().ok_or(Error::ProblemNotSet)?;
        #[cfg(debug_assertions)]
        let before = self.topology.ids();

        let progress = self.progress();
        let mut ctx = IterationContext {
            topology: &mut self.topology,
            problem: problem.as_ref(),
            neighbourhood: self.neighbourhood,
            progress,
            rng: &mut self.rng,
            evaluations: 0,
        };
        self.strategy.perform_iteration(&mut ctx)?;
        let evaluations = ctx.evaluations;

        #[cfg(debug_assertions)]
        debug_assert_eq!(
            before,
            self.topology.ids(),
            "iteration strategy `{}` changed population membership",
            self.strategy.name()
        );

        self.iterations += 1;
        self.evaluations += evaluations;
        debug!(
            strategy = self.strategy.name(),
            iteration = self.iterations,
            entities = self.topology.len(),
            evaluations,
            "population iterated"
        );
        Ok(())
    }

    /// Iterate until a stopping condition is met
    pub fn run(&mut self) -> Result<()> {
        if self.stopping_conditions.is_empty() {
            return Err(Error::InvalidConfig(
                "population has no stopping condition".into(),
            ));
        }
        while !self.is_finished() {
            self.perform_iteration()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Domain;

    #[derive(Debug)]
    struct Sphere(Domain);

    impl Problem for Sphere {
        fn evaluate(&self, position: &[f64]) -> f64 {
            position.iter().map(|x| x * x).sum()
        }

        fn domain(&self) -> &Domain {
            &self.0
        }
    }

    fn sphere(dimensions: usize) -> Arc<dyn Problem> {
        Arc::new(Sphere(Domain::uniform(dimensions, -5.0, 5.0).unwrap()))
    }

    #[test]
    fn iterating_without_a_problem_fails() {
        let mut population = Population::pso();
        assert!(matches!(
            population.perform_iteration(),
            Err(Error::ProblemNotSet)
        ));
        assert!(matches!(
            population.initialise(3, &ParticleBehavior::default()),
            Err(Error::ProblemNotSet)
        ));
    }

    #[test]
    fn initialise_samples_inside_the_domain_and_evaluates() {
        let problem = sphere(3);
        let mut population = Population::pso().with_problem(problem.clone()).with_seed(7);
        population
            .initialise(10, &ParticleBehavior::default())
            .unwrap();

        assert_eq!(population.topology().len(), 10);
        assert_eq!(population.evaluations(), 10);
        for particle in population.topology() {
            assert!(problem.domain().contains(particle.position()));
            assert!(!particle.best_fitness().is_nan());
        }
        let best = population.best().unwrap().id();
        assert!(population
            .topology()
            .iter()
            .all(|p| p.neighbourhood_best() == best));
    }

    #[test]
    fn run_stops_at_the_iteration_limit() {
        let mut population = Population::pso()
            .with_problem(sphere(2))
            .with_boundary_constraint(BoundaryConstraint::Clamping)
            .with_stopping_condition(StoppingCondition::MaximumIterations(25));
        population.initialise(5, &ParticleBehavior::default()).unwrap();
        population.run().unwrap();

        assert_eq!(population.iterations(), 25);
        assert_eq!(population.evaluations(), 5 + 25 * 5);
        assert!(population.is_finished());
        assert_eq!(population.progress().percentage_complete, 1.0);
    }

    #[test]
    fn run_without_stopping_conditions_is_rejected() {
        let mut population = Population::pso().with_problem(sphere(1));
        assert!(matches!(population.run(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn best_fitness_never_worsens() {
        let mut population = Population::pso().with_problem(sphere(2)).with_seed(3);
        population.initialise(8, &ParticleBehavior::default()).unwrap();
        let mut best = population.best().unwrap().best_fitness();
        for _ in 0..30 {
            population.perform_iteration().unwrap();
            let next = population.best().unwrap().best_fitness();
            assert!(next <= best);
            best = next;
        }
    }

    #[test]
    fn clones_replay_identically_until_reseeded() {
        let mut original = Population::pso().with_problem(sphere(2)).with_seed(11);
        original.initialise(4, &ParticleBehavior::default()).unwrap();
        let mut replay = original.clone();
        let mut reseeded = original.clone();
        reseeded.reseed(12);

        original.perform_iteration().unwrap();
        replay.perform_iteration().unwrap();
        reseeded.perform_iteration().unwrap();

        let positions =
            |p: &Population| p.topology().iter().map(|e| e.position().to_vec()).collect::<Vec<_>>();
        assert_eq!(positions(&original), positions(&replay));
        assert_ne!(positions(&original), positions(&reseeded));
        assert_eq!(original.topology().ids(), replay.topology().ids());
    }

    #[test]
    fn progress_uses_the_furthest_condition() {
        let mut population = Population::pso()
            .with_problem(sphere(1))
            .with_stopping_condition(StoppingCondition::MaximumIterations(100))
            .with_stopping_condition(StoppingCondition::MaximumEvaluations(20));
        population.initialise(2, &ParticleBehavior::default()).unwrap();
        population.perform_iteration().unwrap();
        // 4 of 20 evaluations beats 1 of 100 iterations
        assert!((population.progress().percentage_complete - 0.2).abs() < 1e-12);
    }
}
