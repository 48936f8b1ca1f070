//! Iteration strategies
//!
//! An [`IterationStrategy`] advances one population by exactly one
//! generation. Strategies are selected when a population is built and are
//! cloned with it, so every niche carries its own copy.
//!
//! Within an iteration the boundary constraint is always enforced after
//! positions move and before fitness is evaluated.

use core::fmt;

use rand::rngs::StdRng;
use tracing::trace;

use crate::algorithms::Neighbourhood;
use crate::boundary::BoundaryConstraint;
use crate::control::Progress;
use crate::operators::OperatorPipeline;
use crate::problem::{Domain, Problem};
use crate::topology::{update_neighbourhood_bests, Topology};
use crate::{Error, Result};

/// Settings shared by every iteration strategy
#[derive(Debug, Clone, Default)]
pub struct IterationSettings {
    /// Applied after the position update, before evaluation
    pub boundary_constraint: BoundaryConstraint,
    /// Applied before the boundary constraint
    pub operator_pipeline: OperatorPipeline,
}

/// Everything a strategy may touch while advancing one population
pub struct IterationContext<'a> {
    pub topology: &'a mut Topology,
    pub problem: &'a dyn Problem,
    pub neighbourhood: Neighbourhood,
    pub progress: Progress,
    pub rng: &'a mut StdRng,
    /// Fitness evaluations performed during this iteration
    pub evaluations: u64,
}

impl IterationContext<'_> {
    /// Evaluate every entity and update personal bests.
    ///
    /// Returns, per entity and in topology order, whether its personal best
    /// improved.
    pub fn evaluate_all(&mut self) -> Vec<bool> {
        let problem = self.problem;
        let improved: Vec<bool> = self
            .topology
            .entities_mut()
            .iter_mut()
            .map(|entity| entity.evaluate(problem))
            .collect();
        self.evaluations += improved.len() as u64;
        improved
    }

    /// Recompute every entity's neighbourhood best
    pub fn update_neighbourhood_bests(&mut self) {
        let objective = self.problem.objective();
        update_neighbourhood_bests(self.topology.entities_mut(), self.neighbourhood, objective);
    }

    /// Apply `constraint` to every entity
    pub fn enforce_boundary(&mut self, constraint: BoundaryConstraint) {
        let domain = self.problem.domain();
        for entity in self.topology.entities_mut() {
            constraint.enforce(entity, domain);
        }
    }
}

impl fmt::Debug for IterationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationContext")
            .field("entities", &self.topology.len())
            .field("neighbourhood", &self.neighbourhood)
            .field("progress", &self.progress)
            .field("evaluations", &self.evaluations)
            .finish()
    }
}

/// Advances a population by one generation
pub trait IterationStrategy: fmt::Debug + Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Advance the population in `ctx` by exactly one generation.
    ///
    /// Must not add, remove or reorder entities, and must be deterministic
    /// given the population state (its RNG included) and progress.
    fn perform_iteration(&mut self, ctx: &mut IterationContext<'_>) -> Result<()>;

    fn settings(&self) -> &IterationSettings;

    fn settings_mut(&mut self) -> &mut IterationSettings;

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn IterationStrategy>;

    fn boundary_constraint(&self) -> BoundaryConstraint {
        self.settings().boundary_constraint
    }

    fn set_boundary_constraint(&mut self, constraint: BoundaryConstraint) {
        self.settings_mut().boundary_constraint = constraint;
    }

    fn operator_pipeline(&self) -> &OperatorPipeline {
        &self.settings().operator_pipeline
    }

    fn set_operator_pipeline(&mut self, pipeline: OperatorPipeline) {
        self.settings_mut().operator_pipeline = pipeline;
    }
}

impl Clone for Box<dyn IterationStrategy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn check_dimensions(topology: &Topology, domain: &Domain) -> Result<()> {
    let expected = domain.dimensions();
    match topology.iter().find(|e| e.dimensions() != expected) {
        Some(entity) => Err(Error::DimensionMismatch {
            expected,
            found: entity.dimensions(),
        }),
        None => Ok(()),
    }
}

/// Synchronous particle swarm update.
///
/// Every particle moves using neighbourhood bests from the previous
/// iteration, then the whole swarm is evaluated before neighbourhood bests
/// are recomputed.
#[derive(Debug, Clone, Default)]
pub struct SynchronousIterationStrategy {
    settings: IterationSettings,
}

impl SynchronousIterationStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary_constraint(mut self, constraint: BoundaryConstraint) -> Self {
        self.settings.boundary_constraint = constraint;
        self
    }

    pub fn with_operator_pipeline(mut self, pipeline: OperatorPipeline) -> Self {
        self.settings.operator_pipeline = pipeline;
        self
    }
}

impl IterationStrategy for SynchronousIterationStrategy {
    fn name(&self) -> &'static str {
        "synchronous-pso"
    }

    fn perform_iteration(&mut self, ctx: &mut IterationContext<'_>) -> Result<()> {
        let problem = ctx.problem;
        check_dimensions(ctx.topology, problem.domain())?;

        // Guides are resolved before anyone moves.
        let guides: Vec<Vec<f64>> = ctx
            .topology
            .iter()
            .map(|particle| match ctx.topology.get(particle.neighbourhood_best()) {
                Some(best) => best.best_position().to_vec(),
                None => {
                    trace!(
                        particle = %particle.id(),
                        neighbourhood_best = %particle.neighbourhood_best(),
                        "neighbourhood best not in topology, following personal best"
                    );
                    particle.best_position().to_vec()
                }
            })
            .collect();

        // Leadership as seen by the velocity update, before bests move on.
        let leaders: Vec<bool> = ctx
            .topology
            .iter()
            .map(|particle| particle.is_neighbourhood_best())
            .collect();

        let progress = ctx.progress;
        for (particle, guide) in ctx.topology.entities_mut().iter_mut().zip(&guides) {
            particle.update_velocity(guide, progress, &mut *ctx.rng);
            particle.update_position();
        }

        self.settings
            .operator_pipeline
            .apply(ctx.topology.entities_mut(), problem, &mut *ctx.rng);
        ctx.enforce_boundary(self.settings.boundary_constraint);

        let improved = ctx.evaluate_all();
        ctx.update_neighbourhood_bests();

        let outcomes = leaders.into_iter().zip(improved);
        for (particle, (leader, improved)) in ctx.topology.entities_mut().iter_mut().zip(outcomes) {
            particle.update_control_parameters(leader, improved, progress);
        }
        Ok(())
    }

    fn settings(&self) -> &IterationSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut IterationSettings {
        &mut self.settings
    }

    fn clone_box(&self) -> Box<dyn IterationStrategy> {
        Box::new(self.clone())
    }
}

/// Operator-driven update for populations that do not fly.
///
/// Runs the operator pipeline, enforces the boundary constraint, then
/// evaluates and refreshes personal and neighbourhood bests.
#[derive(Debug, Clone, Default)]
pub struct PipelineIterationStrategy {
    settings: IterationSettings,
}

impl PipelineIterationStrategy {
    pub fn new(pipeline: OperatorPipeline) -> Self {
        Self {
            settings: IterationSettings {
                operator_pipeline: pipeline,
                ..IterationSettings::default()
            },
        }
    }

    pub fn with_boundary_constraint(mut self, constraint: BoundaryConstraint) -> Self {
        self.settings.boundary_constraint = constraint;
        self
    }
}

impl IterationStrategy for PipelineIterationStrategy {
    fn name(&self) -> &'static str {
        "operator-pipeline"
    }

    fn perform_iteration(&mut self, ctx: &mut IterationContext<'_>) -> Result<()> {
        let problem = ctx.problem;
        check_dimensions(ctx.topology, problem.domain())?;

        self.settings
            .operator_pipeline
            .apply(ctx.topology.entities_mut(), problem, &mut *ctx.rng);
        ctx.enforce_boundary(self.settings.boundary_constraint);
        ctx.evaluate_all();
        ctx.update_neighbourhood_bests();
        Ok(())
    }

    fn settings(&self) -> &IterationSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut IterationSettings {
        &mut self.settings
    }

    fn clone_box(&self) -> Box<dyn IterationStrategy> {
        Box::new(self.clone())
    }
}
