//! Operator pipelines
//!
//! An [`Operator`] transforms the entities of one population in place. It
//! may change positions and velocities but never membership, so operators
//! receive a slice rather than the topology itself.

use core::fmt;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::Particle;
use crate::problem::Problem;

/// Entity transformation applied during an iteration
pub trait Operator: fmt::Debug + Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Transform `entities` in place
    fn apply(&mut self, entities: &mut [Particle], problem: &dyn Problem, rng: &mut StdRng);

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn Operator>;
}

impl Clone for Box<dyn Operator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Ordered list of operators, run front to back
#[derive(Debug, Clone, Default)]
pub struct OperatorPipeline {
    operators: Vec<Box<dyn Operator>>,
}

impl OperatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator (builder style)
    pub fn with(mut self, operator: impl Operator + 'static) -> Self {
        self.push(operator);
        self
    }

    pub fn push(&mut self, operator: impl Operator + 'static) {
        self.operators.push(Box::new(operator));
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Operator names in pipeline order
    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    /// Run every operator over `entities`
    pub fn apply(&mut self, entities: &mut [Particle], problem: &dyn Problem, rng: &mut StdRng) {
        for operator in self.operators.iter_mut() {
            operator.apply(entities, problem, rng);
        }
    }
}

/// Perturbs each coordinate by `U[-step, step]` with probability `probability`.
///
/// A non-finite `probability` or `step` disables the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformMutation {
    pub probability: f64,
    pub step: f64,
}

impl UniformMutation {
    pub fn new(probability: f64, step: f64) -> Self {
        Self { probability, step }
    }
}

impl Default for UniformMutation {
    fn default() -> Self {
        Self::new(0.1, 0.1)
    }
}

impl Operator for UniformMutation {
    fn name(&self) -> &'static str {
        "uniform-mutation"
    }

    fn apply(&mut self, entities: &mut [Particle], _problem: &dyn Problem, rng: &mut StdRng) {
        if !self.probability.is_finite() || !self.step.is_finite() {
            trace!(
                probability = self.probability,
                step = self.step,
                "non-finite mutation settings, operator skipped"
            );
            return;
        }
        let probability = self.probability.clamp(0.0, 1.0);
        let step = self.step.abs();
        if step == 0.0 {
            return;
        }
        for entity in entities.iter_mut() {
            for x in entity.position_mut() {
                if rng.gen_bool(probability) {
                    *x += rng.gen_range(-step..=step);
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(*self)
    }
}

/// Replaces the worst entity's position with a random convex blend of the
/// personal bests of the two best entities.
///
/// Needs at least three entities; smaller populations are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticRecombination;

impl Operator for ArithmeticRecombination {
    fn name(&self) -> &'static str {
        "arithmetic-recombination"
    }

    fn apply(&mut self, entities: &mut [Particle], problem: &dyn Problem, rng: &mut StdRng) {
        if entities.len() < 3 {
            return;
        }
        let objective = problem.objective();
        let mut order: Vec<usize> = (0..entities.len()).collect();
        // Stable sort keeps topology order among equal fitness values.
        order.sort_by(|&a, &b| {
            let (fa, fb) = (entities[a].best_fitness(), entities[b].best_fitness());
            if objective.is_better(fa, fb) {
                core::cmp::Ordering::Less
            } else if objective.is_better(fb, fa) {
                core::cmp::Ordering::Greater
            } else {
                core::cmp::Ordering::Equal
            }
        });

        let (first, second, worst) = (order[0], order[1], order[order.len() - 1]);
        let alpha = rng.gen::<f64>();
        let child: Vec<f64> = entities[first]
            .best_position()
            .iter()
            .zip(entities[second].best_position())
            .map(|(a, b)| alpha * a + (1.0 - alpha) * b)
            .collect();
        entities[worst].position_mut().copy_from_slice(&child);
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(*self)
    }
}
