//! Function-backed problems

use serde::{Deserialize, Serialize};
use swarm_niche_core::problem::{Domain, Objective, Problem};
use swarm_niche_core::{Error, Result};

use crate::functions::ContinuousFunction;

/// A [`ContinuousFunction`] over a bounded domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionProblem<F> {
    function: F,
    domain: Domain,
    objective: Objective,
}

impl<F: ContinuousFunction> FunctionProblem<F> {
    /// Minimise `function` over `domain`.
    ///
    /// Fails when the domain has fewer dimensions than the function reads.
    pub fn new(function: F, domain: Domain) -> Result<Self> {
        let problem = Self {
            function,
            domain,
            objective: Objective::Minimise,
        };
        let required = problem.function.min_dimensions();
        problem.require_dimensions(required)
    }

    /// Minimise `function` over `[lower, upper]^dimensions`
    pub fn uniform(function: F, dimensions: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::new(function, Domain::uniform(dimensions, lower, upper)?)
    }

    /// Require at least `dimensions` dimensions
    pub fn require_dimensions(self, dimensions: usize) -> Result<Self> {
        if self.domain.dimensions() < dimensions {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                found: self.domain.dimensions(),
            });
        }
        Ok(self)
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn function(&self) -> &F {
        &self.function
    }
}

impl<F: ContinuousFunction> Problem for FunctionProblem<F> {
    fn evaluate(&self, position: &[f64]) -> f64 {
        self.function.evaluate(position)
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn objective(&self) -> Objective {
        self.objective
    }
}
