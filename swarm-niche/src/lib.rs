//! # SwarmNiche
//!
//! **Niching particle swarm optimisation: one swarm, many optima.**
//!
//! A cognition-only main swarm explores the search space. Particles whose
//! fitness stagnates seed two-particle niches that converge independently
//! with guaranteed-convergence PSO, and niches that reach the same optimum
//! are merged.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use swarm_niche::prelude::*;
//!
//! # fn main() -> swarm_niche::Result<()> {
//! let problem = FunctionProblem::uniform(Himmelblau, 2, -6.0, 6.0)?;
//! let mut algorithm = NichingConfig::builder()
//!     .swarm_size(30)
//!     .max_iterations(100)
//!     .seed(7)
//!     .build()
//!     .build_algorithm(Arc::new(problem))?;
//!
//! algorithm.run()?;
//! for solution in algorithm.best_solutions() {
//!     println!("{:?} -> {}", solution.position, solution.fitness);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`swarm_niche_core`]: Populations, iteration strategies and niching
//! - [`swarm_niche_models`]: Reference objective functions

#![forbid(unsafe_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

// Re-export sub-crates
pub use swarm_niche_core as core;
pub use swarm_niche_models as models;

// Re-export commonly used items at the top level
pub use swarm_niche_core::{
    algorithms::{Neighbourhood, ParticleSwarmConfig},
    boundary::BoundaryConstraint,
    niching::{
        ClosestNeighbourNicheCreation, FitnessDeviationDetection, NichingAlgorithm,
        NichingSwarms, RadiusOverlapMerge,
    },
    population::Population,
    problem::Problem,
    stopping::StoppingCondition,
    Error, Result,
};

/// Prelude module for convenient imports
///
/// ```rust
/// use swarm_niche::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::models::prelude::*;

    pub use crate::{NichingConfig, NichingConfigBuilder};
}

/// Configuration for a NichePSO run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NichingConfig {
    /// Main swarm parameters
    pub main_swarm: ParticleSwarmConfig,
    /// Boundary handling for the main swarm
    pub boundary: BoundaryConstraint,
    /// Number of outer cycles
    pub max_iterations: u32,
    /// Fitness standard deviation below which a particle seeds a niche
    pub detection_threshold: f64,
    /// Number of recent fitness values considered for detection
    pub detection_window: usize,
    /// Distance between niche bests below which niches merge
    pub merge_threshold: f64,
    /// Seed for the main swarm's random stream
    pub seed: u64,
}

impl Default for NichingConfig {
    fn default() -> Self {
        Self {
            main_swarm: ParticleSwarmConfig::cognition_only(),
            boundary: BoundaryConstraint::Clamping,
            max_iterations: 500,
            detection_threshold: 1e-4,
            detection_window: 3,
            merge_threshold: 1e-3,
            seed: 0,
        }
    }
}

impl NichingConfig {
    /// Create a new configuration builder
    pub fn builder() -> NichingConfigBuilder {
        NichingConfigBuilder::new()
    }

    /// Check the configuration for values no run can use
    pub fn validate(&self) -> Result<()> {
        if self.main_swarm.num_particles < 2 {
            return Err(Error::InvalidConfig(format!(
                "main swarm needs at least 2 particles, got {}",
                self.main_swarm.num_particles
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be positive".into()));
        }
        if self.detection_threshold.is_nan() || self.detection_threshold <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "detection_threshold must be positive, got {}",
                self.detection_threshold
            )));
        }
        if self.detection_window < 2 {
            return Err(Error::InvalidConfig(format!(
                "detection_window must be at least 2, got {}",
                self.detection_window
            )));
        }
        if self.merge_threshold.is_nan() || self.merge_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "merge_threshold must not be negative, got {}",
                self.merge_threshold
            )));
        }
        Ok(())
    }

    /// Initialise the main swarm on `problem` and wire the niching loop
    pub fn build_algorithm(&self, problem: Arc<dyn Problem>) -> Result<NichingAlgorithm> {
        self.validate()?;

        let stopping = StoppingCondition::MaximumIterations(self.max_iterations);
        let mut main = Population::pso()
            .with_problem(problem)
            .with_seed(self.seed)
            .with_neighbourhood(self.main_swarm.neighbourhood)
            .with_boundary_constraint(self.boundary)
            .with_stopping_condition(stopping);
        main.initialise(self.main_swarm.num_particles, &self.main_swarm.behavior())?;
        debug!(
            particles = main.topology().len(),
            seed = self.seed,
            "main swarm initialised"
        );

        let swarms = NichingSwarms::of(main, Vec::new())?;
        Ok(NichingAlgorithm::new(
            swarms,
            ClosestNeighbourNicheCreation::default(),
            FitnessDeviationDetection::new(self.detection_threshold, self.detection_window),
            RadiusOverlapMerge::new(self.merge_threshold),
        )
        .with_stopping_condition(stopping))
    }
}

/// Builder for NichingConfig
#[derive(Debug, Default)]
pub struct NichingConfigBuilder {
    config: NichingConfig,
}

impl NichingConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the main swarm parameters
    pub fn main_swarm(mut self, main_swarm: ParticleSwarmConfig) -> Self {
        self.config.main_swarm = main_swarm;
        self
    }

    /// Set the number of particles in the main swarm
    pub fn swarm_size(mut self, size: usize) -> Self {
        self.config.main_swarm.num_particles = size;
        self
    }

    /// Set the main swarm boundary constraint
    pub fn boundary(mut self, boundary: BoundaryConstraint) -> Self {
        self.config.boundary = boundary;
        self
    }

    /// Set the number of outer cycles
    pub fn max_iterations(mut self, iterations: u32) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    /// Set the niche detection threshold
    pub fn detection_threshold(mut self, threshold: f64) -> Self {
        self.config.detection_threshold = threshold;
        self
    }

    /// Set the niche detection window
    pub fn detection_window(mut self, window: usize) -> Self {
        self.config.detection_window = window;
        self
    }

    /// Set the niche merge threshold
    pub fn merge_threshold(mut self, threshold: f64) -> Self {
        self.config.merge_threshold = threshold;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build the configuration
    pub fn build(self) -> NichingConfig {
        self.config
    }
}
