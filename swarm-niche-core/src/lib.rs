//! # SwarmNiche Core
//!
//! Core primitives for niching particle swarm optimisation.
//!
//! This crate provides:
//! - Entities and particles with stable identities ([`entity`])
//! - Control parameters and composable velocity providers ([`control`], [`velocity`])
//! - Boundary constraints and operator pipelines ([`boundary`], [`operators`])
//! - The iteration-strategy abstraction every population advances with ([`iteration`])
//! - Populations and their topologies ([`population`], [`topology`])
//! - Niche creation, detection and merging over immutable snapshots ([`niching`])
//!
//! Every population runs single-threaded; the optimisation problem is the only
//! value shared between populations and it is read-only.

pub mod algorithms;
pub mod boundary;
pub mod control;
pub mod entity;
pub mod iteration;
pub mod niching;
pub mod operators;
pub mod population;
pub mod problem;
pub mod stopping;
pub mod topology;
pub mod velocity;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::*;
    pub use crate::boundary::BoundaryConstraint;
    pub use crate::control::{ControlParameter, Progress};
    pub use crate::entity::{Entity, EntityId, Particle, ParticleBehavior};
    pub use crate::iteration::{
        IterationContext, IterationSettings, IterationStrategy, PipelineIterationStrategy,
        SynchronousIterationStrategy,
    };
    pub use crate::niching::*;
    pub use crate::operators::{Operator, OperatorPipeline};
    pub use crate::population::Population;
    pub use crate::problem::{Bound, Domain, Objective, Problem};
    pub use crate::stopping::{RunStatus, StoppingCondition};
    pub use crate::topology::Topology;
    pub use crate::velocity::VelocityProvider;
    pub use crate::{Error, Result};
}

use entity::EntityId;

/// Result type for SwarmNiche operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for SwarmNiche core operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A population was asked to iterate before a problem was attached
    #[error("no optimisation problem attached to population")]
    ProblemNotSet,
    /// The same entity identity appears twice where identities must be unique
    #[error("duplicate entity identity {0}")]
    DuplicateEntity(EntityId),
    /// A position does not match the dimensionality of the problem domain
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A domain was built without any dimensions
    #[error("domain has no dimensions")]
    EmptyDomain,
    /// A bound is reversed or not finite
    #[error("invalid bound in dimension {dimension}: [{lower}, {upper}]")]
    InvalidBounds {
        dimension: usize,
        lower: f64,
        upper: f64,
    },
    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
