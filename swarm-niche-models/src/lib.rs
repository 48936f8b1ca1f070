//! # SwarmNiche Models
//!
//! Reference objective functions for swarm-niche.
//!
//! This crate provides:
//! - Continuous benchmark functions ([`functions`])
//! - A [`Problem`](swarm_niche_core::problem::Problem) backed by any of them ([`problem`])
//!
//! These are simple reference implementations useful for testing and
//! demonstrations; they are not a standardised benchmark suite.

#![forbid(unsafe_code)]

pub mod functions;
pub mod problem;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::functions::*;
    pub use crate::problem::FunctionProblem;
}
