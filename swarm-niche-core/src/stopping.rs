//! Stopping conditions
//!
//! Consulted between iterations, never during one. Each condition also
//! reports how far the run has progressed, which drives iteration-varying
//! control parameters.

use serde::{Deserialize, Serialize};

/// Counters a stopping condition is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStatus {
    pub iterations: u32,
    pub evaluations: u64,
}

/// Condition that ends a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoppingCondition {
    /// Stop after this many iterations
    MaximumIterations(u32),
    /// Stop after this many fitness evaluations
    MaximumEvaluations(u64),
}

impl StoppingCondition {
    pub fn is_completed(&self, status: &RunStatus) -> bool {
        match *self {
            StoppingCondition::MaximumIterations(max) => status.iterations >= max,
            StoppingCondition::MaximumEvaluations(max) => status.evaluations >= max,
        }
    }

    /// Fraction of the condition satisfied, in `[0, 1]`
    pub fn percentage_complete(&self, status: &RunStatus) -> f64 {
        let (done, target) = match *self {
            StoppingCondition::MaximumIterations(max) => (status.iterations as f64, max as f64),
            StoppingCondition::MaximumEvaluations(max) => (status.evaluations as f64, max as f64),
        };
        if target <= 0.0 {
            return 1.0;
        }
        (done / target).clamp(0.0, 1.0)
    }
}
