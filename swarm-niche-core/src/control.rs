//! Control parameters
//!
//! Scalar value sources queried every time a velocity is computed. A
//! parameter is either fixed or a deterministic function of run progress.

use serde::{Deserialize, Serialize};

/// How far a population has progressed through its run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    /// Iterations completed so far
    pub iteration: u32,
    /// Fraction of the run completed, in `[0, 1]`
    pub percentage_complete: f64,
}

impl Progress {
    /// Create a progress marker; the fraction is clamped to `[0, 1]`
    pub fn new(iteration: u32, percentage_complete: f64) -> Self {
        Self {
            iteration,
            percentage_complete: percentage_complete.clamp(0.0, 1.0),
        }
    }
}

/// A scalar parameter of a velocity update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlParameter {
    /// Fixed value
    Constant(f64),
    /// Linear interpolation from `start` to `end` over the run
    LinearlyVarying { start: f64, end: f64 },
    /// Caches the wrapped parameter and re-evaluates it only when the
    /// iteration count changes
    UpdateOnIteration {
        parameter: Box<ControlParameter>,
        #[serde(skip)]
        cached: Option<(u32, f64)>,
    },
}

impl Default for ControlParameter {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl ControlParameter {
    /// A fixed value
    pub const fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    /// A value moving linearly from `start` to `end` as the run completes
    pub const fn linearly_varying(start: f64, end: f64) -> Self {
        Self::LinearlyVarying { start, end }
    }

    /// Wrap `parameter` so it is evaluated once per iteration
    pub fn update_on_iteration(parameter: ControlParameter) -> Self {
        Self::UpdateOnIteration {
            parameter: Box::new(parameter),
            cached: None,
        }
    }

    /// Current value of the parameter
    pub fn value(&mut self, progress: Progress) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::LinearlyVarying { start, end } => {
                *start + (*end - *start) * progress.percentage_complete
            }
            Self::UpdateOnIteration { parameter, cached } => match cached {
                Some((iteration, value)) if *iteration == progress.iteration => *value,
                _ => {
                    let value = parameter.value(progress);
                    *cached = Some((progress.iteration, value));
                    value
                }
            },
        }
    }
}

impl From<f64> for ControlParameter {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_progress() {
        let mut p = ControlParameter::constant(1.2);
        assert_eq!(p.value(Progress::new(0, 0.0)), 1.2);
        assert_eq!(p.value(Progress::new(400, 0.8)), 1.2);
    }

    #[test]
    fn linearly_varying_interpolates_between_endpoints() {
        let mut p = ControlParameter::linearly_varying(0.7, 0.2);
        assert!((p.value(Progress::new(0, 0.0)) - 0.7).abs() < 1e-12);
        assert!((p.value(Progress::new(250, 0.5)) - 0.45).abs() < 1e-12);
        assert!((p.value(Progress::new(500, 1.0)) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn progress_fraction_is_clamped() {
        let mut p = ControlParameter::linearly_varying(0.7, 0.2);
        assert!((p.value(Progress::new(900, 1.8)) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn update_on_iteration_caches_within_an_iteration() {
        let mut p = ControlParameter::update_on_iteration(ControlParameter::linearly_varying(
            0.7, 0.2,
        ));
        let first = p.value(Progress::new(3, 0.0));
        // Same iteration, different fraction: the cached value wins.
        let again = p.value(Progress::new(3, 1.0));
        assert_eq!(first, again);

        let next = p.value(Progress::new(4, 1.0));
        assert!((next - 0.2).abs() < 1e-12);
    }
}
