//! Continuous benchmark functions

use core::f64::consts::PI;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Real-valued function of a real vector
pub trait ContinuousFunction: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Value at `x`
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Fewest coordinates `evaluate` accepts
    fn min_dimensions(&self) -> usize {
        1
    }
}

/// `f(x) = Σ x_i²`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sphere;

impl ContinuousFunction for Sphere {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }
}

/// `f(x) = 10n + Σ (x_i² − 10 cos(2π x_i))`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rastrigin;

impl ContinuousFunction for Rastrigin {
    fn name(&self) -> &'static str {
        "rastrigin"
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        10.0 * x.len() as f64
            + x.iter()
                .map(|v| v * v - 10.0 * (2.0 * PI * v).cos())
                .sum::<f64>()
    }
}

/// `f(x, y) = (x² + y − 11)² + (x + y² − 7)²`
///
/// Four global minima of value zero, which makes it a standard niching
/// check. Only the first two coordinates are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Himmelblau;

impl Himmelblau {
    /// The four global minima
    pub const MINIMA: [[f64; 2]; 4] = [
        [3.0, 2.0],
        [-2.805118, 3.131312],
        [-3.779310, -3.283186],
        [3.584428, -1.848126],
    ];
}

impl ContinuousFunction for Himmelblau {
    fn name(&self) -> &'static str {
        "himmelblau"
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let (a, b) = (x[0], x[1]);
        (a * a + b - 11.0).powi(2) + (a + b * b - 7.0).powi(2)
    }

    fn min_dimensions(&self) -> usize {
        2
    }
}

/// g-function of the HE F9 dynamic multi-objective problem:
///
/// `g(x) = 2 − |x_0|² + (2/k) Σ_{j odd} (x_j − sin(6π|x_0| + jπ/n))²`
///
/// where `k` is the number of odd indices below `n`. With a single
/// coordinate there are no odd indices and the sum term is taken as zero,
/// where the HE F9 definition would divide by zero and yield `NaN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hef9G;

impl ContinuousFunction for Hef9G {
    fn name(&self) -> &'static str {
        "hef9-g"
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let n = x.len() as f64;
        let head = x[0].abs();
        let (sum, count) = x
            .iter()
            .enumerate()
            .skip(1)
            .step_by(2)
            .fold((0.0, 0usize), |(sum, count), (j, &v)| {
                let target = (6.0 * PI * head + j as f64 * PI / n).sin();
                (sum + (v - target).powi(2), count + 1)
            });
        let spread = if count == 0 {
            0.0
        } else {
            sum * 2.0 / count as f64
        };
        2.0 - head * head + spread
    }
}
