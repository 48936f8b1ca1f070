//! Optimisation problem boundary
//!
//! A [`Problem`] is shared read-only by every population of a niching run,
//! so implementations must be pure functions of their inputs.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::{Error, Result};

/// Direction of optimisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Objective {
    /// Lower fitness is better
    #[default]
    Minimise,
    /// Higher fitness is better
    Maximise,
}

impl Objective {
    /// Whether `candidate` is strictly better than `incumbent`.
    ///
    /// `NaN` marks an unevaluated fitness: it is never better, and any
    /// evaluated value beats it.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if incumbent.is_nan() {
            return true;
        }
        match self {
            Objective::Minimise => candidate < incumbent,
            Objective::Maximise => candidate > incumbent,
        }
    }
}

/// Closed interval for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Feasible search region: one [`Bound`] per dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    bounds: Vec<Bound>,
}

impl Domain {
    /// Create a domain, rejecting empty, reversed or non-finite bounds
    pub fn new(bounds: Vec<Bound>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(Error::EmptyDomain);
        }
        for (dimension, bound) in bounds.iter().enumerate() {
            if !bound.lower.is_finite() || !bound.upper.is_finite() || bound.lower > bound.upper {
                return Err(Error::InvalidBounds {
                    dimension,
                    lower: bound.lower,
                    upper: bound.upper,
                });
            }
        }
        Ok(Self { bounds })
    }

    /// `dimensions` copies of `[lower, upper]`
    pub fn uniform(dimensions: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::new(vec![Bound::new(lower, upper); dimensions])
    }

    pub fn dimensions(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Whether every coordinate lies inside its bound
    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.bounds.len()
            && self
                .bounds
                .iter()
                .zip(position)
                .all(|(bound, &x)| bound.contains(x))
    }

    /// Uniform random point inside the domain
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.bounds
            .iter()
            .map(|bound| rng.gen_range(bound.lower..=bound.upper))
            .collect()
    }
}

/// Objective/problem evaluator consumed by every population
pub trait Problem: fmt::Debug + Send + Sync {
    /// Fitness of a position
    fn evaluate(&self, position: &[f64]) -> f64;

    /// Feasible region
    fn domain(&self) -> &Domain;

    /// Direction of optimisation
    fn objective(&self) -> Objective {
        Objective::Minimise
    }

    /// Distance between two entities (Euclidean over positions by default)
    fn distance(&self, a: &dyn Entity, b: &dyn Entity) -> f64 {
        euclidean_distance(a.position(), b.position())
    }
}

/// Euclidean distance between two points of equal dimension
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn minimise_prefers_lower_and_any_value_over_nan() {
        let objective = Objective::Minimise;
        assert!(objective.is_better(1.0, 2.0));
        assert!(!objective.is_better(2.0, 1.0));
        assert!(!objective.is_better(1.0, 1.0));
        assert!(objective.is_better(100.0, f64::NAN));
        assert!(!objective.is_better(f64::NAN, 100.0));
    }

    #[test]
    fn maximise_prefers_higher() {
        assert!(Objective::Maximise.is_better(2.0, 1.0));
        assert!(!Objective::Maximise.is_better(1.0, 2.0));
    }

    #[test]
    fn domain_rejects_reversed_bounds() {
        let result = Domain::new(vec![Bound::new(0.0, 1.0), Bound::new(3.0, -3.0)]);
        assert!(matches!(
            result,
            Err(Error::InvalidBounds { dimension: 1, .. })
        ));
    }

    #[test]
    fn domain_rejects_empty() {
        assert!(matches!(Domain::new(Vec::new()), Err(Error::EmptyDomain)));
    }

    #[test]
    fn samples_stay_inside_domain() {
        let domain = Domain::uniform(3, -5.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let point = domain.sample(&mut rng);
            assert!(domain.contains(&point));
        }
    }

    #[test]
    fn euclidean_distance_matches_pythagoras() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }
}
