//! Boundary constraints
//!
//! Applied after a particle moves and before it is evaluated.

use serde::{Deserialize, Serialize};

use crate::entity::Particle;
use crate::problem::Domain;

/// Correction applied when a particle leaves the feasible domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryConstraint {
    /// Never modifies position or velocity
    #[default]
    Unconstrained,
    /// Out-of-range coordinates are set to the violated bound
    Clamping,
    /// Out-of-range coordinates are mirrored back inside the bound and the
    /// matching velocity component is reversed
    Reflecting,
}

impl BoundaryConstraint {
    /// Correct `particle` in place
    pub fn enforce(&self, particle: &mut Particle, domain: &Domain) {
        match self {
            BoundaryConstraint::Unconstrained => {}
            BoundaryConstraint::Clamping => {
                for (x, bound) in particle.position_mut().iter_mut().zip(domain.bounds()) {
                    *x = x.clamp(bound.lower, bound.upper);
                }
            }
            BoundaryConstraint::Reflecting => {
                let (position, velocity) = particle.kinematics_mut();
                for ((x, v), bound) in position.iter_mut().zip(velocity.iter_mut()).zip(domain.bounds()) {
                    if *x < bound.lower {
                        *x = (2.0 * bound.lower - *x).min(bound.upper);
                        *v = -*v;
                    } else if *x > bound.upper {
                        *x = (2.0 * bound.upper - *x).max(bound.lower);
                        *v = -*v;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ParticleBehavior;

    fn particle(position: Vec<f64>, velocity: Vec<f64>) -> Particle {
        Particle::new(position, ParticleBehavior::default()).with_velocity(velocity)
    }

    #[test]
    fn unconstrained_leaves_particle_untouched() {
        let domain = Domain::uniform(2, 0.0, 1.0).unwrap();
        let mut p = particle(vec![-3.0, 7.0], vec![1.0, 1.0]);
        BoundaryConstraint::Unconstrained.enforce(&mut p, &domain);
        assert_eq!(p.position(), &[-3.0, 7.0]);
    }

    #[test]
    fn clamping_moves_coordinates_to_the_edge() {
        let domain = Domain::uniform(3, 0.0, 1.0).unwrap();
        let mut p = particle(vec![-3.0, 0.5, 7.0], vec![1.0, 1.0, 1.0]);
        BoundaryConstraint::Clamping.enforce(&mut p, &domain);
        assert_eq!(p.position(), &[0.0, 0.5, 1.0]);
        assert_eq!(p.velocity(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn reflecting_mirrors_and_reverses_velocity() {
        let domain = Domain::uniform(2, 0.0, 10.0).unwrap();
        let mut p = particle(vec![-2.0, 11.0], vec![-3.0, 4.0]);
        BoundaryConstraint::Reflecting.enforce(&mut p, &domain);
        assert_eq!(p.position(), &[2.0, 9.0]);
        assert_eq!(p.velocity(), &[3.0, -4.0]);
    }

    #[test]
    fn reflecting_never_overshoots_the_opposite_bound() {
        let domain = Domain::uniform(1, 0.0, 1.0).unwrap();
        let mut p = particle(vec![-5.0], vec![-5.0]);
        BoundaryConstraint::Reflecting.enforce(&mut p, &domain);
        assert_eq!(p.position(), &[1.0]);
    }
}
