//! Swarm optimisation algorithm configuration
//!
//! This module provides configuration for particle swarms and their
//! neighbourhood structure.

use serde::{Deserialize, Serialize};

use crate::control::ControlParameter;
use crate::entity::ParticleBehavior;
use crate::velocity::{ClampingVelocity, StandardVelocity, VelocityProvider};

/// Particle Swarm Optimization (PSO) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSwarmConfig {
    /// Number of particles in the swarm
    pub num_particles: usize,
    /// Inertia weight (momentum)
    pub inertia: ControlParameter,
    /// Cognitive coefficient (attraction to personal best)
    pub cognitive: f64,
    /// Social coefficient (attraction to neighbourhood best)
    pub social: f64,
    /// Maximum velocity per dimension, unbounded when `None`
    pub max_velocity: Option<f64>,
    /// Neighbourhood structure
    pub neighbourhood: Neighbourhood,
}

impl Default for ParticleSwarmConfig {
    fn default() -> Self {
        Self {
            num_particles: 20,
            inertia: ControlParameter::constant(0.729844),
            cognitive: 1.496180,
            social: 1.496180,
            max_velocity: None,
            neighbourhood: Neighbourhood::Global,
        }
    }
}

impl ParticleSwarmConfig {
    /// Cognition-only swarm used as the NichePSO main swarm.
    ///
    /// Particles ignore each other (`social = 0`) so that each one settles on
    /// its own region of the landscape, where it can be detected as a niche.
    pub fn cognition_only() -> Self {
        Self {
            num_particles: 20,
            inertia: ControlParameter::update_on_iteration(ControlParameter::linearly_varying(
                0.7, 0.2,
            )),
            cognitive: 1.2,
            social: 0.0,
            max_velocity: Some(1.0),
            neighbourhood: Neighbourhood::Global,
        }
    }

    /// Behavior to attach to every particle of the swarm
    pub fn behavior(&self) -> ParticleBehavior {
        let standard = VelocityProvider::Standard(StandardVelocity::new(
            self.inertia.clone(),
            ControlParameter::constant(self.social),
            ControlParameter::constant(self.cognitive),
        ));
        let provider = match self.max_velocity {
            Some(maximum) => VelocityProvider::Clamping(ClampingVelocity::new(
                ControlParameter::constant(maximum),
                standard,
            )),
            None => standard,
        };
        ParticleBehavior::new(provider)
    }
}

/// Neighbourhood structure of a swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Neighbourhood {
    /// Every particle sees every other (gbest)
    #[default]
    Global,
    /// Each particle sees `size` consecutive particles centred on itself (lbest)
    Ring { size: usize },
}

impl Neighbourhood {
    /// Create a ring neighbourhood with the given size
    pub fn ring(size: usize) -> Self {
        Self::Ring { size }
    }

    /// Indices in the neighbourhood of `index` within a topology of `len`
    pub fn members(&self, index: usize, len: usize) -> Vec<usize> {
        match *self {
            Neighbourhood::Ring { size } if size > 0 && size < len => {
                let half = size / 2;
                (0..size).map(|k| (index + len - half + k) % len).collect()
            }
            _ => (0..len).collect(),
        }
    }
}
