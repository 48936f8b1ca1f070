//! Niche detection

use core::fmt;
use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::niching::swarms::NichingSwarms;

/// Chooses main-swarm entities that should seed new niches
pub trait NicheDetection: fmt::Debug {
    /// Candidate entities, in main-swarm order.
    ///
    /// Called once per cycle after every population has iterated.
    fn detect(&mut self, swarms: &NichingSwarms) -> Vec<EntityId>;
}

/// Flags a main-swarm particle whose recent fitness has stagnated.
///
/// A particle is a candidate once the standard deviation of its last
/// `window` fitness values falls below `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessDeviationDetection {
    pub threshold: f64,
    pub window: usize,
    #[serde(skip)]
    history: HashMap<EntityId, VecDeque<f64>>,
}

impl Default for FitnessDeviationDetection {
    fn default() -> Self {
        Self::new(1e-4, 3)
    }
}

impl FitnessDeviationDetection {
    pub fn new(threshold: f64, window: usize) -> Self {
        Self {
            threshold,
            window: window.max(2),
            history: HashMap::new(),
        }
    }

    /// Number of particles currently tracked
    pub fn tracked(&self) -> usize {
        self.history.len()
    }
}

fn standard_deviation(values: &VecDeque<f64>) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

impl NicheDetection for FitnessDeviationDetection {
    fn detect(&mut self, swarms: &NichingSwarms) -> Vec<EntityId> {
        let main = swarms.main_swarm().topology();
        self.history.retain(|id, _| main.contains(*id));

        let mut candidates = Vec::new();
        for particle in main {
            if particle.fitness().is_nan() {
                continue;
            }
            let history = self.history.entry(particle.id()).or_default();
            history.push_back(particle.fitness());
            while history.len() > self.window {
                history.pop_front();
            }
            if history.len() == self.window && standard_deviation(history) < self.threshold {
                candidates.push(particle.id());
            }
        }
        candidates
    }
}
