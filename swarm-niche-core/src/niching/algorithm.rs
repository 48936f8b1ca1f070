//! The niching loop

use tracing::{debug, info};

use crate::entity::EntityId;
use crate::niching::creation::NicheCreationStrategy;
use crate::niching::detection::NicheDetection;
use crate::niching::merging::NicheMerging;
use crate::niching::swarms::NichingSwarms;
use crate::stopping::{RunStatus, StoppingCondition};
use crate::{Error, Result};

/// Summary of one outer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub iteration: u32,
    pub candidates: usize,
    pub created: usize,
    pub merged: usize,
    pub sub_swarms: usize,
    pub evaluations: u64,
}

/// Best personal best of one sub-swarm
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub entity: EntityId,
    pub position: Vec<f64>,
    pub fitness: f64,
}

/// Drives a main swarm and its niches through repeated cycles of
/// iteration, detection, creation and merging
#[derive(Debug)]
pub struct NichingAlgorithm {
    swarms: NichingSwarms,
    creation: Box<dyn NicheCreationStrategy>,
    detection: Box<dyn NicheDetection>,
    merging: Box<dyn NicheMerging>,
    stopping_conditions: Vec<StoppingCondition>,
    iterations: u32,
    evaluations: u64,
}

impl NichingAlgorithm {
    pub fn new(
        swarms: NichingSwarms,
        creation: impl NicheCreationStrategy + 'static,
        detection: impl NicheDetection + 'static,
        merging: impl NicheMerging + 'static,
    ) -> Self {
        let evaluations = swarms.populations().map(|p| p.evaluations()).sum();
        Self {
            swarms,
            creation: Box::new(creation),
            detection: Box::new(detection),
            merging: Box::new(merging),
            stopping_conditions: Vec::new(),
            iterations: 0,
            evaluations,
        }
    }

    pub fn with_stopping_condition(mut self, condition: StoppingCondition) -> Self {
        self.stopping_conditions.push(condition);
        self
    }

    /// Current snapshot
    pub fn swarms(&self) -> &NichingSwarms {
        &self.swarms
    }

    pub fn into_swarms(self) -> NichingSwarms {
        self.swarms
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            iterations: self.iterations,
            evaluations: self.evaluations,
        }
    }

    /// Whether any stopping condition is met (never, without conditions)
    pub fn is_finished(&self) -> bool {
        let status = self.status();
        self.stopping_conditions
            .iter()
            .any(|c| c.is_completed(&status))
    }

    /// Run one outer cycle
    pub fn step(&mut self) -> Result<CycleReport> {
        let evaluations = self.swarms.iterate()?;
        self.iterations += 1;
        self.evaluations += evaluations;

        let candidates = self.detection.detect(&self.swarms);
        let before = self.swarms.sub_swarms().len();
        for candidate in &candidates {
            self.swarms = self.creation.create(&self.swarms, *candidate);
        }
        let created = self.swarms.sub_swarms().len() - before;

        let before = self.swarms.sub_swarms().len();
        self.swarms = self.merging.merge(&self.swarms);
        let merged = before - self.swarms.sub_swarms().len();

        let report = CycleReport {
            iteration: self.iterations,
            candidates: candidates.len(),
            created,
            merged,
            sub_swarms: self.swarms.sub_swarms().len(),
            evaluations,
        };
        debug!(?report, "niching cycle complete");
        Ok(report)
    }

    /// Cycle until a stopping condition is met
    pub fn run(&mut self) -> Result<RunStatus> {
        if self.stopping_conditions.is_empty() {
            return Err(Error::InvalidConfig(
                "niching algorithm has no stopping condition".into(),
            ));
        }
        info!(
            main_swarm = self.swarms.main_swarm().topology().len(),
            sub_swarms = self.swarms.sub_swarms().len(),
            "niching run started"
        );
        while !self.is_finished() {
            self.step()?;
        }
        info!(
            iterations = self.iterations,
            evaluations = self.evaluations,
            main_swarm = self.swarms.main_swarm().topology().len(),
            sub_swarms = self.swarms.sub_swarms().len(),
            "niching run finished"
        );
        Ok(self.status())
    }

    /// Best solution found by each sub-swarm, in sub-swarm order
    pub fn best_solutions(&self) -> Vec<Solution> {
        self.swarms
            .sub_swarms()
            .iter()
            .filter_map(|swarm| swarm.best())
            .map(|best| Solution {
                entity: best.id(),
                position: best.best_position().to_vec(),
                fitness: best.best_fitness(),
            })
            .collect()
    }
}
