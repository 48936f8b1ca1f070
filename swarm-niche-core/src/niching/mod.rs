//! Niching
//!
//! A niching run splits one main swarm into independently evolving
//! sub-swarms. Each outer cycle:
//!
//! 1. advances the main swarm and every sub-swarm by one iteration,
//! 2. asks a [`NicheDetection`] for candidate entities in the main swarm,
//! 3. calls [`NicheCreationStrategy::create`] once per candidate,
//! 4. lets a [`NicheMerging`] fuse overlapping sub-swarms.
//!
//! Creation and merging work on immutable [`NichingSwarms`] snapshots and
//! return a new value.

pub mod algorithm;
pub mod creation;
pub mod detection;
pub mod merging;
pub mod swarms;

pub use algorithm::{CycleReport, NichingAlgorithm, Solution};
pub use creation::{ClosestNeighbourNicheCreation, NicheCreationStrategy};
pub use detection::{FitnessDeviationDetection, NicheDetection};
pub use merging::{NicheMerging, RadiusOverlapMerge};
pub use swarms::NichingSwarms;
