use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tvsched_engine::{
    RunSeed,
    assembler::{FinalSchedule, SlotEntry, TimeSlots},
    genetic::{GenerationStats, GeneticParams},
};

/// JSON report of one scheduling run.
///
/// Together with the ratings file, `seed`, `params` and `slots` are enough to
/// reproduce the run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleReport {
    pub generated_at: DateTime<Utc>,
    pub ratings_file: String,
    pub seed: RunSeed,
    pub params: GeneticParams,
    pub slots: TimeSlots,
    pub schedule: Vec<SlotEntry>,
    pub total_rating: f64,
    pub best_fitness: f64,
    pub generations: Vec<GenerationStats>,
}

impl ScheduleReport {
    pub fn new(
        ratings_file: String,
        seed: RunSeed,
        params: GeneticParams,
        slots: TimeSlots,
        result: &FinalSchedule,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            ratings_file,
            seed,
            params,
            slots,
            schedule: result.entries.clone(),
            total_rating: result.total_rating,
            best_fitness: result.outcome.best_fitness,
            generations: result.outcome.history.clone(),
        }
    }
}
