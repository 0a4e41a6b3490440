//! Assembly of a full-day schedule.
//!
//! The assembler draws a random order of all programs, evolves it with the
//! [`GeneticEngine`], and fills the day as follows:
//!
//! ```text
//! slot:      0 1 2 ... n-1 | n ... L-1
//! program:   initial order | best[..L-n]
//! ```
//!
//! where `n` is the number of programs and `L` the number of time slots. If the
//! day has more than `2n` slots, the best candidate is repeated until every
//! slot is filled.
//!
//! The engine scores each candidate by its own 0-based positions, so the
//! programs copied into slots `n..L` were selected for positions `0..L-n`, not
//! for the slots they end up in. The total rating of the assembled day is
//! computed the same way, on the assembled schedule's own positions.
//!
//! When there are at least as many programs as slots, the engine is seeded
//! with the first `L` programs of the initial order and none of its output is
//! needed to fill the day.

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::{
    Schedule, fitness,
    genetic::{ConfigError, EngineError, EvolutionOutcome, GeneticEngine, GeneticParams},
    ratings::{DataError, RatingsTable},
};

/// Layout of the broadcast day: consecutive one-hour slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlots {
    /// Hour of the first slot (0–23)
    pub first_hour: u8,
    /// Number of slots
    pub count: usize,
}

impl Default for TimeSlots {
    /// 6:00 through 23:00.
    fn default() -> Self {
        Self::new(6, 18)
    }
}

impl TimeSlots {
    #[must_use]
    pub fn new(first_hour: u8, count: usize) -> Self {
        Self { first_hour, count }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Display label of a slot, e.g. `"6:00"`. Hours wrap past midnight.
    #[must_use]
    pub fn label(&self, slot: usize) -> String {
        let hour = (usize::from(self.first_hour) + slot) % 24;
        format!("{hour}:00")
    }
}

/// One row of the assembled day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub slot: String,
    pub program: String,
}

/// The assembled day and how it was produced.
#[derive(Debug, Clone)]
pub struct FinalSchedule {
    /// One program per slot; length equals the number of slots
    pub schedule: Schedule,
    /// Slot labels paired with program names, in slot order
    pub entries: Vec<SlotEntry>,
    /// Sum of ratings of `schedule` at its own positions
    pub total_rating: f64,
    /// Random order that seeded the engine and fills the first slots
    pub initial_order: Schedule,
    /// Engine result
    pub outcome: EvolutionOutcome,
}

/// Fills every time slot using a random initial order and the genetic engine.
#[derive(Debug)]
pub struct ScheduleAssembler<'a> {
    ratings: &'a RatingsTable,
    engine: GeneticEngine<'a>,
    slots: TimeSlots,
}

impl<'a> ScheduleAssembler<'a> {
    /// Validates the parameters and the ratings before anything runs.
    ///
    /// Every program must have a rating for every slot.
    pub fn new(
        ratings: &'a RatingsTable,
        params: GeneticParams,
        slots: TimeSlots,
    ) -> Result<Self, EngineError> {
        if slots.is_empty() {
            return Err(ConfigError::NoSlots.into());
        }
        if ratings.is_empty() {
            return Err(DataError::NoPrograms.into());
        }
        let engine = GeneticEngine::new(ratings, params)?;
        ratings.ensure_covers(slots.len())?;
        Ok(Self {
            ratings,
            engine,
            slots,
        })
    }

    #[must_use]
    pub fn slots(&self) -> &TimeSlots {
        &self.slots
    }

    #[must_use]
    pub fn params(&self) -> &GeneticParams {
        self.engine.params()
    }

    /// Runs one full assembly.
    pub fn assemble<R>(&self, rng: &mut R) -> Result<FinalSchedule, EngineError>
    where
        R: Rng + ?Sized,
    {
        let slot_count = self.slots.len();
        let mut initial_order = self.ratings.programs();
        initial_order.shuffle(rng);
        initial_order.truncate(slot_count);
        let remaining_slots = slot_count - initial_order.len();

        let outcome = self.engine.run(initial_order.clone(), rng)?;

        let schedule: Schedule = initial_order
            .iter()
            .chain(outcome.best.iter().cycle().take(remaining_slots))
            .copied()
            .collect();
        let total_rating = fitness::evaluate(&schedule, self.ratings)?;
        let entries = schedule
            .iter()
            .enumerate()
            .map(|(slot, &id)| SlotEntry {
                slot: self.slots.label(slot),
                program: self.ratings.name(id).unwrap_or_default().to_owned(),
            })
            .collect();

        tracing::info!(
            slots = slot_count,
            programs = self.ratings.len(),
            padded = remaining_slots,
            total_rating,
            "schedule assembled"
        );

        Ok(FinalSchedule {
            schedule,
            entries,
            total_rating,
            initial_order,
            outcome,
        })
    }
}
