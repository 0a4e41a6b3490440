//! Genetic-algorithm scheduling of TV programs into time slots.
//!
//! The engine takes a [`RatingsTable`] (per-slot audience ratings for each
//! program) and searches for an ordering of programs whose summed ratings are
//! high. The search is a plain generational genetic algorithm with elitism,
//! single-point crossover and single-position mutation.
//!
//! # Architecture
//!
//! ```text
//! CSV ratings
//!     ↓ parsed by
//! RatingsTable (ratings)
//!     ↓ scored by
//! fitness::evaluate
//!     ↓ guides
//! GeneticEngine (genetic) ── uses ── crossover / mutate (operators)
//!     ↓ best candidate
//! ScheduleAssembler (assembler)
//!     ↓ produces
//! FinalSchedule (one program per slot)
//! ```
//!
//! # Randomness
//!
//! Every stochastic operation takes an explicit `&mut R where R: Rng`. Seeding
//! a [`rand_pcg::Pcg32`] from a [`RunSeed`] makes a whole run reproducible.
//!
//! # Example
//!
//! ```
//! use tvsched_engine::{
//!     RatingsTable, RunSeed,
//!     assembler::{ScheduleAssembler, TimeSlots},
//!     genetic::GeneticParams,
//! };
//!
//! let csv = "Program,6:00,7:00,8:00\nNews,0.9,0.2,0.1\nCartoons,0.3,0.8,0.2\nMovie,0.1,0.2,0.7\n";
//! let ratings = RatingsTable::from_csv_str(csv).unwrap();
//!
//! let params = GeneticParams {
//!     generations: 10,
//!     population_size: 8,
//!     ..GeneticParams::default()
//! };
//! let assembler = ScheduleAssembler::new(&ratings, params, TimeSlots::new(6, 3)).unwrap();
//! let mut rng = RunSeed::from(42).rng();
//! let result = assembler.assemble(&mut rng).unwrap();
//! assert_eq!(result.schedule.len(), 3);
//! ```

pub use self::{
    operators::DegenerateInputError,
    ratings::{DataError, LoadRatingsError, ProgramId, RatingsTable},
    seed::RunSeed,
    stats::FitnessStats,
};

pub mod assembler;
pub mod fitness;
pub mod genetic;
pub mod operators;
pub mod ratings;
mod seed;
mod stats;

/// A candidate schedule: one program per position.
///
/// Positions are 0-based and scored against the same index in each program's
/// rating list. Programs may repeat.
pub type Schedule = Vec<ProgramId>;
