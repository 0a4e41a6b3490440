//! Fitness of a candidate schedule.
//!
//! The fitness of a schedule is the sum of the rating of each program at its
//! own 0-based position. Higher is better.

use crate::{
    ProgramId,
    ratings::{DataError, RatingsTable},
};

/// Sums `ratings[schedule[i]][i]` over every position `i`.
///
/// Fails if a program is unknown to the table or has no rating for its
/// position. The empty schedule scores `0.0`.
///
/// # Example
///
/// ```
/// use tvsched_engine::{RatingsTable, fitness};
///
/// let ratings = RatingsTable::from_csv_str("p,s0,s1\na,1.0,2.0\nb,3.0,4.0\n").unwrap();
/// let a = ratings.id("a").unwrap();
/// let b = ratings.id("b").unwrap();
/// assert_eq!(fitness::evaluate(&[b, a], &ratings).unwrap(), 5.0);
/// ```
pub fn evaluate(schedule: &[ProgramId], ratings: &RatingsTable) -> Result<f64, DataError> {
    schedule
        .iter()
        .enumerate()
        .map(|(slot, &program)| ratings.rating(program, slot))
        .sum()
}
