//! Variation operators for schedules.
//!
//! - **Crossover**: [`crossover`] splits two parents at one interior cut point
//!   and swaps their tails.
//! - **Mutation**: [`mutate`] replaces the program at one random position.
//!
//! Neither operator repairs duplicates: a child may contain the same program
//! more than once, and mutation may reintroduce a program already present.

use rand::{Rng, seq::IndexedRandom as _};

use crate::{ProgramId, Schedule};

/// Shortest schedule that has an interior cut point.
pub const MIN_CROSSOVER_LEN: usize = 3;

/// Crossover was asked to cut schedules that have no interior cut point.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DegenerateInputError {
    #[display("cannot cross over schedules of length {len}; at least 3 required")]
    TooShort { len: usize },
    #[display("cannot cross over schedules of different lengths ({left} and {right})")]
    LengthMismatch { left: usize, right: usize },
    #[display("cut point {cut} is not inside a schedule of length {len}")]
    CutOutOfRange { cut: usize, len: usize },
}

/// Returns `true` if schedules of length `len` can be crossed over.
#[must_use]
pub fn can_crossover(len: usize) -> bool {
    len >= MIN_CROSSOVER_LEN
}

/// Single-point crossover with a random interior cut.
///
/// The cut point is drawn uniformly from `1..=len - 2`, so each child takes at
/// least one program from each parent's head and keeps at least two from the
/// other parent's tail.
///
/// # Example
///
/// ```
/// use tvsched_engine::{RatingsTable, RunSeed, operators};
///
/// let mut ratings = RatingsTable::new();
/// let ids: Vec<_> = ["a", "b", "c", "d"]
///     .into_iter()
///     .map(|name| ratings.insert(name, vec![0.0; 4]).unwrap())
///     .collect();
/// let reversed: Vec<_> = ids.iter().rev().copied().collect();
///
/// let mut rng = RunSeed::from(1).rng();
/// let (c1, c2) = operators::crossover(&ids, &reversed, &mut rng).unwrap();
/// assert_eq!(c1.len(), 4);
/// assert_eq!(c1[0], ids[0]);
/// assert_eq!(c2[0], reversed[0]);
/// ```
pub fn crossover<R>(
    a: &[ProgramId],
    b: &[ProgramId],
    rng: &mut R,
) -> Result<(Schedule, Schedule), DegenerateInputError>
where
    R: Rng + ?Sized,
{
    check_pair(a, b)?;
    let cut = rng.random_range(1..=a.len() - 2);
    crossover_at(a, b, cut)
}

/// Single-point crossover at a fixed cut point.
///
/// `child1 = a[..cut] + b[cut..]` and `child2 = b[..cut] + a[cut..]`. Applying
/// it again at the same cut to the children gives back the parents.
pub fn crossover_at(
    a: &[ProgramId],
    b: &[ProgramId],
    cut: usize,
) -> Result<(Schedule, Schedule), DegenerateInputError> {
    check_pair(a, b)?;
    if cut == 0 || cut > a.len() - 2 {
        return Err(DegenerateInputError::CutOutOfRange { cut, len: a.len() });
    }
    let child1 = a[..cut].iter().chain(&b[cut..]).copied().collect();
    let child2 = b[..cut].iter().chain(&a[cut..]).copied().collect();
    Ok((child1, child2))
}

fn check_pair(a: &[ProgramId], b: &[ProgramId]) -> Result<(), DegenerateInputError> {
    if a.len() != b.len() {
        return Err(DegenerateInputError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if !can_crossover(a.len()) {
        return Err(DegenerateInputError::TooShort { len: a.len() });
    }
    Ok(())
}

/// Replaces the program at one uniformly chosen position.
///
/// The replacement is drawn uniformly from `all_programs` and may equal the
/// program it replaces. The schedule is consumed and returned; clone it first
/// to keep the original. Empty schedules and an empty program list leave the
/// schedule unchanged.
#[must_use]
pub fn mutate<R>(mut schedule: Schedule, all_programs: &[ProgramId], rng: &mut R) -> Schedule
where
    R: Rng + ?Sized,
{
    if schedule.is_empty() {
        return schedule;
    }
    let point = rng.random_range(0..schedule.len());
    if let Some(&program) = all_programs.choose(rng) {
        schedule[point] = program;
    }
    schedule
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::RatingsTable;

    fn programs(n: usize) -> Vec<ProgramId> {
        let mut table = RatingsTable::new();
        (0..n)
            .map(|i| table.insert(format!("p{i}"), vec![]).unwrap())
            .collect()
    }

    fn counts(schedules: &[&[ProgramId]]) -> HashMap<ProgramId, usize> {
        let mut counts = HashMap::new();
        for id in schedules.iter().flat_map(|s| s.iter()) {
            *counts.entry(*id).or_default() += 1;
        }
        counts
    }

    #[test]
    fn test_crossover_at_splits_and_swaps_tails() {
        let p = programs(6);
        let a = vec![p[0], p[1], p[2], p[3], p[4]];
        let b = vec![p[5], p[4], p[3], p[2], p[1]];
        let (c1, c2) = crossover_at(&a, &b, 2).unwrap();
        assert_eq!(c1, vec![p[0], p[1], p[3], p[2], p[1]]);
        assert_eq!(c2, vec![p[5], p[4], p[2], p[3], p[4]]);
    }

    #[test]
    fn test_crossover_preserves_multiset_union() {
        let p = programs(5);
        let a = vec![p[0], p[1], p[2], p[3], p[0]];
        let b = vec![p[4], p[4], p[1], p[2], p[3]];
        for cut in 1..=a.len() - 2 {
            let (c1, c2) = crossover_at(&a, &b, cut).unwrap();
            assert_eq!(counts(&[&c1, &c2]), counts(&[&a, &b]), "cut {cut}");
        }
    }

    #[test]
    fn test_crossover_is_self_inverse() {
        let p = programs(4);
        let a = vec![p[0], p[1], p[2], p[3]];
        let b = vec![p[3], p[3], p[1], p[0]];
        for cut in 1..=a.len() - 2 {
            let (c1, c2) = crossover_at(&a, &b, cut).unwrap();
            let (back_a, back_b) = crossover_at(&c1, &c2, cut).unwrap();
            assert_eq!(back_a, a);
            assert_eq!(back_b, b);
        }
    }

    #[test]
    fn test_random_cut_stays_interior() {
        let p = programs(3);
        let a = vec![p[0], p[0], p[0]];
        let b = vec![p[1], p[1], p[1]];
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            // with 3 elements the only interior cut is 1
            let (c1, c2) = crossover(&a, &b, &mut rng).unwrap();
            assert_eq!(c1, vec![p[0], p[1], p[1]]);
            assert_eq!(c2, vec![p[1], p[0], p[0]]);
        }
    }

    #[test]
    fn test_crossover_rejects_degenerate_input() {
        let p = programs(3);
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(
            crossover(&p[..2], &p[1..], &mut rng).unwrap_err(),
            DegenerateInputError::TooShort { len: 2 }
        );
        assert_eq!(
            crossover(&p, &p[..2], &mut rng).unwrap_err(),
            DegenerateInputError::LengthMismatch { left: 3, right: 2 }
        );
        assert_eq!(
            crossover_at(&p, &p, 0).unwrap_err(),
            DegenerateInputError::CutOutOfRange { cut: 0, len: 3 }
        );
        assert_eq!(
            crossover_at(&p, &p, 2).unwrap_err(),
            DegenerateInputError::CutOutOfRange { cut: 2, len: 3 }
        );
    }

    #[test]
    fn test_mutate_changes_at_most_one_position() {
        let p = programs(8);
        let mut rng = Pcg32::seed_from_u64(42);
        let original = p[..5].to_vec();
        let mut changed_any = false;
        for _ in 0..200 {
            let mutated = mutate(original.clone(), &p, &mut rng);
            assert_eq!(mutated.len(), original.len());
            let diff = mutated
                .iter()
                .zip(&original)
                .filter(|(m, o)| m != o)
                .count();
            assert!(diff <= 1);
            changed_any |= diff == 1;
        }
        assert!(changed_any);
    }

    #[test]
    fn test_mutate_single_choice_replaces_in_place() {
        let p = programs(2);
        let mut rng = Pcg32::seed_from_u64(3);
        let mutated = mutate(vec![p[0]; 4], &p[1..], &mut rng);
        assert_eq!(mutated.iter().filter(|&&id| id == p[1]).count(), 1);
    }

    #[test]
    fn test_mutate_noop_cases() {
        let p = programs(2);
        let mut rng = Pcg32::seed_from_u64(3);
        assert!(mutate(vec![], &p, &mut rng).is_empty());
        assert_eq!(mutate(p.clone(), &[], &mut rng), p);
    }
}
