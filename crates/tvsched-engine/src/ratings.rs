//! Program ratings per time slot.
//!
//! A [`RatingsTable`] maps every program to an ordered list of ratings, one per
//! slot index. It is built once (usually from CSV) and only read afterwards.
//!
//! # CSV Format
//!
//! ```text
//! Program,06:00,07:00,08:00
//! News,0.9,0.2,0.1
//! Cartoons,0.3,0.8,0.2
//! ```
//!
//! - The first row is a header and is ignored.
//! - The first column is the program name; the remaining columns are ratings.
//! - Ratings must parse as finite numbers; `NaN` and `inf` are rejected.
//! - Blank lines are skipped. Fields may be wrapped in double quotes, with `""`
//!   as an escaped quote.

use std::{
    collections::HashMap,
    fmt,
    io::{self, BufRead},
    num::ParseFloatError,
};

/// Dense identifier of a program inside one [`RatingsTable`].
///
/// Identifiers are row indices in load order, so they are only meaningful for
/// the table that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramId(usize);

impl ProgramId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ProgramRatings {
    name: String,
    ratings: Vec<f64>,
}

/// Ratings of every program for every slot.
#[derive(Debug, Clone, Default)]
pub struct RatingsTable {
    programs: Vec<ProgramRatings>,
    by_name: HashMap<String, ProgramId>,
}

/// Error raised while building a [`RatingsTable`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadRatingsError {
    #[display("failed to read ratings: {_0}")]
    Io(#[error(source)] io::Error),
    #[display("ratings contain no programs")]
    Empty,
    #[display("line {line}: missing program name")]
    MissingName { line: usize },
    #[display("line {line}: duplicate program '{name}'")]
    DuplicateProgram { line: usize, name: String },
    #[display("line {line}, column {column}: invalid rating '{value}': {source}")]
    InvalidRating {
        line: usize,
        column: usize,
        value: String,
        source: ParseFloatError,
    },
    #[display("line {line}, column {column}: rating '{value}' is not finite")]
    NonFiniteRating {
        line: usize,
        column: usize,
        value: String,
    },
}

/// A schedule refers to data the ratings table cannot provide.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DataError {
    #[display("ratings table has no programs")]
    NoPrograms,
    #[display("program {id} is not in the ratings table")]
    UnknownProgram { id: ProgramId },
    #[display("program '{program}' has {available} ratings, slot {slot} is out of range")]
    SlotOutOfRange {
        program: String,
        slot: usize,
        available: usize,
    },
    #[display("program '{program}' has {available} ratings but {required} slots are scheduled")]
    TooFewRatings {
        program: String,
        available: usize,
        required: usize,
    },
    #[display("program '{program}' has a non-finite rating {value} at slot {slot}")]
    NonFiniteRating {
        program: String,
        slot: usize,
        value: f64,
    },
}

impl RatingsTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a program with its per-slot ratings.
    ///
    /// Returns `None` if a program with the same name already exists.
    pub fn insert<S>(&mut self, name: S, ratings: Vec<f64>) -> Option<ProgramId>
    where
        S: Into<String>,
    {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return None;
        }
        let id = ProgramId(self.programs.len());
        self.by_name.insert(name.clone(), id);
        self.programs.push(ProgramRatings { name, ratings });
        Some(id)
    }

    /// Parses a table from CSV text.
    pub fn from_csv_str(csv: &str) -> Result<Self, LoadRatingsError> {
        Self::from_csv_reader(csv.as_bytes())
    }

    /// Parses a table from a CSV stream.
    pub fn from_csv_reader<R>(reader: R) -> Result<Self, LoadRatingsError>
    where
        R: BufRead,
    {
        let mut table = Self::new();
        // the header names the slots; only the column positions matter
        for (i, line) in reader.lines().enumerate().skip(1) {
            let line_no = i + 1;
            let line = line.map_err(LoadRatingsError::Io)?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = split_record(&line).into_iter();
            let name = fields
                .next()
                .filter(|name| !name.is_empty())
                .ok_or(LoadRatingsError::MissingName { line: line_no })?;
            let ratings = fields
                .enumerate()
                .map(|(j, value)| {
                    let column = j + 2;
                    match value.parse::<f64>() {
                        Ok(rating) if rating.is_finite() => Ok(rating),
                        Ok(_) => Err(LoadRatingsError::NonFiniteRating {
                            line: line_no,
                            column,
                            value,
                        }),
                        Err(source) => Err(LoadRatingsError::InvalidRating {
                            line: line_no,
                            column,
                            value,
                            source,
                        }),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            if table.insert(name.clone(), ratings).is_none() {
                return Err(LoadRatingsError::DuplicateProgram {
                    line: line_no,
                    name,
                });
            }
        }
        if table.is_empty() {
            return Err(LoadRatingsError::Empty);
        }
        Ok(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Returns all program identifiers in load order.
    #[must_use]
    pub fn programs(&self) -> Vec<ProgramId> {
        (0..self.programs.len()).map(ProgramId).collect()
    }

    /// Looks up a program by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<ProgramId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, id: ProgramId) -> Option<&str> {
        self.programs.get(id.0).map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn ratings(&self, id: ProgramId) -> Option<&[f64]> {
        self.programs.get(id.0).map(|p| p.ratings.as_slice())
    }

    /// Returns the rating of `id` at `slot`.
    pub fn rating(&self, id: ProgramId, slot: usize) -> Result<f64, DataError> {
        let program = self
            .programs
            .get(id.0)
            .ok_or(DataError::UnknownProgram { id })?;
        program
            .ratings
            .get(slot)
            .copied()
            .ok_or_else(|| DataError::SlotOutOfRange {
                program: program.name.clone(),
                slot,
                available: program.ratings.len(),
            })
    }

    /// Checks that every program has a finite rating for each of the first
    /// `slot_count` slots.
    pub fn ensure_covers(&self, slot_count: usize) -> Result<(), DataError> {
        for p in &self.programs {
            let Some(ratings) = p.ratings.get(..slot_count) else {
                return Err(DataError::TooFewRatings {
                    program: p.name.clone(),
                    available: p.ratings.len(),
                    required: slot_count,
                });
            };
            if let Some((slot, &value)) =
                ratings.iter().enumerate().find(|(_, r)| !r.is_finite())
            {
                return Err(DataError::NonFiniteRating {
                    program: p.name.clone(),
                    slot,
                    value,
                });
            }
        }
        Ok(())
    }
}

fn split_record(line: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field).trim().to_owned()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_owned());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Type of Program,Hour 6,Hour 7,Hour 8
news,0.1,0.1,0.4
live_soccer,0.0,0.0,0.0
movie_a,0.2,0.3,0.1
";

    #[test]
    fn test_parse_keeps_load_order() {
        let table = RatingsTable::from_csv_str(CSV).unwrap();
        assert_eq!(table.len(), 3);
        let names: Vec<_> = table
            .programs()
            .into_iter()
            .map(|id| table.name(id).unwrap())
            .collect();
        assert_eq!(names, ["news", "live_soccer", "movie_a"]);
        let movie = table.id("movie_a").unwrap();
        assert_eq!(table.ratings(movie).unwrap(), &[0.2, 0.3, 0.1]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_trims() {
        let csv = "h,a,b\n\n  x , 1 , 2 \n\n";
        let table = RatingsTable::from_csv_str(csv).unwrap();
        let x = table.id("x").unwrap();
        assert_eq!(table.ratings(x).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_parse_quoted_names() {
        let csv = "h,a\n\"Talk, Late\",0.5\n\"The \"\"Show\"\"\",0.25\n";
        let table = RatingsTable::from_csv_str(csv).unwrap();
        assert!(table.id("Talk, Late").is_some());
        assert!(table.id("The \"Show\"").is_some());
    }

    #[test]
    fn test_parse_rejects_header_only() {
        let err = RatingsTable::from_csv_str("h,a,b\n").unwrap_err();
        assert!(matches!(err, LoadRatingsError::Empty));
    }

    #[test]
    fn test_parse_rejects_bad_rating() {
        let err = RatingsTable::from_csv_str("h,a,b\nnews,0.1,high\n").unwrap_err();
        match err {
            LoadRatingsError::InvalidRating {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
                assert_eq!(value, "high");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_finite_ratings() {
        for bad in ["NaN", "inf", "-inf"] {
            let csv = format!("h,a,b,c\nnews,0.1,0.2,0.3\nbroken,{bad},0.1,0.1\n");
            match RatingsTable::from_csv_str(&csv).unwrap_err() {
                LoadRatingsError::NonFiniteRating {
                    line,
                    column,
                    value,
                } => {
                    assert_eq!(line, 3);
                    assert_eq!(column, 2);
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_parse_rejects_duplicates_and_missing_names() {
        let err = RatingsTable::from_csv_str("h,a\nnews,1\nnews,2\n").unwrap_err();
        assert!(matches!(
            err,
            LoadRatingsError::DuplicateProgram { line: 3, .. }
        ));

        let err = RatingsTable::from_csv_str("h,a\n,1\n").unwrap_err();
        assert!(matches!(err, LoadRatingsError::MissingName { line: 2 }));
    }

    #[test]
    fn test_rating_lookup_errors() {
        let table = RatingsTable::from_csv_str(CSV).unwrap();
        let news = table.id("news").unwrap();
        assert_eq!(table.rating(news, 2).unwrap(), 0.4);
        assert_eq!(
            table.rating(news, 3).unwrap_err(),
            DataError::SlotOutOfRange {
                program: "news".into(),
                slot: 3,
                available: 3,
            }
        );
        assert!(matches!(
            table.rating(ProgramId(9), 0).unwrap_err(),
            DataError::UnknownProgram { .. }
        ));
    }

    #[test]
    fn test_ensure_covers() {
        let mut table = RatingsTable::new();
        table.insert("a", vec![1.0, 2.0, 3.0]).unwrap();
        table.insert("b", vec![1.0, 2.0]).unwrap();
        assert!(table.insert("a", vec![]).is_none());

        assert!(table.ensure_covers(2).is_ok());
        assert!(table.ensure_covers(0).is_ok());
        assert_eq!(
            table.ensure_covers(3).unwrap_err(),
            DataError::TooFewRatings {
                program: "b".into(),
                available: 2,
                required: 3,
            }
        );
    }

    #[test]
    fn test_ensure_covers_rejects_non_finite_ratings() {
        let mut table = RatingsTable::new();
        table.insert("news", vec![0.1, 0.2, 0.3]).unwrap();
        table.insert("broken", vec![0.4, f64::NAN, 0.5]).unwrap();

        // the NaN lies outside the first slot
        assert!(table.ensure_covers(1).is_ok());
        match table.ensure_covers(3).unwrap_err() {
            DataError::NonFiniteRating { program, slot, value } => {
                assert_eq!(program, "broken");
                assert_eq!(slot, 1);
                assert!(value.is_nan());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
