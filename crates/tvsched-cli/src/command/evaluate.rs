use std::{
    io::{self, Write as _},
    iter,
    path::PathBuf,
};

use anyhow::Context as _;
use tvsched_engine::{Schedule, assembler::TimeSlots, fitness};

use crate::util::read_ratings_file;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// CSV file with one row of per-slot ratings for each program
    #[arg(long)]
    ratings: PathBuf,
    /// Hour of the first time slot (labels only)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..24))]
    first_hour: u8,
    /// Program names, one per slot in order
    #[arg(required = true)]
    programs: Vec<String>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        ratings: ratings_path,
        first_hour,
        programs,
    } = arg;

    let ratings = read_ratings_file(ratings_path)?;
    let schedule = programs
        .iter()
        .map(|name| {
            ratings
                .id(name)
                .ok_or_else(|| anyhow::anyhow!("Program '{name}' not found in ratings"))
        })
        .collect::<anyhow::Result<Schedule>>()?;
    let total = fitness::evaluate(&schedule, &ratings).context("Failed to score schedule")?;

    let slots = TimeSlots::new(*first_hour, schedule.len());
    let mut out = io::stdout().lock();
    for (slot, (id, name)) in iter::zip(&schedule, programs).enumerate() {
        let rating = ratings.rating(*id, slot)?;
        writeln!(out, "  {:>5}  {name}  {rating:.3}", slots.label(slot))?;
    }
    writeln!(out, "Total Ratings: {total:.3}")?;
    Ok(())
}
