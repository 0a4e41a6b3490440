use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use rand::Rng as _;
use tvsched_engine::{
    RunSeed,
    assembler::{FinalSchedule, ScheduleAssembler, TimeSlots},
    genetic::GeneticParams,
};

use crate::{
    model::report::ScheduleReport,
    util::{self, read_params_file, read_ratings_file},
};

const DEFAULT_FIRST_HOUR: u8 = 6;
const DEFAULT_SLOT_COUNT: usize = 18;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GeneticParamsArg {
    /// Number of generations (1 to 1000)
    #[arg(long, default_value_t = 100)]
    generations: usize,
    /// Number of schedules per generation (2 to 500)
    #[arg(long, default_value_t = 50)]
    population_size: usize,
    /// Probability of crossing over a pair of parents
    #[arg(long, default_value_t = 0.8)]
    crossover_rate: f64,
    /// Probability of mutating each child
    #[arg(long, default_value_t = 0.2)]
    mutation_rate: f64,
    /// Number of best schedules carried over unchanged
    #[arg(long, default_value_t = 2)]
    elitism_size: usize,
}

impl From<&GeneticParamsArg> for GeneticParams {
    fn from(arg: &GeneticParamsArg) -> Self {
        Self {
            generations: arg.generations,
            population_size: arg.population_size,
            crossover_rate: arg.crossover_rate,
            mutation_rate: arg.mutation_rate,
            elitism_size: arg.elitism_size,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ScheduleArg {
    /// CSV file with one row of per-slot ratings for each program
    #[arg(long)]
    ratings: PathBuf,
    #[clap(flatten)]
    params: GeneticParamsArg,
    /// JSON file with genetic algorithm parameters; replaces the parameter flags
    #[arg(long)]
    params_file: Option<PathBuf>,
    /// Hour of the first time slot
    #[arg(long, default_value_t = DEFAULT_FIRST_HOUR, value_parser = clap::value_parser!(u8).range(0..24))]
    first_hour: u8,
    /// Number of one-hour time slots
    #[arg(long, default_value_t = DEFAULT_SLOT_COUNT)]
    slots: usize,
    /// Random seed, decimal or 0x-prefixed hex (random if omitted)
    #[arg(long)]
    seed: Option<RunSeed>,
    /// Print the JSON report instead of the schedule table
    #[arg(long)]
    json: bool,
    /// Write the JSON report to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ScheduleArg) -> anyhow::Result<()> {
    let ScheduleArg {
        ratings: ratings_path,
        params,
        params_file,
        first_hour,
        slots,
        seed,
        json,
        output,
    } = arg;

    let ratings = read_ratings_file(ratings_path)?;
    let params = match params_file {
        Some(path) => read_params_file(path)?,
        None => GeneticParams::from(params),
    };
    let slots = TimeSlots::new(*first_hour, *slots);
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(%seed, ?params, "scheduling");

    let assembler =
        ScheduleAssembler::new(&ratings, params, slots).context("Invalid scheduling input")?;
    let result = assembler
        .assemble(&mut seed.rng())
        .context("Failed to assemble schedule")?;

    let report = ScheduleReport::new(
        ratings_path.display().to_string(),
        seed,
        params,
        slots,
        &result,
    );
    if let Some(path) = output {
        util::save_json(&report, path)?;
        tracing::info!(path = %path.display(), "report saved");
    }
    write_stdout(io::stdout().lock(), &result, &report, *json)?;

    Ok(())
}

/// Writes the JSON report when `json` is set, the schedule table otherwise.
fn write_stdout<W>(
    out: W,
    result: &FinalSchedule,
    report: &ScheduleReport,
    json: bool,
) -> anyhow::Result<()>
where
    W: Write,
{
    if json {
        util::write_json(out, report, "stdout")
    } else {
        print_schedule(out, result).context("Failed to write schedule to stdout")
    }
}

fn print_schedule<W>(mut out: W, result: &FinalSchedule) -> io::Result<()>
where
    W: Write,
{
    writeln!(out, "Final Optimal Schedule")?;
    let width = result
        .entries
        .iter()
        .map(|e| e.slot.len())
        .max()
        .unwrap_or_default();
    for entry in &result.entries {
        writeln!(out, "  {:>width$}  {}", entry.slot, entry.program)?;
    }
    writeln!(out, "Total Ratings: {:.3}", result.total_rating)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory as _, Parser as _};

    use super::*;
    use crate::command::{CommandArgs, Mode};

    fn parse(args: &[&str]) -> ScheduleArg {
        let args = CommandArgs::try_parse_from(iter_args(args)).unwrap();
        match args.mode {
            Mode::Schedule(arg) => arg,
            Mode::Evaluate(_) => panic!("expected schedule mode"),
        }
    }

    fn iter_args<'a>(args: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
        ["tvsched", "schedule"].into_iter().chain(args.iter().copied())
    }

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_flag_defaults_match_params_defaults() {
        let arg = parse(&["--ratings", "ratings.csv"]);
        assert_eq!(GeneticParams::from(&arg.params), GeneticParams::default());
        assert_eq!(arg.first_hour, DEFAULT_FIRST_HOUR);
        assert_eq!(arg.slots, DEFAULT_SLOT_COUNT);
        assert!(arg.seed.is_none());
    }

    #[test]
    fn test_parse_seed_and_params() {
        let arg = parse(&[
            "--ratings",
            "ratings.csv",
            "--seed",
            "0x2a",
            "--generations",
            "7",
            "--elitism-size",
            "0",
            "--first-hour",
            "20",
        ]);
        assert_eq!(arg.seed, Some(RunSeed::from(42)));
        assert_eq!(arg.params.generations, 7);
        assert_eq!(arg.params.elitism_size, 0);
        assert_eq!(arg.first_hour, 20);
    }

    fn sample_ratings_path() -> String {
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/program_ratings.csv").to_owned()
    }

    fn small_run() -> (FinalSchedule, ScheduleReport) {
        let ratings = read_ratings_file(sample_ratings_path()).unwrap();
        let params = GeneticParams {
            generations: 2,
            population_size: 4,
            ..GeneticParams::default()
        };
        let slots = TimeSlots::default();
        let seed = RunSeed::from(3);
        let result = ScheduleAssembler::new(&ratings, params, slots)
            .unwrap()
            .assemble(&mut seed.rng())
            .unwrap();
        let report = ScheduleReport::new(sample_ratings_path(), seed, params, slots, &result);
        (result, report)
    }

    #[test]
    fn test_stdout_carries_json_report() {
        let (result, report) = small_run();
        let mut out = vec![];
        write_stdout(&mut out, &result, &report, true).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["seed"], "0x0000000000000003");
        assert_eq!(json["schedule"].as_array().unwrap().len(), 18);
    }

    #[test]
    fn test_stdout_carries_schedule_table() {
        let (result, report) = small_run();
        let mut out = vec![];
        write_stdout(&mut out, &result, &report, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "Final Optimal Schedule");
        assert!(lines[1].starts_with("   6:00  "));
        assert!(lines[19].starts_with("Total Ratings: "));
    }

    #[test]
    fn test_json_and_output_both_written() {
        let path =
            std::env::temp_dir().join(format!("tvsched-report-{}.json", std::process::id()));
        let ratings = sample_ratings_path();
        let arg = parse(&[
            "--ratings",
            ratings.as_str(),
            "--generations",
            "2",
            "--population-size",
            "4",
            "--seed",
            "7",
            "--json",
            "--output",
            path.to_str().unwrap(),
        ]);
        run(&arg).unwrap();

        let report: ScheduleReport = util::read_json_file("report", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(report.seed, RunSeed::from(7));
        assert_eq!(report.params.generations, 2);
        assert_eq!(report.schedule.len(), 18);
    }

    #[test]
    fn test_first_hour_out_of_range() {
        let result = CommandArgs::try_parse_from(iter_args(&[
            "--ratings",
            "ratings.csv",
            "--first-hour",
            "24",
        ]));
        assert!(result.is_err());
    }
}
