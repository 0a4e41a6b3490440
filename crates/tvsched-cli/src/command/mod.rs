use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{evaluate::EvaluateArg, schedule::ScheduleArg};

mod evaluate;
mod schedule;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Build a day schedule with the genetic algorithm
    Schedule(#[clap(flatten)] ScheduleArg),
    /// Score a given sequence of programs
    Evaluate(#[clap(flatten)] EvaluateArg),
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Schedule(arg) => schedule::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
    }
    Ok(())
}

/// Logs go to stderr so that stdout only carries results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
