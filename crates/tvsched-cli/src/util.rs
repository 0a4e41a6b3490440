use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use tvsched_engine::{RatingsTable, genetic::GeneticParams};

/// Write `value` as pretty JSON to the file at `path`
///
/// # Errors
///
/// Returns error if the file cannot be created or written
pub fn save_json<T>(value: &T, path: &Path) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_json(BufWriter::new(file), value, &path.display().to_string())
}

/// Write `value` as pretty JSON followed by a newline
///
/// `destination` names the writer in error messages.
pub fn write_json<W, T>(mut writer: W, value: &T, destination: &str) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {destination}"))?;
    writeln!(writer).with_context(|| format!("Failed to write JSON to {destination}"))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output to {destination}"))?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read genetic algorithm parameters from a JSON file
///
/// Fields missing from the file keep their default values.
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed
pub fn read_params_file<P>(path: P) -> anyhow::Result<GeneticParams>
where
    P: AsRef<Path>,
{
    read_json_file("parameters", path)
}

/// Read program ratings from a CSV file
///
/// # Errors
///
/// Returns error if file cannot be opened or is not a valid ratings table
pub fn read_ratings_file<P>(path: P) -> anyhow::Result<RatingsTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open ratings file: {}", path.display()))?;
    let ratings = RatingsTable::from_csv_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse ratings file: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        programs = ratings.len(),
        "loaded ratings"
    );
    Ok(ratings)
}
