//! Imports students into the roster from a CSV file.
//!
//! The file needs a header row with `roll_no`, `name` and `section` columns. Students whose roll
//! number is already on the roster are reported and skipped; everyone else is added.

use anyhow::{Context, Result};
use attendance::models::NewStudent;
use attendance::{Settings, create_manager, logging};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct Args {
    /// The CSV roster to import.
    roster: PathBuf,

    /// Path to the configuration file.
    #[arg(long, default_value = attendance::settings::DEFAULT_CONFIG_FILE)]
    config: String,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    roll_no: String,
    name: String,
    section: String,
}

fn read_roster(path: &Path) -> Result<Vec<RosterRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open roster {}", path.display()))?;

    reader
        .deserialize::<RosterRow>()
        .enumerate()
        .map(|(line, row)| row.with_context(|| format!("bad roster row {}", line + 2)))
        .collect()
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(0);

    let settings = Settings::load_from(&args.config)?;
    let mut manager = create_manager(&settings)?;

    let rows = read_roster(&args.roster)?;
    let new_students = rows
        .iter()
        .map(|row| NewStudent::new(&row.roll_no, &row.name, &row.section))
        .collect::<attendance::Result<Vec<_>>>()?;

    let (added, skipped) = manager.insert_students(&new_students)?;
    println!("Students added: {:#?}", added);
    println!("Roll numbers already on the roster: {:#?}", skipped);

    Ok(())
}
