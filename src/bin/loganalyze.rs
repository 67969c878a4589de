//! Column statistics for dump files
//!
//! Prints `|mean|stddev|max|min|` (or `|label|mean|stddev|max|min|`) for one
//! column of a CSV file, ready to paste into a results table.

use anyhow::{bail, Result};
use clap::Parser;
use serial_logtools::stats;
use std::path::PathBuf;

/// Summarize one numeric column of a CSV file
#[derive(Parser, Debug)]
#[command(name = "loganalyze")]
#[command(version)]
#[command(about = "Print mean, standard deviation, max and min of a CSV column")]
struct Cli {
    /// Input CSV file (e.g., a dump written by logdump)
    input: PathBuf,

    /// Zero-based column index
    #[arg(default_value_t = 0)]
    column: usize,

    /// Label printed as the first field
    label: Option<String>,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if !cli.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got {:?}", cli.delimiter);
    }

    let summary = stats::summarize_file(&cli.input, cli.column, cli.delimiter as u8)?;
    log::info!("{} values from {}", summary.count, cli.input.display());

    println!("{}", summary.report_line(cli.label.as_deref()));
    Ok(())
}
