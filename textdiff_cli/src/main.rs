use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use textdiff_engine::{DiffBackend, DiffOptions, diff_texts};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "text-diff")]
#[command(about = "Compare two text files and print line and character changes as JSON")]
struct Cli {
    file_a: PathBuf,
    file_b: PathBuf,

    /// JSON file with diff options; the flags below override it.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Computation budget in milliseconds, 0 for unbounded.
    #[arg(long)]
    max_time_ms: Option<u64>,

    #[arg(long)]
    ignore_trim_whitespace: Option<bool>,

    #[arg(long)]
    char_changes: Option<bool>,

    #[arg(long, value_enum, default_value_t = CliBackend::LineLevel)]
    backend: CliBackend,

    /// Print summary counters instead of the full result.
    #[arg(long)]
    stats: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBackend {
    Legacy,
    LineLevel,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options in {}: {source}", path.display())]
    Options {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let a_text = read(&cli.file_a)?;
    let b_text = read(&cli.file_b)?;

    let mut options = match &cli.options {
        Some(path) => load_options(path)?,
        None => DiffOptions::default(),
    };
    if let Some(millis) = cli.max_time_ms {
        options.max_computation_time_ms = millis;
    }
    if let Some(ignore) = cli.ignore_trim_whitespace {
        options.ignore_trim_whitespace = ignore;
    }
    if let Some(compute) = cli.char_changes {
        options.compute_char_changes = compute;
    }
    let backend = match cli.backend {
        CliBackend::Legacy => DiffBackend::Legacy,
        CliBackend::LineLevel => DiffBackend::LineLevel,
    };
    debug!(?options, %backend, "resolved options");

    let result = diff_texts(&a_text, &b_text, &options, backend);

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&result.stats())?);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_options(path: &Path) -> Result<DiffOptions, CliError> {
    let raw = read(path)?;
    serde_json::from_str(&raw).map_err(|source| CliError::Options {
        path: path.to_path_buf(),
        source,
    })
}
