//! CLI argument parsing for tbm-counter

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the counter report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tbm-counter")]
#[command(version)]
#[command(about = "Aggregate per-job performance counters into a statistical report", long_about = None)]
pub struct Cli {
    /// Job counter files (JSON), one per job, in chronological order
    #[arg(value_name = "JOB", required = true)]
    pub jobs: Vec<PathBuf>,

    /// Report configuration (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
