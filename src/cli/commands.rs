//! CLI commands and argument parsing

use crate::config::FlattenConfig;
use crate::output::DEFAULT_BATCH_ROWS;
use crate::pipeline::SamplingMode;
use crate::types::{LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Review dataset preparation
#[derive(Parser, Debug)]
#[command(name = "review-prep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level implied by `--verbose`
    pub fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten JSON Lines files into CSV or Parquet
    Flatten {
        /// Input glob patterns (default: data/*.json)
        patterns: Vec<String>,

        /// Write Parquet instead of CSV
        #[arg(long)]
        parquet: bool,

        /// Output file (only with a single input)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Rows buffered per Parquet flush
        #[arg(long, default_value_t = DEFAULT_BATCH_ROWS)]
        batch: usize,

        /// Parse mapping-shaped strings into nested columns
        #[arg(long)]
        expand_dicts: bool,
    },

    /// Draw a balanced review sample
    Sample {
        /// Sampling config file (YAML); built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Balance across the busiest cities as well as star ratings
        #[arg(long)]
        by_city: bool,
    },
}

impl Commands {
    /// Flatten settings, if this is the flatten command
    pub fn flatten_config(&self) -> Option<FlattenConfig> {
        match self {
            Commands::Flatten {
                patterns,
                parquet,
                out,
                batch,
                expand_dicts,
            } => Some(FlattenConfig {
                patterns: patterns.clone(),
                format: if *parquet {
                    OutputFormat::Parquet
                } else {
                    OutputFormat::Csv
                },
                output: out.clone(),
                batch_rows: *batch,
                expand_dicts: *expand_dicts,
            }),
            Commands::Sample { .. } => None,
        }
    }

    /// Sampler selected by the sample command
    pub fn sampling_mode(&self) -> Option<SamplingMode> {
        match self {
            Commands::Sample { by_city: true, .. } => Some(SamplingMode::ByCityAndStar),
            Commands::Sample { by_city: false, .. } => Some(SamplingMode::ByStar),
            Commands::Flatten { .. } => None,
        }
    }
}
