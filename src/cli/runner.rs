//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{FlattenConfig, SamplingConfig};
use crate::error::Result;
use crate::pipeline::{run_flatten, run_sampling, SamplingMode};
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Flatten { .. } => {
                let config = self.cli.command.flatten_config().unwrap_or_default();
                self.flatten(&config)
            }
            Commands::Sample { config, .. } => {
                let mode = self.cli.command.sampling_mode().unwrap_or_default();
                self.sample(config.as_deref(), mode)
            }
        }
    }

    fn flatten(&self, config: &FlattenConfig) -> Result<()> {
        let report = run_flatten(config)?;
        for file in &report.files {
            println!("{} -> {} ({} rows)", file.input.display(), file.output.display(), file.rows);
        }
        Ok(())
    }

    /// Load the sampling config, falling back to defaults
    fn load_sampling_config(path: Option<&Path>) -> Result<SamplingConfig> {
        match path {
            Some(path) => {
                info!("Loading sampling config from {}", path.display());
                SamplingConfig::from_file(path)
            }
            None => Ok(SamplingConfig::default()),
        }
    }

    fn sample(&self, config_path: Option<&Path>, mode: SamplingMode) -> Result<()> {
        let config = Self::load_sampling_config(config_path)?;
        let report = run_sampling(&config, mode)?;
        println!(
            "Wrote {} sampled reviews to {} in {}ms",
            report.sampled,
            config.output_path.display(),
            report.duration_ms
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_flatten_defaults() {
        let cli = Cli::parse_from(["review-prep", "flatten"]);
        let config = cli.command.flatten_config().unwrap();
        assert!(config.patterns.is_empty());
        assert_eq!(config.format, crate::types::OutputFormat::Csv);
        assert_eq!(config.batch_rows, crate::output::DEFAULT_BATCH_ROWS);
        assert!(!config.expand_dicts);
        assert!(!cli.verbose);
        assert_eq!(cli.log_level(), crate::types::LogLevel::Info);
    }

    #[test]
    fn test_parse_flatten_flags() {
        let cli = Cli::parse_from([
            "review-prep",
            "-v",
            "flatten",
            "in/*.json",
            "more/*.json",
            "--parquet",
            "--batch",
            "500",
            "--expand-dicts",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.log_level(), crate::types::LogLevel::Debug);
        let config = cli.command.flatten_config().unwrap();
        assert_eq!(config.patterns, vec!["in/*.json", "more/*.json"]);
        assert_eq!(config.format, crate::types::OutputFormat::Parquet);
        assert_eq!(config.batch_rows, 500);
        assert!(config.expand_dicts);
        assert!(cli.command.sampling_mode().is_none());
    }

    #[test]
    fn test_parse_sample() {
        let cli = Cli::parse_from(["review-prep", "sample", "--by-city", "--config", "s.yaml"]);
        assert_eq!(cli.command.sampling_mode(), Some(SamplingMode::ByCityAndStar));
        match cli.command {
            Commands::Sample { config, .. } => {
                assert_eq!(config.as_deref(), Some(Path::new("s.yaml")));
            }
            Commands::Flatten { .. } => panic!("expected sample command"),
        }

        let cli = Cli::parse_from(["review-prep", "sample"]);
        assert_eq!(cli.command.sampling_mode(), Some(SamplingMode::ByStar));
    }

    #[test]
    fn test_load_sampling_config_default() {
        let config = Runner::load_sampling_config(None).unwrap();
        assert_eq!(config, SamplingConfig::default());
    }
}
