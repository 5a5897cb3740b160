//! Run configuration
//!
//! [`FlattenConfig`] is assembled from command-line arguments.
//! [`SamplingConfig`] has in-code defaults for the review dataset and can be
//! replaced wholesale by a YAML file. Both are validated once and then passed
//! down by reference.

use crate::error::{Error, Result};
use crate::output::DEFAULT_BATCH_ROWS;
use crate::reviews::{DEFAULT_CATEGORY_KEYWORDS, DEFAULT_CHUNK_SIZE};
use crate::types::OutputFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Glob used when no input pattern is given
pub const DEFAULT_INPUT_PATTERN: &str = "data/*.json";

// ============================================================================
// Flatten Config
// ============================================================================

/// Settings for a flatten run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    /// Input glob patterns
    pub patterns: Vec<String>,

    /// Output format
    pub format: OutputFormat,

    /// Explicit output path, allowed only with a single input
    pub output: Option<PathBuf>,

    /// Parquet rows buffered per flush
    pub batch_rows: usize,

    /// Parse mapping-shaped strings into nested records
    pub expand_dicts: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            format: OutputFormat::Csv,
            output: None,
            batch_rows: DEFAULT_BATCH_ROWS,
            expand_dicts: false,
        }
    }
}

impl FlattenConfig {
    /// Patterns to expand, falling back to [`DEFAULT_INPUT_PATTERN`]
    pub fn effective_patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            vec![DEFAULT_INPUT_PATTERN.to_string()]
        } else {
            self.patterns.clone()
        }
    }

    /// Expand the patterns into input files
    ///
    /// Matches of each pattern come back sorted; a file matched by more than
    /// one pattern is listed once.
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        let patterns = self.effective_patterns();
        let mut inputs: Vec<PathBuf> = Vec::new();

        for pattern in &patterns {
            let mut matched = 0usize;
            for entry in glob::glob(pattern)? {
                let path = entry.map_err(|e| Error::Io(e.into_error()))?;
                if !path.is_file() {
                    continue;
                }
                matched += 1;
                if !inputs.contains(&path) {
                    inputs.push(path);
                }
            }
            debug!("Pattern '{}' matched {} files", pattern, matched);
        }

        if inputs.is_empty() {
            return Err(Error::NoInputFiles {
                patterns: patterns.join(", "),
            });
        }
        Ok(inputs)
    }

    /// Check settings that do not depend on the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.batch_rows == 0 {
            return Err(Error::invalid_value("batch", "must be at least 1"));
        }
        Ok(())
    }

    /// Check that `--out` is only used with a single input
    pub fn validate_inputs(&self, inputs: &[PathBuf]) -> Result<()> {
        if self.output.is_some() && inputs.len() != 1 {
            return Err(Error::config(format!(
                "--out can only be used with a single input file, but {} files matched",
                inputs.len()
            )));
        }
        Ok(())
    }

    /// Where the flattened form of `input` is written
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => input.with_extension(self.format.extension()),
        }
    }
}

// ============================================================================
// Sampling Config
// ============================================================================

/// Inclusive date range, both ends at midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Settings for a sampling run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Review table (CSV)
    pub reviews_path: PathBuf,

    /// Business table (CSV), used by the city sampler
    pub businesses_path: PathBuf,

    /// Processed sample (CSV)
    pub output_path: PathBuf,

    /// Cities kept by the city filter; empty keeps every city
    pub target_cities: Vec<String>,

    /// Capacity of every bucket
    pub samples_per_bucket: usize,

    /// Minimum review length in characters
    pub min_review_length: usize,

    pub date_range: DateRange,

    /// Review rows read per chunk
    pub chunk_size: usize,

    /// Collected samples between progress log lines
    pub progress_interval: usize,

    /// Number of cities sampled by the city sampler
    pub top_cities: usize,

    /// Business category keywords
    pub category_keywords: Vec<String>,

    /// Lowest star rating labelled positive
    pub positive_threshold: u8,

    /// Star rating labelled neutral
    pub neutral_threshold: u8,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            reviews_path: PathBuf::from("data/raw/yelp_academic_dataset_review.csv"),
            businesses_path: PathBuf::from("data/raw/yelp_academic_dataset_business.csv"),
            output_path: PathBuf::from(
                "data/processed/yelp_academic_dataset_processed_reviews.csv",
            ),
            target_cities: [
                "Las Vegas",
                "Phoenix",
                "Charlotte",
                "Scottsdale",
                "Pittsburgh",
                "Montreal",
                "Mesa",
                "Henderson",
                "Tempe",
                "Chandler",
                "Cleveland",
            ]
            .map(String::from)
            .to_vec(),
            samples_per_bucket: 10_000,
            min_review_length: 20,
            date_range: DateRange::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: 10_000,
            top_cities: 10,
            category_keywords: DEFAULT_CATEGORY_KEYWORDS.map(String::from).to_vec(),
            positive_threshold: 4,
            neutral_threshold: 3,
        }
    }
}

impl SamplingConfig {
    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read sampling config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML; omitted keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse sampling config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples_per_bucket == 0 {
            return Err(Error::invalid_value(
                "samples_per_bucket",
                "must be at least 1",
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid_value("chunk_size", "must be at least 1"));
        }
        if self.top_cities == 0 {
            return Err(Error::invalid_value("top_cities", "must be at least 1"));
        }
        if self.date_range.start > self.date_range.end {
            return Err(Error::invalid_value(
                "date_range",
                format!(
                    "start {} is after end {}",
                    self.date_range.start, self.date_range.end
                ),
            ));
        }
        if !(1..=5).contains(&self.positive_threshold) {
            return Err(Error::invalid_value(
                "positive_threshold",
                "must be a star rating from 1 to 5",
            ));
        }
        if !(1..=5).contains(&self.neutral_threshold) {
            return Err(Error::invalid_value(
                "neutral_threshold",
                "must be a star rating from 1 to 5",
            ));
        }
        Ok(())
    }
}
