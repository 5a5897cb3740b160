// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # review-prep
//!
//! Data preparation for a business review dataset.
//!
//! ## Features
//!
//! - **Flattening**: nested JSON Lines records become flat CSV or Parquet
//!   tables, keeping both parent columns and their dotted children
//! - **Review cleaning**: chunked filtering by city, date, category and text
//!   length over review tables too large for memory
//! - **Balanced sampling**: fixed quotas per star rating, or per city and star
//!   rating for the busiest cities
//! - **Normalization**: cleaned text, length and word counts, sentiment labels
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use review_prep::config::{FlattenConfig, SamplingConfig};
//! use review_prep::pipeline::{run_flatten, run_sampling, SamplingMode};
//!
//! fn main() -> review_prep::Result<()> {
//!     let report = run_flatten(&FlattenConfig::default())?;
//!     println!("{} rows flattened", report.total_rows());
//!
//!     let config = SamplingConfig::from_file("sampling.yaml")?;
//!     run_sampling(&config, SamplingMode::ByStar)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────── flatten ──────────────┐   ┌─────────────── sample ───────────────┐
//! │ JSONL ─▶ SchemaBuilder (pass 1)     │   │ CSV ─▶ ChunkReader ─▶ FilterChain    │
//! │      ─▶ RowMaterializer (pass 2)    │   │     ─▶ QuotaSampler ─▶ TextNormalizer│
//! │      ─▶ RowWriter (CSV | Parquet)   │   │     ─▶ processed CSV                 │
//! └─────────────────────────────────────┘   └──────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// JSON Lines flattening
pub mod flatten;

/// CSV and Parquet row writers
pub mod output;

/// Review filtering, sampling and normalization
pub mod reviews;

/// End-to-end runs
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{FlattenConfig, SamplingConfig};
pub use pipeline::{run_flatten, run_sampling, SamplingMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
