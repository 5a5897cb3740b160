//! CLI module
//!
//! Command-line interface for the review preparation tools.
//!
//! # Commands
//!
//! - `flatten` - Flatten JSON Lines files into CSV or Parquet
//! - `sample` - Draw a balanced, normalized review sample

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
