//! End-to-end runs
//!
//! - [`run_flatten`]: discover a schema across JSON Lines inputs and write
//!   one CSV or Parquet file per input
//! - [`run_sampling`]: filter, sample and normalize a review table into a
//!   processed CSV

mod flatten;
mod sample;

pub use flatten::{flatten_file, run_flatten, FileReport, FlattenReport};
pub use sample::{draw_sample, run_sampling, star_distribution, SamplingMode, SamplingReport};

#[cfg(test)]
mod tests;
