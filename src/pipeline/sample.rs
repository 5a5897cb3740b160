//! Sampling run: review table to a balanced, normalized sample

use crate::config::SamplingConfig;
use crate::error::Result;
use crate::reviews::{
    BusinessLookup, ChunkReader, CityStarSampler, Frame, SampleOutcome, StarSampler,
    TextNormalizer,
};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Which sampler to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplingMode {
    /// One bucket per star rating
    #[default]
    ByStar,
    /// One bucket per (city, star) for the busiest cities
    ByCityAndStar,
}

/// Summary of a sampling run
#[derive(Debug, Clone)]
pub struct SamplingReport {
    pub mode: SamplingMode,
    /// Rows in the written sample
    pub sampled: usize,
    /// Review rows read on the sampling pass
    pub rows_read: usize,
    /// Whether every bucket was filled
    pub saturated: bool,
    /// Sampled rows per star value, as written in the `stars` column
    pub star_distribution: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

/// Sample, normalize and write the review table described by `config`
pub fn run_sampling(config: &SamplingConfig, mode: SamplingMode) -> Result<SamplingReport> {
    let start = Instant::now();
    config.validate()?;
    let outcome = draw_sample(config, mode)?;

    info!("Normalizing {} sampled reviews...", outcome.frame.len());
    let normalizer = TextNormalizer::new(config.positive_threshold, config.neutral_threshold);
    let frame = normalizer.normalize(outcome.frame)?;

    frame.write_csv_file(&config.output_path)?;
    info!("Saved processed data to {}", config.output_path.display());

    let star_distribution = star_distribution(&frame);
    info!("Star distribution:");
    for (stars, count) in &star_distribution {
        info!("  {}: {}", stars, count);
    }

    Ok(SamplingReport {
        mode,
        sampled: frame.len(),
        rows_read: outcome.rows_read,
        saturated: outcome.saturated,
        star_distribution,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Run the selected sampler without normalizing or writing
pub fn draw_sample(config: &SamplingConfig, mode: SamplingMode) -> Result<SampleOutcome> {
    let open_reviews = || {
        info!("Reading reviews from {}", config.reviews_path.display());
        ChunkReader::open(&config.reviews_path, config.chunk_size)
    };

    match mode {
        SamplingMode::ByStar => StarSampler::new(config).run(open_reviews()?),
        SamplingMode::ByCityAndStar => {
            let lookup = BusinessLookup::open(&config.businesses_path)?;
            CityStarSampler::new(config, &lookup).run(open_reviews)
        }
    }
}

/// Count rows per `stars` value; null stars are counted under an empty key
pub fn star_distribution(frame: &Frame) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    if let Some(stars) = frame.column_values("stars") {
        for value in stars {
            *counts.entry(value.unwrap_or_default().to_string()).or_insert(0) += 1;
        }
    }
    counts
}
