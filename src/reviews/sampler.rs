//! Quota-based balanced sampling
//!
//! Rows are routed to fixed-capacity buckets keyed by star rating, or by
//! city and star rating. Selection is first-seen-first-taken: each bucket
//! ends up holding a prefix, in arrival order, of the rows that match it.
//! Nothing is randomized.

use super::business::BusinessLookup;
use super::filter::{
    ChunkFilter, ColumnProjection, DateRangeFilter, FilterChain, MinLengthFilter, REVIEW_COLUMNS,
};
use super::table::{ChunkReader, Frame};
use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::types::NullableRow;
use std::collections::HashMap;
use std::hash::Hash;
use std::io::Read;
use tracing::{debug, info, warn};

/// Star ratings a review can carry
pub const STAR_RATINGS: [u8; 5] = [1, 2, 3, 4, 5];

/// Parse a star cell such as `4` or `4.0` into a rating from 1 to 5
pub fn parse_star_rating(value: &str) -> Option<u8> {
    let stars: f64 = value.trim().parse().ok()?;
    if stars.fract() != 0.0 {
        return None;
    }
    STAR_RATINGS.into_iter().find(|&s| f64::from(s) == stars)
}

// ============================================================================
// Bucket
// ============================================================================

/// Upper bound on the rows a bucket reserves up front; it grows past this on demand
const MAX_PREALLOCATED_ROWS: usize = 1024;

/// Fixed-capacity, append-only row buffer
#[derive(Debug, Clone)]
pub struct Bucket {
    capacity: usize,
    rows: Vec<NullableRow>,
}

impl Bucket {
    /// Create a bucket holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rows: Vec::with_capacity(capacity.min(MAX_PREALLOCATED_ROWS)),
        }
    }

    /// Append a row unless the bucket is full; returns whether it was taken
    pub fn offer(&mut self, row: NullableRow) -> bool {
        if self.is_full() {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    /// Rows still needed to reach capacity
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.rows.len())
    }

    pub fn rows(&self) -> &[NullableRow] {
        &self.rows
    }
}

// ============================================================================
// Quota sampler
// ============================================================================

/// A set of equally sized buckets, kept in creation order
#[derive(Debug, Clone)]
pub struct QuotaSampler<K> {
    buckets: Vec<(K, Bucket)>,
    index: HashMap<K, usize>,
    columns: Option<Vec<String>>,
}

impl<K: Eq + Hash + Clone> QuotaSampler<K> {
    /// One bucket of `capacity` rows per key; repeated keys share a bucket
    pub fn new<I>(keys: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut buckets = Vec::new();
        let mut index = HashMap::new();
        for key in keys {
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key.clone(), buckets.len());
            buckets.push((key, Bucket::new(capacity)));
        }
        Self {
            buckets,
            index,
            columns: None,
        }
    }

    /// Fix the output columns up front instead of taking them from the first chunk
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Offer a single row to the bucket of `key`
    pub fn offer(&mut self, key: &K, row: NullableRow) -> bool {
        match self.index.get(key) {
            Some(&i) => self.buckets[i].1.offer(row),
            None => false,
        }
    }

    /// Offer every row of a chunk, in order, to the bucket chosen by `key_of`
    ///
    /// Rows without a key, or whose bucket is unknown or full, are skipped.
    /// Returns the number of rows taken.
    pub fn offer_chunk<F>(&mut self, chunk: &Frame, mut key_of: F) -> Result<usize>
    where
        F: FnMut(&[Option<String>]) -> Option<K>,
    {
        if chunk.is_empty() || self.is_saturated() {
            return Ok(0);
        }

        match &self.columns {
            Some(columns) if columns.as_slice() != chunk.columns() => {
                return Err(Error::Other(format!(
                    "Chunk columns {:?} differ from sampled columns {:?}",
                    chunk.columns(),
                    columns
                )));
            }
            Some(_) => {}
            None => self.columns = Some(chunk.columns().to_vec()),
        }

        let mut taken = 0;
        for row in chunk.rows() {
            if let Some(key) = key_of(row) {
                if self.offer(&key, row.clone()) {
                    taken += 1;
                }
            }
        }
        Ok(taken)
    }

    /// Whether every bucket is full
    pub fn is_saturated(&self) -> bool {
        self.buckets.iter().all(|(_, bucket)| bucket.is_full())
    }

    /// Total rows held
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    pub fn bucket(&self, key: &K) -> Option<&Bucket> {
        self.index.get(key).map(|&i| &self.buckets[i].1)
    }

    /// Row count per bucket, in creation order
    pub fn counts(&self) -> Vec<(K, usize)> {
        self.buckets
            .iter()
            .map(|(key, bucket)| (key.clone(), bucket.len()))
            .collect()
    }

    /// Concatenate all buckets, in creation order, into one frame
    pub fn into_frame(self) -> Result<Frame> {
        let columns = self.columns.unwrap_or_default();
        let rows = self
            .buckets
            .into_iter()
            .flat_map(|(_, bucket)| bucket.rows)
            .collect();
        Frame::from_rows(columns, rows)
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Logs sampling progress each time a multiple of the interval is crossed
#[derive(Debug, Clone)]
struct Progress {
    interval: usize,
    next: usize,
}

impl Progress {
    fn new(interval: usize) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            next: interval,
        }
    }

    fn update(&mut self, total: usize) {
        if total >= self.next {
            info!("Collected {} samples so far...", total);
            self.next = (total / self.interval + 1) * self.interval;
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of a sampling run
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    /// Concatenated bucket contents
    pub frame: Frame,
    /// Final size of each bucket, labelled for display
    pub bucket_counts: Vec<(String, usize)>,
    /// Review rows read from the source
    pub rows_read: usize,
    /// Whether every bucket reached capacity
    pub saturated: bool,
}

impl SampleOutcome {
    fn from_sampler<K, L>(
        sampler: QuotaSampler<K>,
        rows_read: usize,
        label: L,
    ) -> Result<Self>
    where
        K: Eq + Hash + Clone,
        L: Fn(&K) -> String,
    {
        let saturated = sampler.is_saturated();
        let bucket_counts: Vec<(String, usize)> = sampler
            .counts()
            .iter()
            .map(|(key, count)| (label(key), *count))
            .collect();
        for (label, count) in &bucket_counts {
            info!("{}: {}", label, count);
        }

        let frame = sampler.into_frame()?;
        info!("Final sample size: {} reviews", frame.len());
        Ok(Self {
            frame,
            bucket_counts,
            rows_read,
            saturated,
        })
    }
}

fn log_saturation(saturated: bool, what: &str) {
    if saturated {
        info!("Collected enough samples for all {} buckets", what);
    } else {
        warn!("Input exhausted before every {} bucket was full", what);
    }
}

// ============================================================================
// Star sampler
// ============================================================================

/// Samples up to `samples_per_bucket` cleaned reviews per star rating
pub struct StarSampler<'c> {
    config: &'c SamplingConfig,
    chain: FilterChain,
}

impl<'c> StarSampler<'c> {
    pub fn new(config: &'c SamplingConfig) -> Self {
        Self {
            config,
            chain: FilterChain::for_reviews(config),
        }
    }

    /// Replace the cleaning chain
    #[must_use]
    pub fn with_chain(mut self, chain: FilterChain) -> Self {
        self.chain = chain;
        self
    }

    /// Consume review chunks until every star bucket is full or input ends
    pub fn run<R: Read>(&self, mut reader: ChunkReader<R>) -> Result<SampleOutcome> {
        let mut sampler = QuotaSampler::new(STAR_RATINGS, self.config.samples_per_bucket);
        let mut progress = Progress::new(self.config.progress_interval);
        debug!("Review filter chain: {:?}", self.chain.stage_names());

        for chunk in reader.by_ref() {
            let chunk = self.chain.apply(chunk?);
            if let Some(stars_idx) = chunk.column_index("stars") {
                sampler.offer_chunk(&chunk, |row| {
                    row[stars_idx].as_deref().and_then(parse_star_rating)
                })?;
            }

            progress.update(sampler.total());
            if sampler.is_saturated() {
                break;
            }
        }

        log_saturation(sampler.is_saturated(), "star");
        SampleOutcome::from_sampler(sampler, reader.rows_read(), |star| format!("{star} star"))
    }
}

// ============================================================================
// City x star sampler
// ============================================================================

/// Bucket key of the compound sampler
pub type CityStar = (String, u8);

/// Review counts per city, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityCounts {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl CityCounts {
    pub fn add(&mut self, city: &str, n: usize) {
        match self.index.get(city) {
            Some(&i) => self.counts[i].1 += n,
            None => {
                self.index.insert(city.to_string(), self.counts.len());
                self.counts.push((city.to_string(), n));
            }
        }
    }

    pub fn get(&self, city: &str) -> usize {
        self.index.get(city).map_or(0, |&i| self.counts[i].1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` cities with the most reviews; ties keep first-seen order
    pub fn top(&self, n: usize) -> Vec<String> {
        let mut ranked = self.counts.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(n).map(|(city, _)| city).collect()
    }
}

/// Samples up to `samples_per_bucket` reviews per (city, star) among the
/// cities with the most reviews
pub struct CityStarSampler<'c> {
    config: &'c SamplingConfig,
    lookup: &'c BusinessLookup,
}

impl<'c> CityStarSampler<'c> {
    pub fn new(config: &'c SamplingConfig, lookup: &'c BusinessLookup) -> Self {
        Self { config, lookup }
    }

    /// Pre-pass: count reviews per city through the business lookup
    pub fn count_cities<R: Read>(&self, reader: ChunkReader<R>) -> Result<CityCounts> {
        let mut counts = CityCounts::default();
        let Some(id_idx) = reader.columns().iter().position(|c| c == "business_id") else {
            return Err(Error::config("Review table has no 'business_id' column"));
        };

        for chunk in reader {
            for row in chunk?.rows() {
                if let Some(city) = row[id_idx].as_deref().and_then(|id| self.lookup.city_of(id)) {
                    counts.add(city, 1);
                }
            }
        }
        Ok(counts)
    }

    /// Pass 2: fill (city, star) buckets for the given cities
    pub fn sample<R: Read>(
        &self,
        mut reader: ChunkReader<R>,
        cities: &[String],
    ) -> Result<SampleOutcome> {
        let keys = cities
            .iter()
            .flat_map(|city| STAR_RATINGS.map(|star| (city.clone(), star)));
        let mut sampler =
            QuotaSampler::new(keys, self.config.samples_per_bucket).with_columns(REVIEW_COLUMNS);
        let mut progress = Progress::new(self.config.progress_interval);

        let projection = ColumnProjection::default();
        let length = MinLengthFilter::new(self.config.min_review_length);
        let dates = DateRangeFilter::new(self.config.date_range.start, self.config.date_range.end);

        for chunk in reader.by_ref() {
            let chunk = dates.apply(length.apply(projection.apply(chunk?)));
            self.offer_joined(&mut sampler, &chunk);

            progress.update(sampler.total());
            if sampler.is_saturated() {
                break;
            }
        }

        log_saturation(sampler.is_saturated(), "city/star");
        SampleOutcome::from_sampler(sampler, reader.rows_read(), |(city, star)| {
            format!("{city} - {star} star")
        })
    }

    /// Join each review to its business and offer it under (city, star)
    fn offer_joined(&self, sampler: &mut QuotaSampler<CityStar>, chunk: &Frame) {
        let (Some(id_idx), Some(stars_idx)) =
            (chunk.column_index("business_id"), chunk.column_index("stars"))
        else {
            return;
        };
        let cell = |row: &[Option<String>], name: &str| {
            chunk.column_index(name).and_then(|i| row[i].clone())
        };

        for row in chunk.rows() {
            if sampler.is_saturated() {
                return;
            }
            let Some(info) = row[id_idx].as_deref().and_then(|id| self.lookup.get(id)) else {
                continue;
            };
            let Some(star) = row[stars_idx].as_deref().and_then(parse_star_rating) else {
                continue;
            };

            let name = if self.lookup.has_names() {
                info.name.clone()
            } else {
                cell(row, "name")
            };
            let sampled = vec![
                cell(row, "text"),
                row[stars_idx].clone(),
                cell(row, "date"),
                row[id_idx].clone(),
                name,
            ];
            sampler.offer(&(info.city.clone(), star), sampled);
        }
    }

    /// Count cities, pick the top ones, then sample
    ///
    /// `open_reviews` is called once per pass. When no review joins to a
    /// city, an empty sample is returned.
    pub fn run<R, F>(&self, mut open_reviews: F) -> Result<SampleOutcome>
    where
        R: Read,
        F: FnMut() -> Result<ChunkReader<R>>,
    {
        info!("Counting reviews per city...");
        let counts = self.count_cities(open_reviews()?)?;
        let top = counts.top(self.config.top_cities);
        info!("Top {} cities: {:?}", self.config.top_cities, top);

        if top.is_empty() {
            warn!("No cities found after joining reviews to businesses; check business_id values");
            return Ok(SampleOutcome {
                frame: Frame::new(REVIEW_COLUMNS),
                bucket_counts: Vec::new(),
                rows_read: 0,
                saturated: false,
            });
        }

        info!("Sampling reviews for each city and star rating...");
        self.sample(open_reviews()?, &top)
    }
}
