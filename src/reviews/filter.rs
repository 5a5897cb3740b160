//! Review filter chain
//!
//! Each stage is a pure `Frame -> Frame` function. A stage whose column is
//! missing from the chunk, or holds only nulls, passes the chunk through.

use super::table::Frame;
use crate::config::SamplingConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::trace;

/// Review columns kept by the projection stage, in output order
pub const REVIEW_COLUMNS: [&str; 5] = ["text", "stars", "date", "business_id", "name"];

/// Columns a review cannot be sampled without
pub const ESSENTIAL_COLUMNS: [&str; 2] = ["text", "stars"];

/// Category keywords that mark a tourism-related business
pub const DEFAULT_CATEGORY_KEYWORDS: [&str; 16] = [
    "restaurants",
    "food",
    "hotels",
    "travel",
    "attractions",
    "tours",
    "museums",
    "parks",
    "entertainment",
    "nightlife",
    "bars",
    "coffee",
    "shopping",
    "arts",
    "beaches",
    "landmarks",
];

/// One stage of the filter chain
pub trait ChunkFilter {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Filter a chunk
    fn apply(&self, chunk: Frame) -> Frame;
}

// ============================================================================
// City
// ============================================================================

/// Keeps reviews located in an allow-listed city
#[derive(Debug, Clone)]
pub struct CityFilter {
    allowed: HashSet<String>,
}

impl CityFilter {
    pub fn new<I, S>(cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: cities.into_iter().map(Into::into).collect(),
        }
    }
}

impl ChunkFilter for CityFilter {
    fn name(&self) -> &'static str {
        "city"
    }

    fn apply(&self, chunk: Frame) -> Frame {
        if !chunk.column_has_values("city") {
            return chunk;
        }
        chunk.filter_column("city", |city| city.is_some_and(|c| self.allowed.contains(c)))
    }
}

// ============================================================================
// Date range
// ============================================================================

/// Parse a review date leniently
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// RFC 3339. Anything else yields `None`, which no date range contains.
pub fn parse_review_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Keeps reviews dated within an inclusive range
///
/// Bounds are compared as timestamps at midnight, so a review written later
/// on the end day falls outside the range.
#[derive(Debug, Clone)]
pub struct DateRangeFilter {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRangeFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(chrono::NaiveTime::MIN),
            end: end.and_time(chrono::NaiveTime::MIN),
        }
    }

    /// Whether a raw date cell falls in the range
    pub fn contains(&self, value: Option<&str>) -> bool {
        value
            .and_then(parse_review_date)
            .is_some_and(|date| date >= self.start && date <= self.end)
    }
}

impl ChunkFilter for DateRangeFilter {
    fn name(&self) -> &'static str {
        "date_range"
    }

    fn apply(&self, chunk: Frame) -> Frame {
        if !chunk.column_has_values("date") {
            return chunk;
        }
        chunk.filter_column("date", |date| self.contains(date))
    }
}

// ============================================================================
// Category
// ============================================================================

/// Keeps reviews whose business categories mention a keyword
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    keywords: Vec<String>,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_KEYWORDS)
    }
}

impl CategoryFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive keyword match; a null category never matches
    pub fn matches(&self, categories: Option<&str>) -> bool {
        let Some(categories) = categories else {
            return false;
        };
        let lower = categories.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl ChunkFilter for CategoryFilter {
    fn name(&self) -> &'static str {
        "category"
    }

    fn apply(&self, chunk: Frame) -> Frame {
        if !chunk.column_has_values("categories") {
            return chunk;
        }
        chunk.filter_column("categories", |c| self.matches(c))
    }
}

// ============================================================================
// Column projection
// ============================================================================

/// Restricts a chunk to the review columns and drops incomplete reviews
#[derive(Debug, Clone)]
pub struct ColumnProjection {
    allowed: Vec<String>,
    essential: Vec<String>,
}

impl Default for ColumnProjection {
    fn default() -> Self {
        Self::new(REVIEW_COLUMNS, ESSENTIAL_COLUMNS)
    }
}

impl ColumnProjection {
    pub fn new<A, E, S, T>(allowed: A, essential: E) -> Self
    where
        A: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            essential: essential.into_iter().map(Into::into).collect(),
        }
    }
}

impl ChunkFilter for ColumnProjection {
    fn name(&self) -> &'static str {
        "columns"
    }

    fn apply(&self, chunk: Frame) -> Frame {
        let allowed: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
        if !allowed.iter().any(|c| chunk.has_column(c)) {
            return chunk;
        }

        let projected = chunk.select(&allowed);
        let essential: Vec<usize> = self
            .essential
            .iter()
            .filter_map(|c| projected.column_index(c))
            .collect();

        projected.retain_rows(|row| essential.iter().all(|&i| row[i].is_some()))
    }
}

// ============================================================================
// Text length
// ============================================================================

/// Keeps reviews whose text has at least `min_chars` characters
#[derive(Debug, Clone, Copy)]
pub struct MinLengthFilter {
    min_chars: usize,
}

impl MinLengthFilter {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl ChunkFilter for MinLengthFilter {
    fn name(&self) -> &'static str {
        "min_length"
    }

    fn apply(&self, chunk: Frame) -> Frame {
        if !chunk.column_has_values("text") {
            return chunk;
        }
        chunk.filter_column("text", |text| {
            text.is_some_and(|t| t.chars().count() >= self.min_chars)
        })
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered sequence of filter stages
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<Box<dyn ChunkFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    #[must_use]
    pub fn with_stage(mut self, stage: impl ChunkFilter + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The review cleaning chain: city, date, category, columns, length
    ///
    /// The city stage is left out when no target city is configured.
    pub fn for_reviews(config: &SamplingConfig) -> Self {
        let mut chain = Self::new();
        if !config.target_cities.is_empty() {
            chain = chain.with_stage(CityFilter::new(config.target_cities.iter().cloned()));
        }
        chain
            .with_stage(DateRangeFilter::new(
                config.date_range.start,
                config.date_range.end,
            ))
            .with_stage(CategoryFilter::new(&config.category_keywords))
            .with_stage(ColumnProjection::default())
            .with_stage(MinLengthFilter::new(config.min_review_length))
    }

    /// Stage names in order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run a chunk through every stage in order
    pub fn apply(&self, chunk: Frame) -> Frame {
        self.stages.iter().fold(chunk, |chunk, stage| {
            let before = chunk.len();
            let chunk = stage.apply(chunk);
            trace!("{} filter kept {}/{} rows", stage.name(), chunk.len(), before);
            chunk
        })
    }
}
