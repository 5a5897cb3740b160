//! Reviews module
//!
//! Cleaning, balanced sampling and normalization of a large review table.
//!
//! # Overview
//!
//! Review CSVs are read in bounded [`Frame`] chunks by a [`ChunkReader`].
//! Each chunk runs through a [`FilterChain`] and its survivors are offered to
//! a [`QuotaSampler`], which stops the read once every bucket is full. The
//! concatenated sample is then enriched by the [`TextNormalizer`].
//!
//! Two samplers are provided:
//! - [`StarSampler`]: one bucket per star rating
//! - [`CityStarSampler`]: one bucket per (city, star) for the busiest cities,
//!   using a [`BusinessLookup`] to locate each review

mod business;
mod filter;
mod sampler;
mod table;
mod text;

pub use business::{BusinessInfo, BusinessLookup};
pub use filter::{
    parse_review_date, CategoryFilter, ChunkFilter, CityFilter, ColumnProjection,
    DateRangeFilter, FilterChain, MinLengthFilter, DEFAULT_CATEGORY_KEYWORDS, ESSENTIAL_COLUMNS,
    REVIEW_COLUMNS,
};
pub use sampler::{
    parse_star_rating, Bucket, CityCounts, CityStar, CityStarSampler, QuotaSampler,
    SampleOutcome, StarSampler, STAR_RATINGS,
};
pub use table::{ChunkReader, Frame, DEFAULT_CHUNK_SIZE};
pub use text::{Sentiment, TextNormalizer};
