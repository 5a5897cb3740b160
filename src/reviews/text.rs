//! Text normalization and sentiment labels

use super::sampler::parse_star_rating;
use super::table::Frame;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("url regex is valid"));
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w+").expect("mention regex is valid"));

/// Three-way sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives cleaned text and label columns from sampled reviews
#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer {
    positive_threshold: u8,
    neutral_threshold: u8,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self {
            positive_threshold: 4,
            neutral_threshold: 3,
        }
    }
}

impl TextNormalizer {
    pub fn new(positive_threshold: u8, neutral_threshold: u8) -> Self {
        Self {
            positive_threshold,
            neutral_threshold,
        }
    }

    /// Lowercase, collapse whitespace, strip URLs and @mentions, trim
    pub fn clean_text(text: &str) -> String {
        let lower = text.to_lowercase();
        let collapsed = WHITESPACE.replace_all(&lower, " ");
        let no_urls = URL.replace_all(&collapsed, "");
        let no_mentions = MENTION.replace_all(&no_urls, "");
        no_mentions.trim().to_string()
    }

    /// 1 for positive reviews, 0 otherwise
    pub fn sentiment_binary(&self, stars: u8) -> u8 {
        u8::from(stars >= self.positive_threshold)
    }

    pub fn sentiment_multiclass(&self, stars: u8) -> Sentiment {
        if stars <= 2 {
            Sentiment::Negative
        } else if stars == self.neutral_threshold {
            Sentiment::Neutral
        } else {
            Sentiment::Positive
        }
    }

    /// Add `text_clean`, `text_length`, `word_count` and, when stars are
    /// present, `sentiment_binary` and `sentiment_multiclass`
    ///
    /// Rows are never dropped. A frame without a `text` column is returned
    /// unchanged. Null text cleans to an empty string and has null length and
    /// word count; stars that are null or not a rating yield null labels.
    pub fn normalize(&self, mut frame: Frame) -> Result<Frame> {
        let Some(texts) = frame.column_values("text") else {
            return Ok(frame);
        };

        let mut clean = Vec::with_capacity(texts.len());
        let mut length = Vec::with_capacity(texts.len());
        let mut words = Vec::with_capacity(texts.len());
        for text in texts {
            clean.push(Some(text.map(Self::clean_text).unwrap_or_default()));
            length.push(text.map(|t| t.chars().count().to_string()));
            words.push(text.map(|t| t.split_whitespace().count().to_string()));
        }

        let labels = frame.column_values("stars").map(|stars| {
            stars
                .into_iter()
                .map(|s| s.and_then(parse_star_rating))
                .map(|s| {
                    (
                        s.map(|s| self.sentiment_binary(s).to_string()),
                        s.map(|s| self.sentiment_multiclass(s).to_string()),
                    )
                })
                .unzip::<_, _, Vec<_>, Vec<_>>()
        });

        frame.set_column("text_clean", clean)?;
        frame.set_column("text_length", length)?;
        frame.set_column("word_count", words)?;
        if let Some((binary, multiclass)) = labels {
            frame.set_column("sentiment_binary", binary)?;
            frame.set_column("sentiment_multiclass", multiclass)?;
        }
        Ok(frame)
    }
}
