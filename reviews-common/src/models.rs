//! Row types for every pipeline artifact
//!
//! Each stage appends columns to the previous stage's row and never removes
//! one. The csv crate cannot serialize nested or flattened structs, so every
//! artifact gets its own flat struct with an explicit header list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance tag written by the collector
pub const SOURCE_GOOGLE_PLAY: &str = "google_play";

/// Sentinel written to `date` when the input table has no date column at all
pub const UNKNOWN_DATE: &str = "unknown";

/// Positive/negative label threshold on the compound score
pub const LABEL_THRESHOLD: f64 = 0.05;

/// Row type with a fixed, ordered column contract
pub trait CsvRow {
    /// Column names in file order
    const HEADERS: &'static [&'static str];
}

/// Review as returned by the collector (raw text column is still `review`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub bank: String,
    pub review_id: Option<String>,
    pub review: String,
    pub rating: Option<u8>,
    /// ISO-8601 timestamp of the review
    pub date: Option<String>,
    pub source: String,
}

impl CsvRow for RawReview {
    const HEADERS: &'static [&'static str] =
        &["bank", "review_id", "review", "rating", "date", "source"];
}

/// Canonical review row produced by the normalizer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Review {
    pub review_id: Option<String>,
    pub review_text: String,
    pub rating: Option<u8>,
    /// `YYYY-MM-DD`, the `unknown` sentinel, or empty
    pub date: Option<String>,
    pub bank: String,
    pub source: Option<String>,
}

impl CsvRow for Review {
    const HEADERS: &'static [&'static str] =
        &["review_id", "review_text", "rating", "date", "bank", "source"];
}

/// Discrete sentiment label derived from the compound score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels in chart order
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    /// Label a compound score. Both thresholds are exclusive, so exactly
    /// +/-0.05 is neutral.
    pub fn from_score(score: f64) -> Self {
        if score > LABEL_THRESHOLD {
            SentimentLabel::Positive
        } else if score < -LABEL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical review plus sentiment columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReview {
    pub review_id: Option<String>,
    pub review_text: String,
    pub rating: Option<u8>,
    pub date: Option<String>,
    pub bank: String,
    pub source: Option<String>,
    pub vader_score: f64,
    pub sentiment_label: SentimentLabel,
}

impl CsvRow for ScoredReview {
    const HEADERS: &'static [&'static str] = &[
        "review_id",
        "review_text",
        "rating",
        "date",
        "bank",
        "source",
        "vader_score",
        "sentiment_label",
    ];
}

impl ScoredReview {
    pub fn new(review: Review, vader_score: f64) -> Self {
        Self {
            review_id: review.review_id,
            review_text: review.review_text,
            rating: review.rating,
            date: review.date,
            bank: review.bank,
            source: review.source,
            vader_score,
            sentiment_label: SentimentLabel::from_score(vader_score),
        }
    }
}

/// Scored review plus comma-joined theme names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedReview {
    pub review_id: Option<String>,
    pub review_text: String,
    pub rating: Option<u8>,
    pub date: Option<String>,
    pub bank: String,
    pub source: Option<String>,
    pub vader_score: f64,
    pub sentiment_label: SentimentLabel,
    pub themes: String,
}

impl CsvRow for AnnotatedReview {
    const HEADERS: &'static [&'static str] = &[
        "review_id",
        "review_text",
        "rating",
        "date",
        "bank",
        "source",
        "vader_score",
        "sentiment_label",
        "themes",
    ];
}

impl AnnotatedReview {
    pub fn new(scored: ScoredReview, themes: String) -> Self {
        Self {
            review_id: scored.review_id,
            review_text: scored.review_text,
            rating: scored.rating,
            date: scored.date,
            bank: scored.bank,
            source: scored.source,
            vader_score: scored.vader_score,
            sentiment_label: scored.sentiment_label,
            themes,
        }
    }
}

/// Bank record (persistence side)
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Bank {
    pub bank_id: i64,
    pub bank_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_boundaries_are_exclusive() {
        assert_eq!(SentimentLabel::from_score(0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.0501), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.0501), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(1.0), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_scored_review_carries_label() {
        let review = Review {
            review_id: Some("1".to_string()),
            review_text: "fine".to_string(),
            rating: Some(4),
            date: Some("2025-11-29".to_string()),
            bank: "CBE".to_string(),
            source: Some(SOURCE_GOOGLE_PLAY.to_string()),
        };
        let scored = ScoredReview::new(review, -0.4);
        assert_eq!(scored.sentiment_label, SentimentLabel::Negative);
        assert_eq!(scored.review_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_headers_extend_previous_stage() {
        assert_eq!(&ScoredReview::HEADERS[..6], Review::HEADERS);
        assert_eq!(&AnnotatedReview::HEADERS[..8], ScoredReview::HEADERS);
    }
}
