//! Sentiment stage: VADER compound score plus discrete label per review
//!
//! Rows are scored independently; the label comes from
//! [`SentimentLabel::from_score`].

use reviews_common::table;
use reviews_common::{Result, Review, ScoredReview};
use std::path::Path;
use tracing::info;

/// Text → compound polarity in [-1, 1]
pub trait PolarityScorer {
    fn compound(&self, text: &str) -> f64;
}

/// Lexicon/rule-based VADER scorer
pub struct VaderScorer {
    analyzer: vader_sentiment::SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: vader_sentiment::SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Sentiment stage
pub struct SentimentScorer<P> {
    scorer: P,
}

impl<P: PolarityScorer> SentimentScorer<P> {
    pub fn new(scorer: P) -> Self {
        Self { scorer }
    }

    pub fn score_review(&self, review: Review) -> ScoredReview {
        let score = self.scorer.compound(&review.review_text).clamp(-1.0, 1.0);
        ScoredReview::new(review, score)
    }

    pub fn score_all(&self, reviews: Vec<Review>) -> Vec<ScoredReview> {
        reviews.into_iter().map(|r| self.score_review(r)).collect()
    }

    /// Read the canonical table, score it, write the sentiment artifact
    pub fn run(&self, in_csv: &Path, out_csv: &Path) -> Result<usize> {
        info!("Loading cleaned reviews: {}", in_csv.display());
        let reviews: Vec<Review> = table::read_rows(in_csv)?;

        info!("Scoring {} reviews", reviews.len());
        let scored = self.score_all(reviews);

        table::write_rows(out_csv, &scored)?;
        info!("Saved sentiment annotated CSV to {}", out_csv.display());
        Ok(scored.len())
    }
}
