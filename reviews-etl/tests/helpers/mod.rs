//! Shared fixtures for reviews-etl integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use reviews_etl::collector::{FetchError, ReviewSource, StoreReview};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Write `content` to `dir/name` and return the path
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// File-backed SQLite URL that creates the database on first connect
pub fn sqlite_url(dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", dir.join("reviews.db").display())
}

/// In-memory review feed keyed by app id; unknown ids fail like a dead network
pub struct StubSource {
    pub feeds: HashMap<String, Vec<StoreReview>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }

    pub fn with_feed(mut self, app_id: &str, reviews: Vec<StoreReview>) -> Self {
        self.feeds.insert(app_id.to_string(), reviews);
        self
    }
}

impl ReviewSource for StubSource {
    async fn fetch_reviews(
        &self,
        app_id: &str,
        _lang: &str,
        _country: &str,
        limit: usize,
    ) -> Result<Vec<StoreReview>, FetchError> {
        self.feeds
            .get(app_id)
            .map(|reviews| reviews.iter().take(limit).cloned().collect())
            .ok_or_else(|| FetchError::NetworkError(format!("no feed for {}", app_id)))
    }
}

pub fn store_review(id: &str, content: &str, score: u8) -> StoreReview {
    StoreReview {
        review_id: Some(id.to_string()),
        content: Some(content.to_string()),
        score: Some(score),
        at: NaiveDate::from_ymd_opt(2025, 11, 29).and_then(|d| d.and_hms_opt(9, 15, 0)),
    }
}
