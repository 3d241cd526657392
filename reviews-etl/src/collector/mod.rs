//! Review collection
//!
//! Fetches up to `target_each` reviews per tracked app and writes one raw CSV.
//! A failing app is logged and contributes nothing; the run carries on with
//! the remaining apps. No dedupe or validation happens here.

pub mod play_store;

pub use play_store::PlayStoreClient;

use chrono::NaiveDateTime;
use reviews_common::config::{BankApp, PipelineConfig};
use reviews_common::models::SOURCE_GOOGLE_PLAY;
use reviews_common::{table, RawReview, Result};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

/// Review fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One review as delivered by a store feed
#[derive(Debug, Clone, PartialEq)]
pub struct StoreReview {
    pub review_id: Option<String>,
    pub content: Option<String>,
    pub score: Option<u8>,
    pub at: Option<NaiveDateTime>,
}

/// Anything that can list an app's reviews, newest first
#[allow(async_fn_in_trait)]
pub trait ReviewSource {
    async fn fetch_reviews(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        limit: usize,
    ) -> std::result::Result<Vec<StoreReview>, FetchError>;
}

/// Collector stage
pub struct Collector<S> {
    source: S,
    apps: Vec<BankApp>,
    lang: String,
    country: String,
}

impl<S: ReviewSource> Collector<S> {
    pub fn new(source: S, config: &PipelineConfig) -> Self {
        Self {
            source,
            apps: config.apps.clone(),
            lang: config.lang.clone(),
            country: config.country.clone(),
        }
    }

    /// Fetch and shape reviews for a single app; failures yield an empty list
    pub async fn collect_app(&self, app: &BankApp, target: usize) -> Vec<RawReview> {
        info!("Scraping {} ({}) target={}", app.bank, app.app_id, target);

        let fetched = match self
            .source
            .fetch_reviews(&app.app_id, &self.lang, &self.country, target)
            .await
        {
            Ok(reviews) => reviews,
            Err(e) => {
                error!(bank = %app.bank, app_id = %app.app_id, "Failed to fetch reviews: {}", e);
                Vec::new()
            }
        };

        if fetched.is_empty() {
            warn!("No reviews returned for {}. Returning empty list.", app.bank);
            return Vec::new();
        }

        let rows: Vec<RawReview> = fetched
            .into_iter()
            .take(target)
            .map(|r| to_raw_review(&app.bank, r))
            .collect();

        info!("Collected {} reviews for {}", rows.len(), app.bank);
        rows
    }

    /// Collect every tracked app in table order
    pub async fn collect(&self, target_each: usize) -> Vec<RawReview> {
        let mut rows = Vec::new();
        for app in &self.apps {
            rows.extend(self.collect_app(app, target_each).await);
        }
        rows
    }

    /// Collect and write the raw artifact; returns the row count
    pub async fn collect_to_file(&self, target_each: usize, out_csv: &Path) -> Result<usize> {
        let rows = self.collect(target_each).await;
        table::write_rows(out_csv, &rows)?;
        info!("Saved raw reviews to {} ({} rows)", out_csv.display(), rows.len());
        Ok(rows.len())
    }
}

fn to_raw_review(bank: &str, review: StoreReview) -> RawReview {
    RawReview {
        bank: bank.to_string(),
        review_id: review.review_id,
        review: review.content.unwrap_or_default(),
        rating: review.score,
        date: review.at.map(|at| at.format("%Y-%m-%dT%H:%M:%S").to_string()),
        source: SOURCE_GOOGLE_PLAY.to_string(),
    }
}
