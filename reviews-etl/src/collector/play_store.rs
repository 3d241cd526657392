//! Google Play review feed client
//!
//! Talks to the store's `batchexecute` RPC (`UsvDTd`) the same way the web
//! client does, newest reviews first, following the continuation token until
//! the requested count is reached or the feed runs out.

use super::{FetchError, ReviewSource, StoreReview};
use chrono::DateTime;
use serde_json::{json, Value};
use std::time::Duration;

const PLAY_STORE_BATCH_URL: &str = "https://play.google.com/_/PlayStoreUi/data/batchexecute";
const USER_AGENT: &str = "reviews-etl/0.1.0";
const REVIEWS_RPC_ID: &str = "UsvDTd";
const SORT_NEWEST: u8 = 2;
/// Largest page the feed serves
const PAGE_SIZE: usize = 200;
const RESPONSE_PREFIX: &str = ")]}'";

/// Google Play review client
pub struct PlayStoreClient {
    http_client: reqwest::Client,
    page_pause: Duration,
}

impl PlayStoreClient {
    pub fn new() -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            page_pause: Duration::from_secs(1),
        })
    }

    /// Pause between consecutive pages (one second by default)
    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    async fn fetch_page(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<(Vec<StoreReview>, Option<String>), FetchError> {
        let payload = build_request_payload(app_id, count, token);

        tracing::debug!(app_id = %app_id, count, has_token = token.is_some(), "Requesting review page");

        let response = self
            .http_client
            .post(PLAY_STORE_BATCH_URL)
            .query(&[("hl", lang), ("gl", country)])
            .form(&[("f.req", payload)])
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        parse_review_page(&body)
    }
}

impl ReviewSource for PlayStoreClient {
    async fn fetch_reviews(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        limit: usize,
    ) -> Result<Vec<StoreReview>, FetchError> {
        let mut reviews = Vec::new();
        let mut token: Option<String> = None;

        while reviews.len() < limit {
            if !reviews.is_empty() {
                tokio::time::sleep(self.page_pause).await;
            }

            let count = PAGE_SIZE.min(limit - reviews.len());
            let (page, next_token) = self
                .fetch_page(app_id, lang, country, count, token.as_deref())
                .await?;

            let page_len = page.len();
            reviews.extend(page);

            match next_token {
                Some(next) if page_len > 0 => token = Some(next),
                _ => break,
            }
        }

        reviews.truncate(limit);
        Ok(reviews)
    }
}

/// Encode the `f.req` form field for one page request
fn build_request_payload(app_id: &str, count: usize, token: Option<&str>) -> String {
    let inner = json!([
        null,
        null,
        [2, SORT_NEWEST, [count, null, token], null, []],
        [app_id, 7]
    ]);
    json!([[[REVIEWS_RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
}

/// Decode one `batchexecute` response into reviews and the next-page token
fn parse_review_page(body: &str) -> Result<(Vec<StoreReview>, Option<String>), FetchError> {
    let json_text = body
        .trim_start()
        .strip_prefix(RESPONSE_PREFIX)
        .unwrap_or(body)
        .trim();

    let envelope: Value =
        serde_json::from_str(json_text).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let inner_text = envelope
        .get(0)
        .and_then(|frame| frame.get(2))
        .and_then(Value::as_str);

    // No payload string means the app has no (more) reviews
    let Some(inner_text) = inner_text else {
        return Ok((Vec::new(), None));
    };

    let data: Value =
        serde_json::from_str(inner_text).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let reviews = data
        .get(0)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_review).collect())
        .unwrap_or_default();

    let token = data
        .as_array()
        .and_then(|items| items.len().checked_sub(2).and_then(|i| items.get(i)))
        .and_then(Value::as_array)
        .and_then(|meta| meta.last())
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok((reviews, token))
}

fn parse_review(item: &Value) -> Option<StoreReview> {
    let review_id = item.get(0).and_then(Value::as_str).map(str::to_string);
    let content = item.get(4).and_then(Value::as_str).map(str::to_string);
    let score = item
        .get(2)
        .and_then(Value::as_u64)
        .and_then(|s| u8::try_from(s).ok());
    let at = item
        .get(5)
        .and_then(|ts| ts.get(0))
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc());

    if review_id.is_none() && content.is_none() {
        return None;
    }

    Some(StoreReview {
        review_id,
        content,
        score,
        at,
    })
}
