//! Normalizer stage: raw table → canonical review table
//!
//! Order of operations:
//! 1. Derive `date` from legacy `at` when no `date` column exists
//! 2. Drop rows whose text is missing or whitespace-only
//! 3. Deduplicate on (bank, review_id) if any row carries an id, else on
//!    (bank, review_text); first occurrence wins
//! 4. Normalize dates to `YYYY-MM-DD` (sentinel `unknown` if there is no date
//!    column at all); a malformed date is a hard error
//! 5. Project to `review_id, review_text, rating, date, bank, source`

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reviews_common::models::UNKNOWN_DATE;
use reviews_common::table::{self, RawTable};
use reviews_common::{Error, Result, Review};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Normalize a raw table into canonical rows
pub fn normalize(raw: &RawTable) -> Result<Vec<Review>> {
    let text_col = raw
        .column("review")
        .or_else(|| raw.column("review_text"))
        .ok_or_else(|| {
            Error::DataQuality("input has neither a 'review' nor a 'review_text' column".to_string())
        })?;

    let id_col = raw.column("review_id");
    let bank_col = raw.column("bank");
    let rating_col = raw.column("rating");
    let source_col = raw.column("source");

    // Step 1: legacy timestamp column stands in for a missing date column
    let date_col = raw.column("date").or_else(|| raw.column("at"));

    // Step 2: keep rows with non-blank text
    let kept: Vec<usize> = (0..raw.len())
        .filter(|&i| {
            raw.cell(i, Some(text_col))
                .is_some_and(|t| !t.trim().is_empty())
        })
        .collect();

    // Step 3: table-wide dedupe policy
    let dedupe_on_id = kept.iter().any(|&i| raw.cell(i, id_col).is_some());
    let mut seen: HashSet<(Option<&str>, &str)> = HashSet::new();
    let mut unique = Vec::with_capacity(kept.len());
    for &i in &kept {
        let bank = raw.cell(i, bank_col);
        let key = if dedupe_on_id {
            match raw.cell(i, id_col) {
                Some(id) => Some((bank, id)),
                // A row without an id cannot collide under id-based policy
                None => None,
            }
        } else {
            raw.cell(i, Some(text_col)).map(|text| (bank, text))
        };

        match key {
            Some(key) if !seen.insert(key) => continue,
            _ => unique.push(i),
        }
    }

    // Steps 4 and 5
    let mut reviews = Vec::with_capacity(unique.len());
    for &i in &unique {
        let date = match date_col {
            Some(_) => match raw.cell(i, date_col) {
                Some(value) => Some(normalize_date(value).map_err(|e| {
                    Error::DataQuality(format!("row {}: {}", i + 2, e))
                })?),
                None => None,
            },
            None => Some(UNKNOWN_DATE.to_string()),
        };

        reviews.push(Review {
            review_id: raw.cell(i, id_col).map(str::to_string),
            review_text: raw.cell(i, Some(text_col)).unwrap_or_default().to_string(),
            rating: raw.cell(i, rating_col).and_then(parse_rating),
            date,
            bank: raw.cell(i, bank_col).unwrap_or_default().to_string(),
            source: raw.cell(i, source_col).map(str::to_string),
        });
    }

    info!(
        "Preprocess: before={} after={} dropped={}",
        raw.len(),
        reviews.len(),
        raw.len() - reviews.len()
    );

    Ok(reviews)
}

/// Parse any accepted date or timestamp shape into `YYYY-MM-DD`
///
/// The [`UNKNOWN_DATE`] sentinel passes through unchanged so a cleaned table
/// can be cleaned again.
pub fn normalize_date(value: &str) -> Result<String> {
    let value = value.trim();
    if value == UNKNOWN_DATE {
        return Ok(UNKNOWN_DATE.to_string());
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.format("%Y-%m-%d").to_string());
    }

    Err(Error::DataQuality(format!("unparseable date '{}'", value)))
}

/// Ratings arrive as `5` or `5.0`; anything outside 1..=5 is dropped
fn parse_rating(value: &str) -> Option<u8> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.fract() == 0.0 && (1.0..=5.0).contains(r))
        .map(|r| r as u8);
    if parsed.is_none() {
        debug!(rating = %value, "Ignoring unusable rating");
    }
    parsed
}

/// File-to-file normalizer stage
pub struct Normalizer;

impl Normalizer {
    /// Read `in_csv`, normalize, write `out_csv`; returns the output row count
    pub fn run(in_csv: &Path, out_csv: &Path) -> Result<usize> {
        info!("Loading raw csv: {}", in_csv.display());
        let raw = RawTable::read(in_csv)?;

        let reviews = normalize(&raw)?;
        table::write_rows(out_csv, &reviews)?;

        info!("Saved clean CSV to {} ({} rows)", out_csv.display(), reviews.len());
        Ok(reviews.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_HEADERS: &[&str] = &["bank", "review_id", "review", "rating", "date", "source"];

    #[test]
    fn test_date_shapes() {
        assert_eq!(normalize_date("2025-11-29").unwrap(), "2025-11-29");
        assert_eq!(normalize_date("2025-11-29T08:30:00").unwrap(), "2025-11-29");
        assert_eq!(normalize_date("2025-11-29T08:30:00.123").unwrap(), "2025-11-29");
        assert_eq!(normalize_date("2025-11-29 08:30:00").unwrap(), "2025-11-29");
        assert_eq!(normalize_date("2025-11-29T08:30:00+03:00").unwrap(), "2025-11-29");
        assert_eq!(normalize_date("2025/11/29").unwrap(), "2025-11-29");
    }

    #[test]
    fn test_unknown_date_passes_through() {
        assert_eq!(normalize_date(UNKNOWN_DATE).unwrap(), UNKNOWN_DATE);
        assert_eq!(normalize_date(" unknown ").unwrap(), "unknown");
    }

    #[test]
    fn test_malformed_date_fails() {
        assert!(matches!(normalize_date("29th of Nov"), Err(Error::DataQuality(_))));
        assert!(normalize_date("2025-13-40").is_err());
    }

    #[test]
    fn test_rating_parsing() {
        assert_eq!(parse_rating("5"), Some(5));
        assert_eq!(parse_rating("3.0"), Some(3));
        assert_eq!(parse_rating("3.5"), None);
        assert_eq!(parse_rating("9"), None);
        assert_eq!(parse_rating("five"), None);
    }

    #[test]
    fn test_blank_text_dropped() {
        let raw = RawTable::from_rows(
            RAW_HEADERS,
            &[
                &["CBE", "1", "   ", "5", "2025-11-29", "google_play"],
                &["CBE", "2", "", "5", "2025-11-29", "google_play"],
                &["CBE", "3", "works", "5", "2025-11-29", "google_play"],
            ],
        );
        let reviews = normalize(&raw).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_dedupe_by_id_when_any_id_present() {
        let raw = RawTable::from_rows(
            RAW_HEADERS,
            &[
                &["CBE", "1", "first", "5", "", "google_play"],
                &["CBE", "1", "first again", "4", "", "google_play"],
                &["BOA", "1", "same id other bank", "4", "", "google_play"],
                &["CBE", "", "dup text", "2", "", "google_play"],
                &["CBE", "", "dup text", "2", "", "google_play"],
            ],
        );
        let reviews = normalize(&raw).unwrap();

        // Rows without an id are not collapsed under the id policy
        assert_eq!(reviews.len(), 4);
        assert_eq!(reviews[0].review_text, "first");
        assert_eq!(reviews[1].bank, "BOA");
    }

    #[test]
    fn test_dedupe_by_text_when_no_ids() {
        let raw = RawTable::from_rows(
            RAW_HEADERS,
            &[
                &["CBE", "", "same", "5", "", ""],
                &["CBE", "", "same", "1", "", ""],
                &["BOA", "", "same", "1", "", ""],
            ],
        );
        let reviews = normalize(&raw).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].rating, Some(5));
    }

    #[test]
    fn test_legacy_at_column_becomes_date() {
        let raw = RawTable::from_rows(
            &["bank", "review_id", "review", "rating", "at", "source"],
            &[&["CBE", "1", "fine", "4", "2025-11-29 10:00:00", "google_play"]],
        );
        let reviews = normalize(&raw).unwrap();
        assert_eq!(reviews[0].date.as_deref(), Some("2025-11-29"));
    }

    #[test]
    fn test_missing_date_column_uses_sentinel() {
        let raw = RawTable::from_rows(&["bank", "review"], &[&["CBE", "fine"]]);
        let reviews = normalize(&raw).unwrap();
        assert_eq!(reviews[0].date.as_deref(), Some(UNKNOWN_DATE));
        assert_eq!(reviews[0].review_id, None);
    }

    #[test]
    fn test_empty_date_cell_stays_empty() {
        let raw = RawTable::from_rows(RAW_HEADERS, &[&["CBE", "1", "fine", "4", "", "x"]]);
        let reviews = normalize(&raw).unwrap();
        assert_eq!(reviews[0].date, None);
    }

    #[test]
    fn test_missing_text_column_is_data_quality_error() {
        let raw = RawTable::from_rows(&["bank", "rating"], &[&["CBE", "5"]]);
        assert!(matches!(normalize(&raw), Err(Error::DataQuality(_))));
    }

    #[test]
    fn test_bad_date_names_row() {
        let raw = RawTable::from_rows(RAW_HEADERS, &[&["CBE", "1", "fine", "4", "yesterday", "x"]]);
        let err = normalize(&raw).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{}", err);
        assert!(err.contains("yesterday"), "{}", err);
    }
}
