//! File-to-file stage tests: preprocess → sentiment → themes

mod helpers;

use helpers::write_csv;
use reviews_common::{table, AnnotatedReview, Review, ScoredReview, SentimentLabel};
use reviews_etl::normalizer::Normalizer;
use reviews_etl::sentiment::{SentimentScorer, VaderScorer};
use reviews_etl::themes::ThemeTagger;

const RAW: &str = "bank,review_id,review,rating,date,source\n\
CBE,1,\"Great app!\",5,2025-11-29,Google Play\n\
CBE,2,\"Buggy app\",2,2025-11-29,Google Play\n";

#[test]
fn test_two_row_example_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_csv(dir.path(), "raw.csv", RAW);
    let clean = dir.path().join("clean.csv");
    let scored = dir.path().join("sentiment.csv");

    assert_eq!(Normalizer::run(&raw, &clean).unwrap(), 2);
    let rows: Vec<Review> = table::read_rows(&clean).unwrap();
    assert!(rows.iter().all(|r| r.date.as_deref() == Some("2025-11-29")));
    assert_eq!(rows[0].review_id.as_deref(), Some("1"));

    let scorer = SentimentScorer::new(VaderScorer::new());
    assert_eq!(scorer.run(&clean, &scored).unwrap(), 2);
    let first: Vec<ScoredReview> = table::read_rows(&scored).unwrap();
    assert_eq!(first[0].sentiment_label, SentimentLabel::Positive);

    // Same input, same scores
    scorer.run(&clean, &scored).unwrap();
    let second: Vec<ScoredReview> = table::read_rows(&scored).unwrap();
    assert_eq!(first[1].vader_score, second[1].vader_score);
    assert_eq!(first[1].sentiment_label, second[1].sentiment_label);
}

#[test]
fn test_clean_columns_exact_order() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_csv(dir.path(), "raw.csv", RAW);
    let clean = dir.path().join("clean.csv");

    Normalizer::run(&raw, &clean).unwrap();

    let content = std::fs::read_to_string(&clean).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(header, "review_id,review_text,rating,date,bank,source");
}

#[test]
fn test_normalizer_drops_blank_text_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_csv(
        dir.path(),
        "raw.csv",
        "bank,review_id,review,rating,date,source\n\
         CBE,1,fine,4,2025-11-29T08:00:00,google_play\n\
         CBE,1,fine,4,2025-11-29T08:00:00,google_play\n\
         CBE,2,\"   \",3,2025-11-28T08:00:00,google_play\n\
         BOA,3,slow,1,2025-11-27T08:00:00,google_play\n",
    );
    let once = dir.path().join("once.csv");
    let twice = dir.path().join("twice.csv");

    assert_eq!(Normalizer::run(&raw, &once).unwrap(), 2);
    assert_eq!(Normalizer::run(&once, &twice).unwrap(), 2);

    let a: Vec<Review> = table::read_rows(&once).unwrap();
    let b: Vec<Review> = table::read_rows(&twice).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|r| !r.review_text.trim().is_empty()));
}

#[test]
fn test_dateless_table_normalizes_twice() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_csv(
        dir.path(),
        "raw.csv",
        "bank,review_id,review,rating,source\n\
         CBE,1,fine,4,google_play\n\
         BOA,2,slow app,2,google_play\n",
    );
    let once = dir.path().join("once.csv");
    let twice = dir.path().join("twice.csv");

    assert_eq!(Normalizer::run(&raw, &once).unwrap(), 2);
    assert_eq!(Normalizer::run(&once, &twice).unwrap(), 2);

    let a: Vec<Review> = table::read_rows(&once).unwrap();
    let b: Vec<Review> = table::read_rows(&twice).unwrap();
    assert_eq!(a, b);
    assert!(b.iter().all(|r| r.date.as_deref() == Some("unknown")));
}

#[test]
fn test_malformed_date_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_csv(
        dir.path(),
        "raw.csv",
        "bank,review_id,review,rating,date,source\nCBE,1,ok,5,29th of November,google_play\n",
    );

    let err = Normalizer::run(&raw, &dir.path().join("clean.csv")).unwrap_err();
    assert!(err.to_string().contains("29th of November"));
}

#[test]
fn test_themes_stage_writes_annotated_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let scored = write_csv(
        dir.path(),
        "sentiment.csv",
        "review_id,review_text,rating,date,bank,source,vader_score,sentiment_label\n\
         1,app keeps crashing and login fails,1,2025-11-29,CBE,google_play,-0.4,negative\n\
         2,Nice colors,5,2025-11-29,BOA,google_play,0.42,positive\n",
    );
    let annotated = dir.path().join("annotated.csv");

    let report = ThemeTagger::new(5).run(&scored, &annotated).unwrap();

    assert_eq!(report.rows, 2);
    assert!(report.top_terms.len() <= 5);
    let rows: Vec<AnnotatedReview> = table::read_rows(&annotated).unwrap();
    assert_eq!(rows[0].themes, "Account Access,Performance");
    assert_eq!(rows[1].themes, "Other");
    assert_eq!(rows[0].sentiment_label, SentimentLabel::Negative);
}
