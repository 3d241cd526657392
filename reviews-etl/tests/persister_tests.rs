//! Persistence tests against a temp-file SQLite database

mod helpers;

use helpers::{sqlite_url, write_csv};
use reviews_etl::persister::{self, apply_schema, load_bank_map};
use sqlx::{Connection, SqliteConnection};

const ANNOTATED: &str = "review_id,review_text,rating,date,bank,source,vader_score,sentiment_label,themes\n\
r1,Great app!,5,2025-11-29,CBE,google_play,0.6588,positive,Other\n\
r2,transfer failed,1,2025-11-28,CBE,google_play,-0.5106,negative,Transactions\n\
r3,slow login,2,2025-11-27,BOA,google_play,0.0,neutral,\"Account Access,Performance\"\n";

async fn count_reviews(url: &str) -> i64 {
    let mut conn = SqliteConnection::connect(url).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
    count
}

#[tokio::test]
async fn test_persist_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "annotated.csv", ANNOTATED);
    let url = sqlite_url(dir.path());

    let first = persister::persist_file(&url, &csv).await.unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(first.banks, vec!["BOA", "CBE"]);
    assert_eq!(count_reviews(&url).await, 3);

    let second = persister::persist_file(&url, &csv).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(count_reviews(&url).await, 3);
}

#[tokio::test]
async fn test_rows_are_linked_to_banks() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "annotated.csv", ANNOTATED);
    let url = sqlite_url(dir.path());

    persister::persist_file(&url, &csv).await.unwrap();

    let mut conn = SqliteConnection::connect(&url).await.unwrap();
    let banks = load_bank_map(&mut conn).await.unwrap();
    let (bank_id, themes, score): (Option<i64>, String, Option<f64>) = sqlx::query_as(
        "SELECT bank_id, themes, sentiment_score FROM reviews WHERE review_id = 'r3'",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();

    assert_eq!(bank_id, banks.get("BOA").copied());
    assert_eq!(themes, "Account Access,Performance");
    assert_eq!(score, Some(0.0));
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_bank_leaves_null_foreign_key() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "annotated.csv",
        "review_id,review_text,rating,date,bank,source,vader_score,sentiment_label,themes\n\
         x1,orphan review,not-a-number,,,,,,\n",
    );
    let url = sqlite_url(dir.path());

    let summary = persister::persist_file(&url, &csv).await.unwrap();
    assert!(summary.banks.is_empty());

    let mut conn = SqliteConnection::connect(&url).await.unwrap();
    let (bank_id, rating, source): (Option<i64>, Option<i64>, String) =
        sqlx::query_as("SELECT bank_id, rating, source FROM reviews WHERE review_id = 'x1'")
            .fetch_one(&mut conn)
            .await
            .unwrap();

    assert_eq!(bank_id, None);
    assert_eq!(rating, None);
    assert_eq!(source, "google_play");
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_rows_without_id_stay_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "annotated.csv",
        "bank,review,vader_score,sentiment_label\nDashen,needs dark mode,0.0,neutral\n",
    );
    let url = sqlite_url(dir.path());

    persister::persist_file(&url, &csv).await.unwrap();
    persister::persist_file(&url, &csv).await.unwrap();

    assert_eq!(count_reviews(&url).await, 1);
}

#[tokio::test]
async fn test_schema_script_reapplies_cleanly() {
    let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();

    apply_schema(&mut conn).await.unwrap();
    apply_schema(&mut conn).await.unwrap();

    let tables: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('banks', 'reviews') ORDER BY name")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(tables, vec![("banks".to_string(),), ("reviews".to_string(),)]);
}

#[tokio::test]
async fn test_unreachable_database_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "annotated.csv", ANNOTATED);

    let url = format!("sqlite://{}", dir.path().join("missing/reviews.db").display());

    let result = persister::persist_file(&url, &csv).await;
    assert!(result.is_err());
}
