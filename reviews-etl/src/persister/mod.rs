//! Persistence stage: idempotent upsert of annotated reviews
//!
//! 1. Apply the schema script (idempotent)
//! 2. Insert distinct bank names, ignoring existing ones
//! 3. Re-read banks into a name → id map
//! 4. Insert reviews in pages, ignoring ids already stored
//!
//! Re-running on the same file leaves the tables unchanged. The connection is
//! opened on entry and closed on every exit path; the caller decides what a
//! failure means for the rest of the pipeline.

pub mod db;

pub use db::{apply_schema, insert_reviews, load_bank_map, upsert_banks, PersistRow};

use reviews_common::table::RawTable;
use reviews_common::Result;
use sqlx::{Connection, SqliteConnection};
use std::path::Path;
use tracing::{info, warn};

/// What one persistence run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub banks: Vec<String>,
    pub rows: usize,
    pub inserted: u64,
    pub skipped: u64,
}

/// Read the annotated artifact into insert-ready rows
pub fn load_rows(csv_path: &Path) -> Result<Vec<PersistRow>> {
    let table = RawTable::read(csv_path)?;
    Ok(PersistRow::from_table(&table))
}

/// Persist `rows` over an open connection
pub async fn persist_rows(conn: &mut SqliteConnection, rows: &[PersistRow]) -> Result<PersistSummary> {
    apply_schema(conn).await?;
    info!("Ensured DB schema applied.");

    let banks = upsert_banks(conn, rows).await?;
    info!("Banks upserted: {}", banks.join(", "));

    let bank_map = load_bank_map(conn).await?;
    let inserted = insert_reviews(conn, rows, &bank_map).await?;
    let skipped = rows.len() as u64 - inserted;

    info!(
        "Inserted {} rows into reviews table ({} duplicates skipped)",
        inserted, skipped
    );

    Ok(PersistSummary {
        banks,
        rows: rows.len(),
        inserted,
        skipped,
    })
}

/// Connect, persist the annotated file, close
pub async fn persist_file(database_url: &str, csv_path: &Path) -> Result<PersistSummary> {
    let rows = load_rows(csv_path)?;

    let mut conn = SqliteConnection::connect(database_url).await?;
    let result = persist_rows(&mut conn, &rows).await;

    if let Err(e) = conn.close().await {
        warn!("Closing database connection failed: {}", e);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = persist_file("sqlite::memory:", Path::new("/nonexistent/annotated.csv")).await;
        assert!(result.is_err());
    }
}
