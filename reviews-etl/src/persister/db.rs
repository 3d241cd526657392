//! Review store database operations

use reviews_common::models::{Bank, SOURCE_GOOGLE_PLAY};
use reviews_common::table::RawTable;
use reviews_common::Result;
use sha2::{Digest, Sha256};
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::{BTreeSet, HashMap};

/// Schema script applied before every insert batch
pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Rows per INSERT statement
const INSERT_PAGE_SIZE: usize = 100;

/// Annotated review coerced for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct PersistRow {
    pub review_id: String,
    pub bank: Option<String>,
    pub review_text: String,
    pub rating: Option<i64>,
    pub review_date: Option<String>,
    pub sentiment_label: Option<String>,
    pub sentiment_score: Option<f64>,
    pub themes: String,
    pub source: String,
}

impl PersistRow {
    /// Coerce every row of an annotated table
    ///
    /// Unparseable ratings and scores become NULL. Rows without a
    /// `review_id` get a key derived from (bank, review_text) so re-runs still
    /// collide with the stored row.
    pub fn from_table(table: &RawTable) -> Vec<Self> {
        let id_col = table.column("review_id");
        let bank_col = table.column("bank");
        let text_col = table.column("review_text").or_else(|| table.column("review"));
        let rating_col = table.column("rating");
        let date_col = table.column("date");
        let label_col = table.column("sentiment_label");
        let score_col = table.column("vader_score");
        let themes_col = table.column("themes").or_else(|| table.column("themes_str"));
        let source_col = table.column("source");

        (0..table.len())
            .map(|i| {
                let bank = table.cell(i, bank_col).map(str::to_string);
                let review_text = table.cell(i, text_col).unwrap_or_default().to_string();
                let review_id = match table.cell(i, id_col) {
                    Some(id) => id.to_string(),
                    None => surrogate_review_id(bank.as_deref().unwrap_or_default(), &review_text),
                };

                PersistRow {
                    review_id,
                    bank,
                    review_text,
                    rating: table.cell(i, rating_col).and_then(coerce_int),
                    review_date: table.cell(i, date_col).map(str::to_string),
                    sentiment_label: table.cell(i, label_col).map(str::to_string),
                    sentiment_score: table.cell(i, score_col).and_then(|s| s.trim().parse().ok()),
                    themes: table.cell(i, themes_col).unwrap_or_default().to_string(),
                    source: table
                        .cell(i, source_col)
                        .unwrap_or(SOURCE_GOOGLE_PLAY)
                        .to_string(),
                }
            })
            .collect()
    }
}

/// Stable key for a review that arrived without one
pub fn surrogate_review_id(bank: &str, review_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bank.as_bytes());
    hasher.update([0x1f]);
    hasher.update(review_text.as_bytes());
    format!("sha256-{:x}", hasher.finalize())
}

fn coerce_int(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Apply the schema script
pub async fn apply_schema(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&mut *conn).await?;
    Ok(())
}

/// Insert distinct bank names; returns them sorted
pub async fn upsert_banks(conn: &mut SqliteConnection, rows: &[PersistRow]) -> Result<Vec<String>> {
    let names: BTreeSet<&str> = rows
        .iter()
        .filter_map(|r| r.bank.as_deref())
        .filter(|b| !b.is_empty())
        .collect();

    let mut tx = conn.begin().await?;
    for name in &names {
        sqlx::query("INSERT INTO banks (bank_name) VALUES (?) ON CONFLICT (bank_name) DO NOTHING")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(names.into_iter().map(str::to_string).collect())
}

/// All banks as name → id
pub async fn load_bank_map(conn: &mut SqliteConnection) -> Result<HashMap<String, i64>> {
    let banks: Vec<Bank> = sqlx::query_as("SELECT bank_id, bank_name FROM banks")
        .fetch_all(&mut *conn)
        .await?;

    Ok(banks.into_iter().map(|b| (b.bank_name, b.bank_id)).collect())
}

/// Insert reviews in pages, skipping stored ids; returns rows actually inserted
///
/// A bank missing from `bank_map` leaves `bank_id` NULL.
pub async fn insert_reviews(
    conn: &mut SqliteConnection,
    rows: &[PersistRow],
    bank_map: &HashMap<String, i64>,
) -> Result<u64> {
    let mut inserted = 0;
    let mut tx = conn.begin().await?;

    for page in rows.chunks(INSERT_PAGE_SIZE) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO reviews (review_id, bank_id, review_text, rating, review_date, \
             sentiment_label, sentiment_score, themes, source) ",
        );
        builder.push_values(page, |mut b, row| {
            let bank_id = row.bank.as_ref().and_then(|name| bank_map.get(name)).copied();
            b.push_bind(row.review_id.clone())
                .push_bind(bank_id)
                .push_bind(row.review_text.clone())
                .push_bind(row.rating)
                .push_bind(row.review_date.clone())
                .push_bind(row.sentiment_label.clone())
                .push_bind(row.sentiment_score)
                .push_bind(row.themes.clone())
                .push_bind(row.source.clone());
        });
        builder.push(" ON CONFLICT (review_id) DO NOTHING");

        let result = builder.build().execute(&mut *tx).await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}
