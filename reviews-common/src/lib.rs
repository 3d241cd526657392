//! # Reviews Common Library
//!
//! Shared code for the review ETL pipeline including:
//! - Canonical row types (raw, normalized, scored, annotated)
//! - CSV table reading and writing
//! - Configuration loading
//! - Tokenization and stopwords shared by theme ranking and charts

pub mod config;
pub mod error;
pub mod models;
pub mod table;
pub mod text;

pub use error::{Error, Result};
pub use models::{AnnotatedReview, RawReview, Review, ScoredReview, SentimentLabel};
