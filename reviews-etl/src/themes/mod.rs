//! Theme stage: rule-based theme tags per review plus salient-term report
//!
//! A theme matches when any of its keywords is a literal substring of the
//! lower-cased review text. Matching themes are joined with commas in table
//! order; a review with no match is tagged `Other`.

pub mod tfidf;

pub use tfidf::{salient_terms, SalientTerm};

use reviews_common::table;
use reviews_common::{AnnotatedReview, Result, ScoredReview};
use std::path::Path;
use tracing::info;

/// Fallback theme for reviews matching no keyword
pub const FALLBACK_THEME: &str = "Other";

/// Ordered theme → keyword table
pub const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Account Access",
        &["login", "signin", "password", "otp", "fingerprint", "biometric", "pin"],
    ),
    (
        "Transactions",
        &["transfer", "send", "payment", "transaction", "pending", "failed", "confirm"],
    ),
    (
        "Performance",
        &["slow", "lag", "loading", "crash", "crashes", "timeout", "delay"],
    ),
    (
        "UI/UX",
        &["ui", "interface", "button", "navigation", "design", "easy to use", "ux"],
    ),
    (
        "Support",
        &["support", "customer", "help", "agent", "call", "chat", "service"],
    ),
];

/// Theme names matched by `text`, in table order
pub fn detect_themes(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let hits: Vec<&'static str> = THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(theme, _)| *theme)
        .collect();

    if hits.is_empty() {
        vec![FALLBACK_THEME]
    } else {
        hits
    }
}

/// Comma-joined theme column value for `text`
pub fn theme_column(text: &str) -> String {
    detect_themes(text).join(",")
}

/// Output of the theme stage
#[derive(Debug, Clone)]
pub struct ThemeReport {
    pub rows: usize,
    pub top_terms: Vec<SalientTerm>,
}

/// Theme stage
pub struct ThemeTagger {
    top_k: usize,
}

impl ThemeTagger {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn annotate(&self, scored: Vec<ScoredReview>) -> Vec<AnnotatedReview> {
        scored
            .into_iter()
            .map(|r| {
                let themes = theme_column(&r.review_text);
                AnnotatedReview::new(r, themes)
            })
            .collect()
    }

    /// Tag themes, log the salient terms, write the annotated artifact
    pub fn run(&self, in_csv: &Path, out_csv: &Path) -> Result<ThemeReport> {
        info!("Loading sentiment csv: {}", in_csv.display());
        let scored: Vec<ScoredReview> = table::read_rows(in_csv)?;

        info!("Applying rule-based theme detection");
        let annotated = self.annotate(scored);

        info!("Computing TF-IDF candidate terms");
        let corpus: Vec<&str> = annotated.iter().map(|r| r.review_text.as_str()).collect();
        let top_terms = salient_terms(&corpus, self.top_k);
        info!(
            "Top TF-IDF candidates: {}",
            top_terms
                .iter()
                .take(10)
                .map(|t| t.term.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        table::write_rows(out_csv, &annotated)?;
        info!("Saved annotated reviews (themes) to {}", out_csv.display());

        Ok(ThemeReport {
            rows: annotated.len(),
            top_terms,
        })
    }
}
