//! Visualizer stage: descriptive charts from the annotated table
//!
//! Writes `sentiment_by_bank.svg`, `rating_distribution.svg` and
//! `top_negative_words.svg` into the output directory. The negative-words
//! chart is skipped with a warning when no review is labelled negative.

use plotters::prelude::*;
use reviews_common::{table, text, AnnotatedReview, Error, Result, SentimentLabel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SENTIMENT_CHART: &str = "sentiment_by_bank.svg";
pub const RATING_CHART: &str = "rating_distribution.svg";
pub const NEGATIVE_WORDS_CHART: &str = "top_negative_words.svg";

/// Words shown in the negative-review chart
pub const TOP_NEGATIVE_WORDS: usize = 20;

const CHART_SIZE: (u32, u32) = (800, 500);

/// Named count series over a shared category axis
type Series = (String, Vec<usize>);

/// Charts written by one run
#[derive(Debug, Clone, Default)]
pub struct VisualReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

fn chart_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Internal(format!("chart rendering failed: {:?}", e))
}

/// Bank names in first-appearance order
fn banks_in_order(rows: &[AnnotatedReview]) -> Vec<String> {
    let mut banks: Vec<String> = Vec::new();
    for row in rows {
        if !banks.contains(&row.bank) {
            banks.push(row.bank.clone());
        }
    }
    banks
}

/// Per-label counts for each bank: one series per label, indexed like `banks`
pub fn sentiment_counts(rows: &[AnnotatedReview]) -> (Vec<String>, Vec<Series>) {
    let banks = banks_in_order(rows);
    let series = SentimentLabel::ALL
        .iter()
        .map(|label| {
            let counts = banks
                .iter()
                .map(|bank| {
                    rows.iter()
                        .filter(|r| &r.bank == bank && r.sentiment_label == *label)
                        .count()
                })
                .collect();
            (label.to_string(), counts)
        })
        .collect();
    (banks, series)
}

/// Per-bank counts for each rating value present: one series per bank
pub fn rating_counts(rows: &[AnnotatedReview]) -> (Vec<String>, Vec<Series>) {
    let mut ratings: Vec<u8> = rows.iter().filter_map(|r| r.rating).collect();
    ratings.sort_unstable();
    ratings.dedup();

    let series = banks_in_order(rows)
        .into_iter()
        .map(|bank| {
            let counts = ratings
                .iter()
                .map(|rating| {
                    rows.iter()
                        .filter(|r| r.bank == bank && r.rating == Some(*rating))
                        .count()
                })
                .collect();
            (bank, counts)
        })
        .collect();

    (ratings.iter().map(|r| r.to_string()).collect(), series)
}

/// Most frequent non-stopword tokens in negative reviews, descending
pub fn top_negative_words(rows: &[AnnotatedReview], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows.iter().filter(|r| r.sentiment_label == SentimentLabel::Negative) {
        for token in text::content_tokens(&row.review_text) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(limit);
    words
}

/// Label for an integer-centred category axis; off-centre ticks stay blank
fn category_label(categories: &[String], value: f64) -> String {
    let nearest = value.round();
    if (value - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    categories.get(nearest as usize).cloned().unwrap_or_default()
}

fn draw_grouped_bars(
    path: &Path,
    caption: &str,
    x_desc: &str,
    categories: &[String],
    series: &[Series],
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let n = categories.len().max(1);
    let max = series
        .iter()
        .flat_map(|(_, counts)| counts.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..(max as f64 * 1.1))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(categories, *x))
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()
        .map_err(chart_err)?;

    let group_width = 0.8;
    let bar_width = group_width / series.len().max(1) as f64;

    for (idx, (name, counts)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let bars = counts.iter().enumerate().map(move |(c, count)| {
            let left = c as f64 - group_width / 2.0 + idx as f64 * bar_width;
            Rectangle::new([(left, 0.0), (left + bar_width, *count as f64)], color.filled())
        });
        chart
            .draw_series(bars)
            .map_err(chart_err)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

fn draw_word_bars(path: &Path, words: &[(String, usize)]) -> Result<()> {
    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    // Most frequent word at the top
    let labels: Vec<String> = words.iter().rev().map(|(w, _)| w.clone()).collect();
    let n = labels.len().max(1);
    let max = words.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Top words in negative reviews", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(0f64..(max as f64 * 1.1), -0.5f64..(n as f64 - 0.5))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y| category_label(&labels, *y))
        .x_desc("Frequency")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(words.iter().rev().enumerate().map(|(i, (_, count))| {
            let y = i as f64;
            Rectangle::new([(0.0, y - 0.4), (*count as f64, y + 0.4)], BLUE.filled())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Visualizer stage
pub struct Visualizer;

impl Visualizer {
    /// Render every chart for `rows` into `out_dir`
    pub fn render(rows: &[AnnotatedReview], out_dir: &Path) -> Result<VisualReport> {
        std::fs::create_dir_all(out_dir)?;
        let mut report = VisualReport::default();

        let path = out_dir.join(SENTIMENT_CHART);
        let (banks, series) = sentiment_counts(rows);
        draw_grouped_bars(&path, "Sentiment distribution by bank", "Bank", &banks, &series)?;
        info!("Saved {}", path.display());
        report.written.push(path);

        let path = out_dir.join(RATING_CHART);
        let (ratings, series) = rating_counts(rows);
        draw_grouped_bars(&path, "Rating distribution by bank", "Rating", &ratings, &series)?;
        info!("Saved {}", path.display());
        report.written.push(path);

        let words = top_negative_words(rows, TOP_NEGATIVE_WORDS);
        if words.is_empty() {
            warn!("No negative reviews to analyze for word frequency.");
            report.skipped.push(NEGATIVE_WORDS_CHART.to_string());
        } else {
            let path = out_dir.join(NEGATIVE_WORDS_CHART);
            draw_word_bars(&path, &words)?;
            info!("Saved {}", path.display());
            report.written.push(path);
        }

        Ok(report)
    }

    /// Load the annotated artifact and render charts
    pub fn run(in_csv: &Path, out_dir: &Path) -> Result<VisualReport> {
        info!("Loading annotated data: {}", in_csv.display());
        let rows: Vec<AnnotatedReview> = table::read_rows(in_csv)?;
        Self::render(&rows, out_dir)
    }
}
