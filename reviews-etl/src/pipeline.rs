//! Pipeline orchestrator
//!
//! # Stage Progression
//! SCRAPE → PREPROCESS → SENTIMENT → THEMES → PERSIST → VISUALIZE
//!
//! Each stage reads the artifact written by the previous one. Errors in the
//! file stages abort the run. A persistence error (including a missing
//! `DATABASE_URL`) is recorded as [`StageOutcome::Failed`] and the run carries
//! on to visualization.

use crate::collector::{Collector, PlayStoreClient, ReviewSource};
use crate::normalizer::Normalizer;
use crate::persister;
use crate::sentiment::{PolarityScorer, SentimentScorer, VaderScorer};
use crate::themes::ThemeTagger;
use crate::visualizer::Visualizer;
use reviews_common::config::PipelineConfig;
use reviews_common::{table, AnnotatedReview, Error, Result};
use std::fmt;
use tracing::{error, info, warn};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scrape,
    Preprocess,
    Sentiment,
    Themes,
    Persist,
    Visualize,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Scrape,
        Stage::Preprocess,
        Stage::Sentiment,
        Stage::Themes,
        Stage::Persist,
        Stage::Visualize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scrape => "scrape",
            Stage::Preprocess => "preprocess",
            Stage::Sentiment => "sentiment",
            Stage::Themes => "themes",
            Stage::Persist => "persist",
            Stage::Visualize => "visualize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one stage as seen by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Stage ran; `rows` is the number of rows (or charts) it produced
    Completed { rows: usize },
    /// Stage had nothing to do
    Skipped { reason: String },
    /// Stage failed without stopping the pipeline
    Failed { reason: String },
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Completed { rows } => write!(f, "completed ({} rows)", rows),
            StageOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            StageOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-stage outcomes of one pipeline run, in execution order
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl PipelineReport {
    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        match &outcome {
            StageOutcome::Failed { .. } => warn!(stage = %stage, "Stage {}", outcome),
            _ => info!(stage = %stage, "Stage {}", outcome),
        }
        self.stages.push((stage, outcome));
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(|(_, outcome)| outcome.is_failed())
    }
}

/// Sequential six-stage orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage against the Play Store with the VADER scorer
    pub async fn run_all(&self, target_each: usize) -> Result<PipelineReport> {
        let client = PlayStoreClient::new()
            .map_err(|e| Error::Internal(format!("Failed to build Play Store client: {}", e)))?;
        self.run_with_source(client, target_each).await
    }

    /// Run every stage against `source` with the VADER scorer
    pub async fn run_with_source<S: ReviewSource>(&self, source: S, target_each: usize) -> Result<PipelineReport> {
        self.run_with_scorer(source, VaderScorer::new(), target_each).await
    }

    /// Run every stage with an explicit polarity scorer
    pub async fn run_with_scorer<S, P>(
        &self,
        source: S,
        scorer: P,
        target_each: usize,
    ) -> Result<PipelineReport>
    where
        S: ReviewSource,
        P: PolarityScorer,
    {
        self.config.ensure_directories()?;
        let mut report = PipelineReport::default();
        info!("Starting pipeline: target_each={}", target_each);

        let rows = Collector::new(source, &self.config)
            .collect_to_file(target_each, &self.config.raw_csv())
            .await?;
        report.record(Stage::Scrape, StageOutcome::Completed { rows });

        let rows = Normalizer::run(&self.config.raw_csv(), &self.config.clean_csv())?;
        report.record(Stage::Preprocess, StageOutcome::Completed { rows });

        let rows = SentimentScorer::new(scorer)
            .run(&self.config.clean_csv(), &self.config.sentiment_csv())?;
        report.record(Stage::Sentiment, StageOutcome::Completed { rows });

        let themes = ThemeTagger::new(self.config.top_k)
            .run(&self.config.sentiment_csv(), &self.config.annotated_csv())?;
        report.record(Stage::Themes, StageOutcome::Completed { rows: themes.rows });

        let outcome = self.persist_stage().await;
        report.record(Stage::Persist, outcome);

        let outcome = self.visualize_stage()?;
        report.record(Stage::Visualize, outcome);

        info!("Pipeline complete");
        Ok(report)
    }

    /// Persistence never aborts the run
    async fn persist_stage(&self) -> StageOutcome {
        let result = match self.config.require_database_url() {
            Ok(url) => persister::persist_file(url, &self.config.annotated_csv()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => StageOutcome::Completed { rows: summary.rows },
            Err(e) => {
                error!(
                    stage = %Stage::Persist,
                    file = %self.config.annotated_csv().display(),
                    "DB insert failed: {}",
                    e
                );
                StageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn visualize_stage(&self) -> Result<StageOutcome> {
        let rows: Vec<AnnotatedReview> = table::read_rows(&self.config.annotated_csv())?;
        if rows.is_empty() {
            warn!("No annotated reviews to chart.");
            return Ok(StageOutcome::Skipped {
                reason: "no annotated reviews".to_string(),
            });
        }

        let charts = Visualizer::render(&rows, &self.config.visuals_dir)?;
        Ok(StageOutcome::Completed {
            rows: charts.written.len(),
        })
    }
}
