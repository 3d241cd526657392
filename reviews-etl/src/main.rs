//! reviews-etl - Bank app review pipeline
//!
//! Each subcommand runs one stage file-to-file; `run` executes all six in
//! order. Paths default to the configured data and visuals directories.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reviews_common::config::PipelineConfig;
use reviews_etl::collector::{Collector, PlayStoreClient};
use reviews_etl::normalizer::Normalizer;
use reviews_etl::persister;
use reviews_etl::sentiment::{SentimentScorer, VaderScorer};
use reviews_etl::themes::ThemeTagger;
use reviews_etl::visualizer::Visualizer;
use reviews_etl::Pipeline;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for reviews-etl
#[derive(Parser, Debug)]
#[command(name = "reviews-etl")]
#[command(about = "Scrape, clean, score, tag, store and chart bank app reviews")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: ./reviews-etl.toml, then ~/.config/reviews-etl/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch reviews for every tracked app into the raw CSV
    Scrape {
        /// Reviews to fetch per app
        #[arg(long)]
        target: Option<usize>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Clean, dedupe and reshape the raw CSV
    Preprocess {
        #[arg(long = "in", value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Attach VADER compound scores and labels
    Sentiment {
        #[arg(long = "in", value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Tag themes and report salient TF-IDF terms
    Themes {
        #[arg(long = "in", value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Salient terms to compute
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Upsert annotated reviews into the database at DATABASE_URL
    Persist {
        #[arg(long = "in", value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Render summary charts
    Visualize {
        #[arg(long = "in", value_name = "FILE")]
        input: Option<PathBuf>,
        /// Output directory for charts
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Run every stage in order
    Run {
        /// Reviews to fetch per app
        #[arg(long)]
        target: Option<usize>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "reviews-etl v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = PipelineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    info!("Data directory: {}", config.data_dir.display());

    match args.command {
        Command::Scrape { target, out } => {
            let target = target.unwrap_or(config.target_each);
            let out = out.unwrap_or_else(|| config.raw_csv());
            let client = PlayStoreClient::new().context("Failed to build Play Store client")?;
            Collector::new(client, &config)
                .collect_to_file(target, &out)
                .await
                .context("Scrape failed")?;
        }
        Command::Preprocess { input, out } => {
            let input = input.unwrap_or_else(|| config.raw_csv());
            let out = out.unwrap_or_else(|| config.clean_csv());
            Normalizer::run(&input, &out)
                .with_context(|| format!("Preprocessing {} failed", input.display()))?;
        }
        Command::Sentiment { input, out } => {
            let input = input.unwrap_or_else(|| config.clean_csv());
            let out = out.unwrap_or_else(|| config.sentiment_csv());
            SentimentScorer::new(VaderScorer::new())
                .run(&input, &out)
                .with_context(|| format!("Sentiment scoring {} failed", input.display()))?;
        }
        Command::Themes { input, out, top_k } => {
            let input = input.unwrap_or_else(|| config.sentiment_csv());
            let out = out.unwrap_or_else(|| config.annotated_csv());
            ThemeTagger::new(top_k.unwrap_or(config.top_k))
                .run(&input, &out)
                .with_context(|| format!("Theme tagging {} failed", input.display()))?;
        }
        Command::Persist { input } => {
            let input = input.unwrap_or_else(|| config.annotated_csv());
            let url = config.require_database_url()?;
            persister::persist_file(url, &input)
                .await
                .with_context(|| format!("Persisting {} failed", input.display()))?;
        }
        Command::Visualize { input, out } => {
            let input = input.unwrap_or_else(|| config.annotated_csv());
            let out = out.unwrap_or_else(|| config.visuals_dir.clone());
            Visualizer::run(&input, &out)
                .with_context(|| format!("Rendering charts from {} failed", input.display()))?;
        }
        Command::Run { target } => {
            let target = target.unwrap_or(config.target_each);
            let report = Pipeline::new(config)
                .run_all(target)
                .await
                .context("Pipeline failed")?;
            for (stage, outcome) in &report.stages {
                info!("{:<10} {}", stage.as_str(), outcome);
            }
        }
    }

    Ok(())
}
