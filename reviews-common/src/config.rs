//! Pipeline configuration resolution
//!
//! Priority order for each setting:
//! 1. Command-line argument (applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATA_DIR: &str = "REVIEWS_DATA_DIR";
pub const ENV_VISUALS_DIR: &str = "REVIEWS_VISUALS_DIR";

pub const DEFAULT_TARGET_EACH: usize = 600;
pub const DEFAULT_TOP_K: usize = 50;

/// Tracked application: bank display name and store application id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankApp {
    pub bank: String,
    pub app_id: String,
}

impl BankApp {
    pub fn new(bank: &str, app_id: &str) -> Self {
        Self {
            bank: bank.to_string(),
            app_id: app_id.to_string(),
        }
    }
}

/// Built-in tracked applications
pub fn default_apps() -> Vec<BankApp> {
    vec![
        BankApp::new("CBE", "com.combanketh.mobilebanking"),
        BankApp::new("BOA", "com.boa.boaMobileBanking"),
        BankApp::new("Dashen", "com.dashen.dashensuperapp"),
    ]
}

/// On-disk TOML configuration (every field optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data_dir: Option<PathBuf>,
    pub visuals_dir: Option<PathBuf>,
    pub database_url: Option<String>,
    pub lang: Option<String>,
    pub country: Option<String>,
    pub target_each: Option<usize>,
    pub top_k: Option<usize>,
    pub apps: Option<Vec<BankApp>>,
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Resolved configuration handed to each stage at construction
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Processed-data directory holding the CSV artifacts
    pub data_dir: PathBuf,
    /// Output directory for charts
    pub visuals_dir: PathBuf,
    /// Database connection string; only the persistence stage requires it
    pub database_url: Option<String>,
    pub lang: String,
    pub country: String,
    pub target_each: usize,
    pub top_k: usize,
    pub apps: Vec<BankApp>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data").join("processed"),
            visuals_dir: PathBuf::from("visuals"),
            database_url: None,
            lang: "en".to_string(),
            country: "us".to_string(),
            target_each: DEFAULT_TARGET_EACH,
            top_k: DEFAULT_TOP_K,
            apps: default_apps(),
        }
    }
}

impl PipelineConfig {
    /// Resolve configuration from an explicit TOML path, or the default search
    /// locations when `None`. A missing TOML file is not an error.
    pub fn load(toml_path: Option<&Path>) -> Result<Self> {
        let toml_config = match toml_path {
            Some(path) => TomlConfig::from_file(path)?,
            None => match find_config_file() {
                Some(path) => {
                    info!("Loading config from {}", path.display());
                    TomlConfig::from_file(&path)?
                }
                None => {
                    debug!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };

        Ok(Self::resolve(toml_config))
    }

    /// Merge environment variables over TOML values over compiled defaults
    pub fn resolve(toml_config: TomlConfig) -> Self {
        let defaults = Self::default();

        let data_dir = env_path(ENV_DATA_DIR)
            .or(toml_config.data_dir)
            .unwrap_or(defaults.data_dir);
        let visuals_dir = env_path(ENV_VISUALS_DIR)
            .or(toml_config.visuals_dir)
            .unwrap_or(defaults.visuals_dir);
        let database_url = std::env::var(ENV_DATABASE_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or(toml_config.database_url);

        let apps = match toml_config.apps {
            Some(apps) if !apps.is_empty() => apps,
            Some(_) => {
                warn!("Config lists no apps, using built-in app table");
                defaults.apps
            }
            None => defaults.apps,
        };

        Self {
            data_dir,
            visuals_dir,
            database_url,
            lang: toml_config.lang.unwrap_or(defaults.lang),
            country: toml_config.country.unwrap_or(defaults.country),
            target_each: toml_config.target_each.unwrap_or(defaults.target_each),
            top_k: toml_config.top_k.unwrap_or(defaults.top_k),
            apps,
        }
    }

    /// Database URL, or a configuration error naming the variable to set
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{} not set. Copy .env.example to .env and fill it in, e.g. \
                 {}=sqlite://data/reviews.db?mode=rwc",
                ENV_DATABASE_URL, ENV_DATABASE_URL
            ))
        })
    }

    pub fn raw_csv(&self) -> PathBuf {
        self.data_dir.join("raw_reviews.csv")
    }

    pub fn clean_csv(&self) -> PathBuf {
        self.data_dir.join("clean_reviews.csv")
    }

    pub fn sentiment_csv(&self) -> PathBuf {
        self.data_dir.join("sentiment_reviews.csv")
    }

    pub fn annotated_csv(&self) -> PathBuf {
        self.data_dir.join("annotated_reviews.csv")
    }

    /// Create data and visuals directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.visuals_dir)?;
        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// `./reviews-etl.toml`, then `~/.config/reviews-etl/config.toml`
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("reviews-etl.toml");
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("reviews-etl").join("config.toml"))
        .filter(|p| p.exists())
}
