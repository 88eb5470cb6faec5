use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::classify::Exclusions;
use crate::fetcher::{FetchConfig, DEFAULT_USER_AGENT};
use crate::pipeline::PipelineConfig;

const ENV_PREFIX: &str = "LAWSUIT";
const CONFIG_FILE: &str = "lawsuit-scraper";

/// Run settings: defaults, then `lawsuit-scraper.{toml,json,yaml}`, then
/// `LAWSUIT_*` environment variables. CLI flags are applied on top in `main`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub ledger: PathBuf,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub delay_secs: u64,
    pub user_agent: String,
    pub excluded_urls: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("archive-lawsuits.json"),
            output_dir: PathBuf::from("extracted-content"),
            ledger: PathBuf::from("extraction-log.json"),
            batch_size: 50,
            timeout_secs: 30,
            delay_secs: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            excluded_urls: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::build(Environment::with_prefix(ENV_PREFIX))
    }

    fn build(env: Environment) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("excluded_urls"),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            batch_size: self.batch_size,
            delay: Duration::from_secs(self.delay_secs),
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn exclusions(&self) -> Exclusions {
        Exclusions::new(self.excluded_urls.iter().cloned())
    }
}

// ── Tests ──
