//! Agent configuration: an optional RON file plus command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use engine_logging::{LevelFilter, LogDestination};
use harvester_core::{SafetyClassifier, DEFAULT_PROTECTED_SCHEMES};
use harvester_engine::{ReclaimSettings, SubmitSettings, Url};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/summarize";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub file: PathBuf,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Terminal,
            file: PathBuf::from("tab-harvester.log"),
            level: "info".to_string(),
        }
    }
}

/// Everything the `tab-harvester` binary needs to wire the agent.
///
/// Every field has a default, so a config file only names what it changes:
///
/// ```text
/// (
///     endpoint: "https://summarizer.internal/api/summarize",
///     max_concurrency: 2,
///     protect_pinned: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_concurrency: usize,
    pub enumerate_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub destroy_timeout_secs: u64,
    pub protected_schemes: Vec<String>,
    pub protect_pinned: bool,
    pub settings_file: PathBuf,
    pub inventory_file: PathBuf,
    /// When set, pages are read from `<dir>/<id>.html` before falling back to metadata.
    pub snapshot_dir: Option<PathBuf>,
    pub activity_file: PathBuf,
    pub idle_poll_secs: u64,
    pub settings_poll_secs: u64,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let reclaim = ReclaimSettings::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_concurrency: reclaim.max_concurrency,
            enumerate_timeout_secs: reclaim.enumerate_timeout.as_secs(),
            extract_timeout_secs: reclaim.extract_timeout.as_secs(),
            submit_timeout_secs: reclaim.submit_timeout.as_secs(),
            destroy_timeout_secs: reclaim.destroy_timeout.as_secs(),
            protected_schemes: DEFAULT_PROTECTED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            protect_pinned: false,
            settings_file: PathBuf::from("harvester_settings.ron"),
            inventory_file: PathBuf::from("inventory.json"),
            snapshot_dir: None,
            activity_file: PathBuf::from("activity"),
            idle_poll_secs: 5,
            settings_poll_secs: 5,
            log: LogConfig::default(),
        }
    }
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Summarization endpoint URL.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// JSON inventory kept up to date by the host bridge.
    #[arg(long)]
    pub inventory: Option<PathBuf>,
    /// Directory of `<id>.html` page snapshots.
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
    /// File whose modification time marks the last user activity.
    #[arg(long)]
    pub activity_file: Option<PathBuf>,
    /// RON file holding the persisted idle threshold.
    #[arg(long)]
    pub settings_file: Option<PathBuf>,
    #[arg(long)]
    pub max_concurrency: Option<usize>,
    /// Never reclaim pinned resources.
    #[arg(long)]
    pub protect_pinned: bool,
    #[arg(long, value_enum)]
    pub log_target: Option<LogTarget>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(content)?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(endpoint) = &overrides.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(path) = &overrides.inventory {
            self.inventory_file = path.clone();
        }
        if let Some(dir) = &overrides.snapshot_dir {
            self.snapshot_dir = Some(dir.clone());
        }
        if let Some(path) = &overrides.activity_file {
            self.activity_file = path.clone();
        }
        if let Some(path) = &overrides.settings_file {
            self.settings_file = path.clone();
        }
        if let Some(n) = overrides.max_concurrency {
            self.max_concurrency = n;
        }
        if overrides.protect_pinned {
            self.protect_pinned = true;
        }
        if let Some(target) = overrides.log_target {
            self.log.target = target;
        }
        if let Some(file) = &overrides.log_file {
            self.log.file = file.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.log.level = level.clone();
        }
    }

    pub fn submit_settings(&self) -> Result<SubmitSettings> {
        let endpoint = Url::parse(&self.endpoint)
            .with_context(|| format!("invalid endpoint url {:?}", self.endpoint))?;
        Ok(SubmitSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..SubmitSettings::new(endpoint)
        })
    }

    pub fn reclaim_settings(&self) -> ReclaimSettings {
        ReclaimSettings {
            max_concurrency: self.max_concurrency.max(1),
            enumerate_timeout: Duration::from_secs(self.enumerate_timeout_secs),
            extract_timeout: Duration::from_secs(self.extract_timeout_secs),
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            destroy_timeout: Duration::from_secs(self.destroy_timeout_secs),
        }
    }

    pub fn classifier(&self) -> SafetyClassifier {
        SafetyClassifier::new(&self.protected_schemes).protect_pinned(self.protect_pinned)
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.idle_poll_secs.max(1))
    }

    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings_poll_secs.max(1))
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log.target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(self.log.file.clone()),
            LogTarget::Both => LogDestination::Both(self.log.file.clone()),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log.level)
            .map_err(|_| anyhow!("unknown log level {:?}", self.log.level))
    }
}
