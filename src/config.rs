use serde::Deserialize;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

pub const DEFAULT_URL: &str = "http://localhost:7071/api/consultVoiceListen?id=0-0";

/// How the read window is enforced once the body starts streaming.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineMode {
    /// Window is only checked between completed reads.
    #[default]
    Cooperative,
    /// Every read is bounded by `loop_start + window`.
    Hard,
}

impl std::str::FromStr for DeadlineMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cooperative" => Ok(DeadlineMode::Cooperative),
            "hard" => Ok(DeadlineMode::Hard),
            _ => Err(anyhow::anyhow!("Invalid deadline mode: {}. Valid modes are: cooperative, hard", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProbeConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_read_window_ms")]
    pub read_window_ms: u64,
    #[serde(default)]
    pub deadline_mode: DeadlineMode,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_read_window_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            read_window_ms: default_read_window_ms(),
            deadline_mode: DeadlineMode::default(),
            connect_timeout_ms: None,
            log_level: default_log_level(),
        }
    }
}

impl ProbeConfig {
    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow::anyhow!("Invalid log level: {}. Valid levels are: trace, debug, info, warn, error", self.log_level))
        }
    }

    pub fn read_window(&self) -> Duration {
        Duration::from_millis(self.read_window_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Load from `PROBE_CONFIG` (if set) and apply env overrides on top.
    pub async fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok()).await
    }

    pub async fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("PROBE_CONFIG") {
            Some(path) => Self::load_file_config(&path).await?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.get_tracing_level()?;
        Ok(config)
    }

    async fn load_file_config(file_path: &str) -> Result<Self> {
        if !Path::new(file_path).exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path));
        }

        let content = fs::read_to_string(file_path).await?;
        let config: ProbeConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", file_path))?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PROBE_URL") {
            self.url = url;
        }
        if let Some(ms) = lookup("PROBE_READ_WINDOW_MS") {
            self.read_window_ms = ms
                .parse()
                .with_context(|| format!("PROBE_READ_WINDOW_MS must be milliseconds, got {:?}", ms))?;
        }
        if let Some(mode) = lookup("PROBE_DEADLINE_MODE") {
            self.deadline_mode = mode.parse()?;
        }
        if let Some(ms) = lookup("PROBE_CONNECT_TIMEOUT_MS") {
            let ms = ms
                .parse()
                .with_context(|| format!("PROBE_CONNECT_TIMEOUT_MS must be milliseconds, got {:?}", ms))?;
            self.connect_timeout_ms = Some(ms);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }
}
