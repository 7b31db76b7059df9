use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

pub const API_KEY_VAR: &str = "API_KEY";

/// Optional settings file. The API key never lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_video_model")]
    pub video_model: String,
    #[serde(default = "default_script_model")]
    pub script_model: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_video_model() -> String {
    "veo-2.0-generate-001".to_string()
}

fn default_script_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            video_model: default_video_model(),
            script_model: default_script_model(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_timeout_secs: None,
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub settings: Settings,
}

impl Config {
    /// Defaults plus `API_KEY` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(Settings::default(), |key| std::env::var(key).ok())
    }

    /// Reads `path` if it exists, then takes `API_KEY` from the environment.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Settings::load(path).await?;
        Self::from_lookup(settings, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(settings: Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .with_context(|| format!("{API_KEY_VAR} environment variable is not set."))?;

        if settings.poll_interval_secs == 0 {
            anyhow::bail!("config: poll_interval_secs must be at least 1");
        }

        Ok(Self { api_key, settings })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.settings.poll_timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}
