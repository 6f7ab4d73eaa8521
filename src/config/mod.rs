use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::transcription::PollPolicy;

/// Environment variable that supplies the generation API key when the config leaves it empty.
pub const LLM_API_KEY_ENV: &str = "MEETSCRIBE_LLM_API_KEY";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcription: TranscriptionConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Poll attempts per result encoding before giving up (default: 300)
    pub max_attempts: u32,
    pub poll_interval_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub upload_timeout_seconds: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://3090api.huannago.com".to_string(),
            username: String::new(),
            password: String::new(),
            max_attempts: 300,
            poll_interval_seconds: 2,
            connect_timeout_seconds: 5,
            read_timeout_seconds: 60,
            upload_timeout_seconds: 60,
        }
    }
}

impl TranscriptionConfig {
    /// The subtitle service rejects uploads without basic-auth credentials.
    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.max_attempts.max(1),
            interval: Duration::from_secs(self.poll_interval_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ws-02.wade0426.me/v1".to_string(),
            api_key: String::new(),
            model: "google/gemma-3-27b-it".to_string(),
            request_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub report_file: String,
    /// Shell command to run after the report is written.
    /// Receives the report via stdin.
    /// Env vars: MEETSCRIBE_TASK_ID, MEETSCRIBE_AUDIO_PATH, MEETSCRIBE_REPORT_PATH
    pub post_command: String,
    /// Timeout in seconds for the post_command (default: 3600 = 1 hour)
    pub post_command_timeout_seconds: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./out"),
            report_file: "meeting_report.md".to_string(),
            post_command: String::new(),
            post_command_timeout_seconds: 3600,
        }
    }
}

impl Config {
    /// Load the default config file, creating it with defaults when missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides().checked(&config_path));
        }

        Self::load_from(&config_path)
    }

    /// Load an explicit config file. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config.with_env_overrides().checked(path))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }

    fn with_env_overrides(mut self) -> Self {
        if self.generation.api_key.is_empty() {
            if let Ok(key) = std::env::var(LLM_API_KEY_ENV) {
                self.generation.api_key = key.trim().to_string();
            }
        }
        self
    }

    fn checked(self, path: &Path) -> Self {
        if !self.transcription.has_credentials() {
            warn!(
                "transcription.username/password are not set in {:?}; the subtitle service will reject the upload",
                path
            );
        }
        self
    }

    /// Copy of the config safe for printing.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.transcription.password.is_empty() {
            masked.transcription.password = "********".to_string();
        }
        if !masked.generation.api_key.is_empty() {
            masked.generation.api_key = "********".to_string();
        }
        masked
    }
}
