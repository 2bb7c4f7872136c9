use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::errors::{BotError, BotResult};

pub const API_KEY_PLACEHOLDER: &str = "Enter your API key here";

const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub threshold: usize,
    /// Window length in minutes
    pub minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_JOBS,
            timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
        }
    }
}

impl JobsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Config written out when none exists yet
    pub fn template() -> Self {
        Self {
            general: GeneralConfig {
                api_key: Some(API_KEY_PLACEHOLDER.to_string()),
            },
            rate_limit: RateLimitConfig {
                threshold: 5,
                minutes: 10,
            },
            jobs: JobsConfig::default(),
        }
    }

    /// Load the config, writing a template and failing if the file is absent.
    pub fn load(path: &Path) -> BotResult<Self> {
        if !path.exists() {
            let template = toml::to_string_pretty(&Self::template())?;
            fs::write(path, template)?;
            return Err(BotError::ConfigMissing(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> BotResult<()> {
        match self.general.api_key.as_deref().map(str::trim) {
            None | Some("") | Some(API_KEY_PLACEHOLDER) => {
                return Err(BotError::ConfigMissing(path.to_path_buf()));
            }
            Some(_) => {}
        }

        if self.rate_limit.threshold == 0 || self.rate_limit.minutes == 0 {
            return Err(BotError::ConfigInvalid(
                "rate_limit.threshold and rate_limit.minutes must be positive".to_string(),
            ));
        }

        if self.jobs.max_concurrent == 0 || self.jobs.timeout_secs == 0 {
            return Err(BotError::ConfigInvalid(
                "jobs.max_concurrent and jobs.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The validated bot token
    pub fn api_key(&self) -> &str {
        self.general.api_key.as_deref().unwrap_or_default().trim()
    }
}

/// Config location, overridable through `CONFIG_PATH`
pub fn config_path() -> PathBuf {
    env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}
