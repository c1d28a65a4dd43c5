mod env_manager;

use crate::error::{ProcessorError, Result};
use crate::utils::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_manager::{get_env_value, ApiKeys, GEMINI_API_KEY_VAR, GITHUB_TOKEN_VAR};

/// Default GitHub REST endpoint
pub const GITHUB_API_BASE: &str = "https://api.github.com";
/// Default Gemini REST endpoint
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model used for explanations
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Main configuration struct for the application
///
/// Values come from `config.toml` in the user's config directory when it exists,
/// and environment variables take precedence over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API keys for GitHub and Gemini
    pub api_keys: ApiKeys,
    /// Base URL of the GitHub REST API
    pub github_api_base: String,
    /// Base URL of the Gemini REST API
    pub gemini_api_base: String,
    /// Gemini model name
    pub model: String,
    /// Per-request network timeout
    pub request_timeout_secs: u64,
    /// Retry policy applied to every GitHub call
    pub retry: RetryPolicy,
    /// Where the full explanation is written
    pub output_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            github_api_base: GITHUB_API_BASE.to_string(),
            gemini_api_base: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 10,
            retry: RetryPolicy::default(),
            output_file: PathBuf::from("EXPLAIN.md"),
        }
    }
}

impl Config {
    /// Loads the configuration file (if any) and applies environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Location of the optional configuration file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("explainthisrepo").join("config.toml"))
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProcessorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML configuration text; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ProcessorError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Overrides fields from environment variables
    pub fn apply_env(&mut self) {
        let mut keys = ApiKeys::from_env();
        keys.merge_missing(std::mem::take(&mut self.api_keys));
        self.api_keys = keys;

        if let Some(base) = get_env_value("GITHUB_API_BASE_URL") {
            self.github_api_base = base;
        }
        if let Some(base) = get_env_value("GEMINI_API_BASE_URL") {
            self.gemini_api_base = base;
        }
        if let Some(model) = get_env_value("EXPLAINTHISREPO_MODEL") {
            self.model = model;
        }
    }

    /// GitHub token, if one is configured
    pub fn github_token(&self) -> Option<&str> {
        self.api_keys.github_token.as_deref()
    }

    /// Gemini API key, or a configuration error telling the user to set it
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.api_keys
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| ProcessorError::Config(format!("{} is not set", GEMINI_API_KEY_VAR)))
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
