//! Census Explorer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that forces the offline fixture service
pub const MOCK_ENV_VAR: &str = "CENSUS_EXPLORER_MOCK";

/// Project-local config file name
const LOCAL_CONFIG: &str = ".census-explorer.yml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Remote answer service
    pub api: ApiConfig,

    /// Offline fixture service
    pub mock: MockConfig,

    /// Debugging aids
    pub debug: DebugConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(LOCAL_CONFIG)), Self::user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("census-explorer").join("census-explorer.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply command-line and environment overrides on top of the loaded file
    pub fn apply_overrides(&mut self, force_mock: bool, api_url: Option<&str>, mock_env: Option<&str>) {
        tracing::debug!(force_mock, ?api_url, ?mock_env, "Config::apply_overrides: called");
        if force_mock || mock_env.is_some_and(is_truthy) {
            self.mock.enabled = true;
        }
        if let Some(url) = api_url {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.mock.min_delay_ms > self.mock.max_delay_ms {
            return Err(eyre::eyre!(
                "mock.min-delay-ms ({}) is greater than mock.max-delay-ms ({})",
                self.mock.min_delay_ms,
                self.mock.max_delay_ms
            ));
        }
        if !self.mock.enabled && !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(eyre::eyre!(
                "api.base-url must be an http(s) URL, got '{}'",
                self.api.base_url
            ));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Remote answer service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; questions are POSTed to `<base-url>/ask`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Fixture service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Answer from built-in fixtures instead of the network
    pub enabled: bool,

    /// Lower bound of the simulated latency
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the simulated latency
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_delay_ms: 800,
            max_delay_ms: 2000,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Append every turn to a JSONL transcript
    #[serde(rename = "log-conversations")]
    pub log_conversations: bool,
}
