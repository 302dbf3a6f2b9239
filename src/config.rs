use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Hosted completion settings. The candidate order in `models` is the
/// order of preference.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call timeout; a timed-out call counts as a failed candidate.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            models: default_models(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            history_window: default_history_window(),
        }
    }
}

impl LlmConfig {
    /// Read the credential from the configured environment variable.
    /// An empty variable counts as absent.
    pub fn credential_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    /// JSON profile to serve instead of the bundled one.
    pub path: Option<PathBuf>,
}

// Defaults
fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
pub(crate) fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_models() -> Vec<String> {
    vec![
        "llama-3.1-70b-versatile".into(),
        "llama3-70b-8192".into(),
        "llama-3.1-8b-instant".into(),
        "llama3-8b-8192".into(),
        "mixtral-8x7b-32768".into(),
    ]
}
fn default_temperature() -> f32 {
    0.6
}
fn default_max_tokens() -> u32 {
    512
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_history_window() -> usize {
    12
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.models.is_empty() {
            return Err(Error::config("llm.models must list at least one model"));
        }
        if self.llm.history_window == 0 {
            return Err(Error::config("llm.history_window must be positive"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be positive"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config("llm.temperature must be within 0.0..=2.0"));
        }
        Ok(())
    }
}
