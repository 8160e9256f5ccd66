//! Configuration management for Relay
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/relay/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{RelayError, Result};

/// Main configuration for Relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reasoning model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Orchestration loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Concrete tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Chat-completions backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub name: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, only ever taken from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model calls allowed per loop instance before it aborts
    /// Default: 100
    pub recursion_limit: usize,
    /// How many levels of `task` delegation are allowed
    /// Default: 1 (top level may delegate, sub-agents may not)
    pub max_depth: usize,
    /// Run the tool calls of one step concurrently
    pub parallel_tools: bool,
    /// Extra instructions appended to the fixed preamble
    pub system_prompt: Option<String>,
}

/// Concrete tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory tools start in (defaults to the process working directory)
    pub working_dir: Option<PathBuf>,
    /// Default shell command timeout in milliseconds
    pub bash_timeout_ms: u64,
    /// Upper bound for a caller-supplied shell timeout
    pub max_bash_timeout_ms: u64,
    /// Maximum captured bytes per output stream
    pub max_output_bytes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("RELAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
            name: env::var("RELAY_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string()),
            temperature: 0.0,
            max_tokens: 4096,
            timeout_secs: 120,
            api_key: api_key_from_env(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            recursion_limit: env::var("RELAY_RECURSION_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            max_depth: 1,
            parallel_tools: true,
            system_prompt: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            bash_timeout_ms: 120_000,
            max_bash_timeout_ms: 600_000,
            max_output_bytes: 10 * 1024 * 1024,
        }
    }
}

fn api_key_from_env() -> Option<String> {
    env::var("RELAY_API_KEY")
        .or_else(|_| env::var("DEEPSEEK_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty())
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relay")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let mut config = match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "Using default configuration");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| env::var(key).ok());

        if config.model.api_key.is_none() {
            config.model.api_key = api_key_from_env();
        }

        config
    }

    /// Let `RELAY_*` variables win over values read from the config file
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("RELAY_BASE_URL") {
            self.model.base_url = url;
        }
        if let Some(name) = lookup("RELAY_MODEL") {
            self.model.name = name;
        }
        match lookup("RELAY_RECURSION_LIMIT").map(|v| v.parse::<usize>()) {
            Some(Ok(limit)) => self.agent.recursion_limit = limit,
            Some(Err(e)) => tracing::warn!(error = %e, "Ignoring invalid RELAY_RECURSION_LIMIT"),
            None => {}
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(RelayError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| RelayError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RelayError::config(format!("Failed to parse config: {}", e)))
    }

    /// Directory tools and the preamble treat as the project root
    pub fn working_dir(&self) -> PathBuf {
        self.tools
            .working_dir
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.model.base_url.trim_end_matches('/'))
    }
}
