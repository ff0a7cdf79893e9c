//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! temperature = 0.7
//! mode = "discuss"
//!
//! [logging]
//! conversation_log = "~/.local/share/chorus/turns.jsonl"
//!
//! [[models]]
//! id = "gpt"
//! display_name = "GPT-4o"
//! base_url = "https://api.openai.com/v1"
//! model_name = "gpt-4o"
//! api_key_env = "OPENAI_API_KEY"
//! ```

use chorus_application::EngineConfig;
use chorus_domain::{ConversationMode, PromptTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("models: id cannot be empty")]
    EmptyModelId,

    #[error("models: duplicate id '{0}'")]
    DuplicateModelId(String),

    #[error("models.{0}: base_url cannot be empty")]
    EmptyBaseUrl(String),

    #[error("engine.temperature: {0} is outside 0.0..=2.0")]
    TemperatureOutOfRange(f32),

    #[error("engine.mode: unknown mode '{0}'")]
    UnknownMode(String),

    #[error("engine.response_timeout_secs cannot be 0")]
    InvalidTimeout,
}

/// Raw engine configuration from TOML (`[engine]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Base system prompt; the built-in prompt when unset
    pub system_prompt: Option<String>,
    /// Default sampling temperature for a turn
    pub temperature: f32,
    /// Default conversation mode name
    pub mode: String,
    pub response_timeout_secs: u64,
    pub generate_summary: bool,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: 0.7,
            mode: ConversationMode::default().to_string(),
            response_timeout_secs: 30,
            generate_summary: true,
        }
    }
}

/// Raw logging configuration from TOML (`[logging]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of turn events
    pub conversation_log: Option<PathBuf>,
}

/// One `[[models]]` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub id: String,
    pub display_name: Option<String>,
    pub base_url: String,
    /// Backend model name; the id when unset
    pub model_name: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Inline API key (takes precedence over `api_key_env`)
    pub api_key: Option<String>,
}

impl FileModelConfig {
    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(&self.id)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub engine: FileEngineConfig,
    pub logging: FileLoggingConfig,
    pub models: Vec<FileModelConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyModelId);
                continue;
            }
            if !seen.insert(model.id.as_str()) {
                issues.push(ConfigValidationError::DuplicateModelId(model.id.clone()));
            }
            if model.base_url.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyBaseUrl(model.id.clone()));
            }
        }

        if !(0.0..=2.0).contains(&self.engine.temperature) {
            issues.push(ConfigValidationError::TemperatureOutOfRange(
                self.engine.temperature,
            ));
        }
        if self.engine.mode.parse::<ConversationMode>().is_err() {
            issues.push(ConfigValidationError::UnknownMode(self.engine.mode.clone()));
        }
        if self.engine.response_timeout_secs == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }

        issues
    }

    /// Default mode, falling back to isolated for an unknown name
    pub fn mode(&self) -> ConversationMode {
        self.engine.mode.parse().unwrap_or_default()
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        let system_prompt = self
            .engine
            .system_prompt
            .clone()
            .unwrap_or_else(|| PromptTemplate::default_system().to_string());
        EngineConfig::default()
            .with_system_prompt(system_prompt)
            .with_response_timeout(Duration::from_secs(self.engine.response_timeout_secs))
            .with_summary(self.engine.generate_summary)
    }
}
