// ABOUTME: Configuration data structures for models, modules, and app settings
// ABOUTME: Mirrors the on-disk config.json layout with serde defaults for optional fields

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL_CONFIG, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};

/// Connection and sampling parameters for one named model configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Provider key registered with the provider registry (openai, deepseek, ...)
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model_id: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            api_key: String::new(),
            base_url: None,
            model_id: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// API keys never reach log output
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<unset>" })
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Per-module settings (which model to use, prompt overrides)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_model_config_name")]
    pub model_config: String,
    /// Prompt id -> replacement template
    #[serde(default)]
    pub custom_prompts: BTreeMap<String, String>,
    /// Run the per-requirement component/layout/style/interaction passes
    #[serde(default = "default_true")]
    pub detail_passes: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_config: DEFAULT_MODEL_CONFIG.to_string(),
            custom_prompts: BTreeMap::new(),
            detail_passes: true,
        }
    }
}

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
    #[serde(default)]
    pub app_settings: BTreeMap<String, serde_json::Value>,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_model_config_name() -> String {
    DEFAULT_MODEL_CONFIG.to_string()
}
