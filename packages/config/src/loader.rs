// ABOUTME: Loading, saving, environment overrides, and validation for Config
// ABOUTME: Reads config.json and fills provider API keys from the environment

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::constants::{
    DEEPSEEK_API_KEY, DEFAULT_CONFIG_FILE, DEFAULT_MODEL_CONFIG, DEFAULT_OPENAI_MODEL_ID,
    OPENAI_API_KEY, OPENAI_MODEL, PROVIDER_DEEPSEEK, PROVIDER_OPENAI, UIEASY_CONFIG,
    UIEASY_MODEL_CONFIG,
};
use crate::error::{ConfigError, Result};
use crate::types::{Config, ModelConfig, ModuleConfig};

impl Config {
    /// Resolve the config file path: explicit argument, then UIEASY_CONFIG, then ./config.json
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var(UIEASY_CONFIG).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a JSON file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json_str(&content)?;
        info!(
            "Loaded configuration from {} ({} models, {} modules)",
            path.display(),
            config.models.len(),
            config.modules.len()
        );
        Ok(config)
    }

    /// Load configuration, falling back to an empty configuration when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => {
                warn!(
                    "Configuration file {} not found, using environment only",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write the configuration back as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// Empty API keys are filled from the provider's key variable. When no
    /// `default` model exists and OPENAI_API_KEY is set, an OpenAI default is created.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for model in self.models.values_mut() {
            if model.has_api_key() {
                continue;
            }
            let key_var = match model.provider.to_lowercase().as_str() {
                PROVIDER_OPENAI => OPENAI_API_KEY,
                PROVIDER_DEEPSEEK => DEEPSEEK_API_KEY,
                _ => continue,
            };
            if let Some(key) = non_empty(key_var) {
                debug!("Using {} for model config '{}'", key_var, model.name);
                model.api_key = key;
            }
        }

        if !self.models.contains_key(DEFAULT_MODEL_CONFIG) {
            if let Some(key) = non_empty(OPENAI_API_KEY) {
                let mut model = ModelConfig::new(DEFAULT_MODEL_CONFIG, PROVIDER_OPENAI);
                model.api_key = key;
                model.model_id =
                    non_empty(OPENAI_MODEL).unwrap_or_else(|| DEFAULT_OPENAI_MODEL_ID.to_string());
                info!(
                    "Created default OpenAI model config from environment: model={}",
                    model.model_id
                );
                self.models.insert(DEFAULT_MODEL_CONFIG.to_string(), model);
            }
        }

        if let Some(selected) = non_empty(UIEASY_MODEL_CONFIG) {
            for module in self.modules.values_mut() {
                module.model_config = selected.clone();
            }
            self.app_settings.insert(
                UIEASY_MODEL_CONFIG.to_lowercase(),
                serde_json::Value::String(selected),
            );
        }
    }

    /// Check value ranges and cross references
    pub fn validate(&self) -> Result<()> {
        for (key, model) in &self.models {
            if model.provider.trim().is_empty() {
                return Err(invalid(format!("models.{key}.provider"), "must not be empty"));
            }
            if !(0.0..=2.0).contains(&model.temperature) {
                return Err(invalid(
                    format!("models.{key}.temperature"),
                    format!("{} is outside 0.0-2.0", model.temperature),
                ));
            }
            if model.max_tokens == 0 {
                return Err(invalid(format!("models.{key}.max_tokens"), "must be positive"));
            }
            if model.timeout == 0 {
                return Err(invalid(format!("models.{key}.timeout"), "must be positive"));
            }
        }

        for (key, module) in &self.modules {
            if module.enabled && !self.models.contains_key(&module.model_config) {
                return Err(invalid(
                    format!("modules.{key}.model_config"),
                    format!("references unknown model config '{}'", module.model_config),
                ));
            }
        }

        Ok(())
    }

    pub fn model_config(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Module settings, or defaults when the module is not configured
    pub fn module_config(&self, name: &str) -> ModuleConfig {
        let mut module = self.modules.get(name).cloned().unwrap_or_default();
        if !self.modules.contains_key(name) {
            if let Some(selected) = self
                .app_settings
                .get(&UIEASY_MODEL_CONFIG.to_lowercase())
                .and_then(|v| v.as_str())
            {
                module.model_config = selected.to_string();
            }
        }
        module
    }

    /// The model configuration a module should use
    pub fn model_for_module(&self, module: &str) -> Result<&ModelConfig> {
        let module_config = self.module_config(module);
        self.model_config(&module_config.model_config)
            .ok_or(ConfigError::ModelNotFound(module_config.model_config))
    }

    pub fn app_setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.app_settings.get(key)
    }

    pub fn set_model_config(&mut self, config: ModelConfig) {
        self.models.insert(config.name.clone(), config);
    }

    pub fn set_module_config(&mut self, name: impl Into<String>, config: ModuleConfig) {
        self.modules.insert(name.into(), config);
    }
}

fn invalid(field: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_openai_key_creates_default_model() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup(&[(OPENAI_API_KEY, "sk-test")]));

        let model = config.model_config(DEFAULT_MODEL_CONFIG).unwrap();
        assert_eq!(model.provider, PROVIDER_OPENAI);
        assert_eq!(model.api_key, "sk-test");
        assert_eq!(model.model_id, DEFAULT_OPENAI_MODEL_ID);
    }

    #[test]
    fn test_existing_key_is_not_overwritten() {
        let mut config = Config::default();
        let mut model = ModelConfig::new("default", "deepseek");
        model.api_key = "from-file".to_string();
        config.set_model_config(model);

        config.apply_overrides_from(lookup(&[(DEEPSEEK_API_KEY, "from-env")]));

        assert_eq!(config.model_config("default").unwrap().api_key, "from-file");
    }

    #[test]
    fn test_empty_key_filled_by_provider_variable() {
        let mut config = Config::default();
        config.set_model_config(ModelConfig::new("ds", "DeepSeek"));

        config.apply_overrides_from(lookup(&[(DEEPSEEK_API_KEY, "ds-key")]));

        assert_eq!(config.model_config("ds").unwrap().api_key, "ds-key");
    }

    #[test]
    fn test_model_selection_override_applies_to_unconfigured_modules() {
        let mut config = Config::default();
        config.set_model_config(ModelConfig::new("fast", "openai"));

        config.apply_overrides_from(lookup(&[(UIEASY_MODEL_CONFIG, "fast")]));

        let model = config.model_for_module("requirement_analyzer").unwrap();
        assert_eq!(model.name, "fast");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut model = ModelConfig::new("default", "openai");
        model.api_key = "sk-secret".to_string();
        let rendered = format!("{:?}", model);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
