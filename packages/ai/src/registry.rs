// ABOUTME: Provider registry mapping provider names to client constructors
// ABOUTME: Caches one client per model configuration name

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};
use uieasy_config::constants::{PROVIDER_DEEPSEEK, PROVIDER_OPENAI};
use uieasy_config::{Config, ModelConfig};

use crate::client::ModelClient;
use crate::error::{ProviderError, ProviderResult};
use crate::providers;

/// Builds a client for one model configuration
pub type ProviderConstructor =
    Arc<dyn Fn(&ModelConfig) -> ProviderResult<Arc<dyn ModelClient>> + Send + Sync>;

pub struct ProviderRegistry {
    constructors: BTreeMap<String, ProviderConstructor>,
    cache: Mutex<HashMap<String, Arc<dyn ModelClient>>>,
}

impl ProviderRegistry {
    /// Empty registry with no providers
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Registry with the built-in openai and deepseek providers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PROVIDER_OPENAI, Arc::new(providers::openai));
        registry.register(PROVIDER_DEEPSEEK, Arc::new(providers::deepseek));
        registry
    }

    /// Register (or replace) a provider. Names are case-insensitive.
    pub fn register(&mut self, name: &str, constructor: ProviderConstructor) {
        debug!("Registering model provider: {}", name);
        self.constructors.insert(name.to_lowercase(), constructor);
    }

    /// Registered provider names, sorted
    pub fn providers(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_lowercase())
    }

    /// Build a fresh client for a model configuration
    pub fn create(&self, config: &ModelConfig) -> ProviderResult<Arc<dyn ModelClient>> {
        let provider = config.provider.to_lowercase();
        let constructor = self
            .constructors
            .get(&provider)
            .ok_or_else(|| ProviderError::UnsupportedProvider(config.provider.clone()))?;
        let client = constructor(config)?;
        info!(
            "Created {} client for model config '{}' (model={})",
            provider,
            config.name,
            client.model()
        );
        Ok(client)
    }

    /// Client for a named model configuration, reusing a cached instance
    pub fn get(&self, config: &Config, name: &str) -> ProviderResult<Arc<dyn ModelClient>> {
        if let Some(client) = self.lock_cache().get(name) {
            return Ok(Arc::clone(client));
        }

        let model_config = config
            .model_config(name)
            .ok_or_else(|| ProviderError::UnknownModelConfig(name.to_string()))?;
        let client = self.create(model_config)?;

        self.lock_cache().insert(name.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// Drop all cached clients
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn ModelClient>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
