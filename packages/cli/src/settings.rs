// ABOUTME: Configuration resolution for the command-line tool
// ABOUTME: Loads config.json, applies environment overrides and the --model selection, then validates

use std::path::Path;

use tracing::debug;
use uieasy_config::constants::{IMAGE_ANALYZER_MODULE, REQUIREMENT_ANALYZER_MODULE};
use uieasy_config::Config;

use crate::error::Result;

/// Load the effective configuration for a command
///
/// `model` selects the model configuration used by the requirement and image
/// analyzers, overriding both the file and UIEASY_MODEL_CONFIG.
pub fn load_config(path: Option<&Path>, model: Option<&str>) -> Result<Config> {
    let path = Config::resolve_path(path);
    let mut config = Config::load_or_default(&path)?;
    config.apply_env_overrides();

    if let Some(model) = model {
        select_model(&mut config, model);
    }

    config.validate()?;
    Ok(config)
}

/// Point both analyzer modules at a named model configuration
pub fn select_model(config: &mut Config, model: &str) {
    for name in [REQUIREMENT_ANALYZER_MODULE, IMAGE_ANALYZER_MODULE] {
        debug!("Selecting model config '{}' for {}", model, name);
        let mut module = config.module_config(name);
        module.model_config = model.to_string();
        config.set_module_config(name, module);
    }
}
