// ABOUTME: Configuration for UI Easy
// ABOUTME: Model/module configuration types, config.json loading, and environment overrides

pub mod constants;
pub mod error;
mod loader;
pub mod types;

pub use error::{ConfigError, Result};
pub use types::{Config, ModelConfig, ModuleConfig};
