// ABOUTME: Environment variable and default name constants
// ABOUTME: Centralized definitions of all configuration keys used across UI Easy

// Configuration file location
pub const UIEASY_CONFIG: &str = "UIEASY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

// Model selection
pub const UIEASY_MODEL_CONFIG: &str = "UIEASY_MODEL_CONFIG";
pub const DEFAULT_MODEL_CONFIG: &str = "default";

// Provider API keys
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";

// Provider names
pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_DEEPSEEK: &str = "deepseek";

// Module names
pub const REQUIREMENT_ANALYZER_MODULE: &str = "requirement_analyzer";
pub const IMAGE_ANALYZER_MODULE: &str = "image_analyzer";

// Model defaults
pub const DEFAULT_OPENAI_MODEL_ID: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
