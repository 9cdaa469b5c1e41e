// ABOUTME: Error types for the analyzer package
// ABOUTME: Wraps provider, prompt, and serialization failures raised during analysis

use thiserror::Error;
use uieasy_ai::ProviderError;
use uieasy_prompts::PromptError;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Module disabled: {0}")]
    ModuleDisabled(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
