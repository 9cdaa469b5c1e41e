// ABOUTME: Error types for model provider calls
// ABOUTME: Distinguishes network, auth, rate-limit, and response-shape failures

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by provider{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("No API key configured for model '{0}'")]
    NoApiKey(String),

    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("Model configuration '{0}' not found")]
    UnknownModelConfig(String),

    #[error("Provider {0} does not accept image input")]
    ImageNotSupported(String),

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Errors worth retrying at a higher level (the client itself never retries)
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::RateLimited { .. } => true,
            ProviderError::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after
        .map(|secs| format!(" (retry after {}s)", secs))
        .unwrap_or_default()
}

pub type ProviderResult<T> = Result<T, ProviderError>;
