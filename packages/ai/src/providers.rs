// ABOUTME: Built-in provider constructors for OpenAI and DeepSeek
// ABOUTME: Both speak the chat completions protocol and differ in base URL and image support

use std::sync::Arc;

use uieasy_config::ModelConfig;

use crate::client::ModelClient;
use crate::error::ProviderResult;
use crate::service::ChatCompletionsClient;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// OpenAI chat completions with image input
pub fn openai(config: &ModelConfig) -> ProviderResult<Arc<dyn ModelClient>> {
    let client = ChatCompletionsClient::from_config(config, OPENAI_BASE_URL)?;
    Ok(Arc::new(client))
}

/// DeepSeek chat completions, text only
pub fn deepseek(config: &ModelConfig) -> ProviderResult<Arc<dyn ModelClient>> {
    let client =
        ChatCompletionsClient::from_config(config, DEEPSEEK_BASE_URL)?.without_image_support();
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> ModelConfig {
        let mut config = ModelConfig::new("default", provider);
        config.api_key = "key".to_string();
        config.model_id = "m".to_string();
        config
    }

    #[test]
    fn test_deepseek_rejects_images() {
        let client = deepseek(&config("deepseek")).unwrap();
        assert!(!client.supports_images());
        assert_eq!(client.provider(), "deepseek");
    }

    #[test]
    fn test_openai_accepts_images() {
        let client = openai(&config("openai")).unwrap();
        assert!(client.supports_images());
        assert_eq!(client.model(), "m");
    }
}
