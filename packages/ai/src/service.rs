// ABOUTME: OpenAI-compatible chat completions client used by the OpenAI and DeepSeek providers
// ABOUTME: Handles API requests, image attachments, error classification, and SSE streaming

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uieasy_config::ModelConfig;

use crate::client::ModelClient;
use crate::error::{ProviderError, ProviderResult};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Client for `POST {base_url}/chat/completions`
pub struct ChatCompletionsClient {
    client: Client,
    provider: String,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    supports_images: bool,
}

impl ChatCompletionsClient {
    /// Build a client from a model configuration
    ///
    /// `default_base_url` is used when the configuration does not set `base_url`.
    pub fn from_config(config: &ModelConfig, default_base_url: &str) -> ProviderResult<Self> {
        if !config.has_api_key() {
            return Err(ProviderError::NoApiKey(config.name.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        let base_url = config
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(default_base_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider.to_lowercase(),
            api_key: config.api_key.clone(),
            base_url,
            model: config.model_id.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            supports_images: true,
        })
    }

    /// Reject image input instead of forwarding it
    pub fn without_image_support(mut self) -> Self {
        self.supports_images = false;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
        stream: bool,
    ) -> ProviderResult<ChatRequest> {
        let content = match image {
            Some(bytes) => {
                if !self.supports_images {
                    return Err(ProviderError::ImageNotSupported(self.provider.clone()));
                }
                serde_json::json!([
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_data_url(bytes) } }
                ])
            }
            None => serde_json::Value::String(prompt.to_string()),
        };

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: stream.then_some(true),
        })
    }

    async fn post(&self, request: &ChatRequest) -> ProviderResult<Response> {
        info!(
            "Making {} chat completion request: model={}, image={}, stream={}",
            self.provider,
            request.model,
            matches!(request.messages.first().map(|m| &m.content), Some(serde_json::Value::Array(_))),
            request.stream.unwrap_or(false)
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("{} request timed out", self.provider);
                    ProviderError::Network(format!("Request to {} timed out", self.provider))
                } else if e.is_connect() {
                    error!("Failed to connect to {}: {}", self.provider, e);
                    ProviderError::Network(format!(
                        "Connection failed: {}. Please check your internet connection.",
                        e
                    ))
                } else {
                    error!("{} request failed: {}", self.provider, e);
                    ProviderError::RequestFailed(e)
                }
            })?;

        debug!("Received response from {}: status={}", self.provider, response.status());

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_failure(&self.provider, response).await)
        }
    }
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports_images(&self) -> bool {
        self.supports_images
    }

    async fn send(&self, prompt: &str, image: Option<&[u8]>) -> ProviderResult<String> {
        let request = self.build_request(prompt, image, false)?;
        let response = self.post(&request).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &body.usage {
            info!(
                "{} usage: prompt_tokens={}, completion_tokens={}, total={}",
                self.provider,
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens()
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::InvalidResponse)
    }

    async fn send_stream(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> ProviderResult<BoxStream<'static, ProviderResult<String>>> {
        let request = self.build_request(prompt, image, true)?;
        let response = self.post(&request).await?;

        // Create a stream from the response bytes
        let stream = async_stream::stream! {
            let mut byte_stream = response.bytes_stream();
            let mut lines = SseLineBuffer::default();

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        for line in lines.push(&bytes) {
                            let Some(data) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let data = data.trim();
                            if data == "[DONE]" {
                                return;
                            }
                            if let Ok(event_json) = serde_json::from_str::<serde_json::Value>(data) {
                                if let Some(text) = event_json["choices"][0]["delta"]["content"].as_str() {
                                    if !text.is_empty() {
                                        yield Ok(text.to_string());
                                    }
                                } else if let Some(message) = event_json["error"]["message"].as_str() {
                                    yield Err(ProviderError::Api { status: 200, message: message.to_string() });
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ProviderError::RequestFailed(e));
                        return;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

/// Splits an SSE byte stream into lines, decoding only complete lines
///
/// A multibyte UTF-8 character split across network chunks stays intact.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Append a chunk and return every line it completes, trimmed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(line_end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=line_end).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }
}

/// Map a non-success HTTP response to a provider error kind
async fn classify_failure(provider: &str, response: Response) -> ProviderError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!("{} API error: {} - {}", provider, status, error_text);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth(format!("{} rejected the API key ({})", provider, status))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        _ => ProviderError::Api {
            status: status.as_u16(),
            message: error_text,
        },
    }
}

/// Encode image bytes as a data URL, sniffing the MIME type from magic bytes
pub fn image_data_url(bytes: &[u8]) -> String {
    let mime = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    };
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
