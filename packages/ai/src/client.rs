// ABOUTME: Capability trait every model provider implements
// ABOUTME: send(prompt, image?) -> text, with a default single-chunk streaming fallback

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::ProviderResult;

/// A model backend able to answer a text prompt, optionally with an attached image
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Registry key of the provider (openai, deepseek, ...)
    fn provider(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Whether `send` accepts image bytes
    fn supports_images(&self) -> bool {
        true
    }

    /// Send a prompt and return the raw response text
    async fn send(&self, prompt: &str, image: Option<&[u8]>) -> ProviderResult<String>;

    /// Stream the response as text chunks
    ///
    /// Providers without streaming support yield the whole response as one chunk.
    async fn send_stream(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> ProviderResult<BoxStream<'static, ProviderResult<String>>> {
        let text = self.send(prompt, image).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}
