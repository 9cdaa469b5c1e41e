// ABOUTME: Model provider integration for requirement analysis
// ABOUTME: Client trait, OpenAI-compatible HTTP client, and provider registry

pub mod client;
pub mod error;
pub mod providers;
pub mod registry;
pub mod service;

pub use client::ModelClient;
pub use error::{ProviderError, ProviderResult};
pub use registry::{ProviderConstructor, ProviderRegistry};
pub use service::{ChatCompletionsClient, Usage};
