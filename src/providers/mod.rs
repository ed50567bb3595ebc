// Multi-provider LLM support
//
// This module provides an abstraction layer over the text-generation
// backends (OpenAI, Gemini) so the story pipeline depends only on a
// request/response shape and never on provider details.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;

// Provider implementations
pub mod gemini;
pub mod openai;

// Provider factory
pub mod factory;

// Re-export commonly used types
pub use factory::{create_provider, resolve_selection};
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use types::{Message, ProviderRequest, ProviderResponse};

/// Trait for LLM providers
///
/// All backends implement this trait, providing a unified blocking
/// request/response interface. Streaming is not part of the contract.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a message and get a complete response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Get the provider name (e.g., "openai", "gemini")
    fn name(&self) -> &str;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;
}
