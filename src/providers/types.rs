// Unified request/response types for multi-provider LLM support
//
// These types abstract over provider-specific formats (OpenAI, Gemini)
// so the story stages only ever see a system instruction, a user message,
// and free text coming back.

use serde::{Deserialize, Serialize};

use crate::config::constants::DEFAULT_MAX_TOKENS;

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Unified request format for all LLM providers
///
/// Each provider implementation transforms this into its own API format.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    /// Conversation messages
    pub messages: Vec<Message>,

    /// Model name (empty = provider default)
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// System instruction (sent as a `system` message for OpenAI,
    /// as `systemInstruction` for Gemini)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Temperature (0.0 to 1.0, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    /// Create a new request from messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: String::new(), // Will be set by provider
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            temperature: None,
        }
    }

    /// The (system instruction, user message) pair every story stage sends.
    pub fn prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(vec![Message::user(user)]).with_system(system)
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set temperature, clamped to [0, 1]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// Unified response format from all LLM providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Response ID (provider-specific)
    pub id: String,

    /// Model that generated the response
    pub model: String,

    /// Generated text
    pub content: String,

    /// Stop reason ("stop", "length", "STOP", ...)
    pub stop_reason: Option<String>,

    /// Provider name ("openai", "gemini")
    pub provider: String,
}

impl ProviderResponse {
    /// Generated text
    pub fn text(&self) -> &str {
        &self.content
    }
}
