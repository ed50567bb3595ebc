// Provider factory
//
// Resolves the configured selection against available credentials once,
// before a run starts, and builds the matching backend.

use std::sync::Arc;
use std::time::Duration;

use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::LlmProvider;
use crate::config::{Config, ProviderSelection};
use crate::story::StoryError;

/// Resolve `Auto` into a concrete backend.
///
/// Auto prefers OpenAI, then Gemini. An explicit selection requires its own
/// key. Never returns `Auto`.
pub fn resolve_selection(config: &Config) -> Result<ProviderSelection, StoryError> {
    let has_openai = config.openai.key().is_some();
    let has_gemini = config.gemini.key().is_some();

    match config.provider {
        ProviderSelection::OpenAI if has_openai => Ok(ProviderSelection::OpenAI),
        ProviderSelection::OpenAI => Err(StoryError::Unavailable(
            "OPENAI_API_KEY not set but the OpenAI provider was requested".to_string(),
        )),
        ProviderSelection::Gemini if has_gemini => Ok(ProviderSelection::Gemini),
        ProviderSelection::Gemini => Err(StoryError::Unavailable(
            "GOOGLE_API_KEY not set but the Gemini provider was requested".to_string(),
        )),
        ProviderSelection::Auto if has_openai => Ok(ProviderSelection::OpenAI),
        ProviderSelection::Auto if has_gemini => Ok(ProviderSelection::Gemini),
        ProviderSelection::Auto => Err(StoryError::Unavailable(
            "No API key found. Set OPENAI_API_KEY or GOOGLE_API_KEY \
             (and optionally STORY_LLM_PROVIDER)"
                .to_string(),
        )),
    }
}

/// Create the text-generation backend described by `config`.
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, StoryError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let unavailable = |e: anyhow::Error| StoryError::Unavailable(format!("{:#}", e));

    let provider: Arc<dyn LlmProvider> = match resolve_selection(config)? {
        ProviderSelection::OpenAI => {
            let creds = &config.openai;
            let key = creds.key().unwrap_or_default().to_string();
            let mut provider = OpenAIProvider::with_timeout(key, timeout).map_err(unavailable)?;
            if let Some(model) = &creds.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(url) = &creds.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }
        ProviderSelection::Gemini | ProviderSelection::Auto => {
            let creds = &config.gemini;
            let key = creds.key().unwrap_or_default().to_string();
            let mut provider = GeminiProvider::with_timeout(key, timeout).map_err(unavailable)?;
            if let Some(model) = &creds.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(url) = &creds.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }
    };

    tracing::info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Text-generation provider selected"
    );

    Ok(provider)
}
