// Model invocation helpers shared by the brief builder, storyteller and judge

use serde::de::DeserializeOwned;

use super::error::StoryError;
use super::json::{extract_json, JsonExtractError};
use super::pipeline::Stage;
use super::prompts::STRICT_JSON_SUFFIX;
use crate::config::Config;
use crate::providers::{LlmProvider, ProviderRequest};

/// What a stage needs to talk to the model.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub provider: &'a dyn LlmProvider,
    pub config: &'a Config,
}

impl<'a> StageContext<'a> {
    pub fn new(provider: &'a dyn LlmProvider, config: &'a Config) -> Self {
        Self { provider, config }
    }

    /// One (system, user) call at the given temperature; returns the reply text.
    pub async fn complete(
        &self,
        stage: Stage,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, StoryError> {
        let request = ProviderRequest::prompt(system, user)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(temperature);

        tracing::debug!(
            stage = %stage,
            provider = self.provider.name(),
            temperature,
            "Calling model"
        );

        let response = self
            .provider
            .send_message(&request)
            .await
            .map_err(|e| StoryError::provider(stage, e))?;

        let text = response.text().to_string();
        tracing::debug!(stage = %stage, chars = text.len(), "Model replied");
        Ok(text)
    }

    /// Call the model and parse a strict-JSON reply into `T`, then shape it
    /// with `normalize`.
    ///
    /// A reply that fails either step is retried exactly once with a
    /// stricter instruction appended; a second failure is fatal.
    pub async fn complete_json<T, R, F>(
        &self,
        stage: Stage,
        system: &str,
        user: &str,
        temperature: f32,
        normalize: F,
    ) -> Result<R, StoryError>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Result<R, String>,
    {
        let parse = |reply: &str| -> Result<R, String> {
            let raw = extract_json::<T>(reply).map_err(|e: JsonExtractError| e.to_string())?;
            normalize(raw)
        };

        let reply = self.complete(stage, system, user, temperature).await?;
        match parse(&reply) {
            Ok(parsed) => return Ok(parsed),
            Err(reason) => {
                tracing::warn!(stage = %stage, %reason, "Malformed JSON reply, retrying once");
            }
        }

        let strict = format!("{}{}", user, STRICT_JSON_SUFFIX);
        let reply = self.complete(stage, system, &strict, temperature).await?;
        parse(&reply).map_err(|reason| StoryError::MalformedOutput { stage, reason })
    }
}

