// Story pipeline errors
//
// Every variant is fatal to the current run; the only retry in the pipeline
// is the single strict-JSON retry inside the brief builder and the judge.

use super::pipeline::Stage;

/// Errors that abort a story run.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// A stage ran without the state it needs (e.g. judging with no story)
    #[error("{stage} precondition failed: {reason}")]
    Precondition { stage: Stage, reason: String },

    /// The model's reply could not be parsed into the required schema,
    /// even after the strict-JSON retry
    #[error("{stage} returned malformed output after retry: {reason}")]
    MalformedOutput { stage: Stage, reason: String },

    /// No usable text-generation backend (missing credentials, bad setup)
    #[error("No text-generation provider available: {0}")]
    Unavailable(String),

    /// Transport or API failure while talking to the provider
    #[error("{stage} provider request failed: {message}")]
    Provider { stage: Stage, message: String },
}

impl StoryError {
    pub(crate) fn precondition(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Precondition {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn provider(stage: Stage, err: anyhow::Error) -> Self {
        Self::Provider {
            stage,
            message: format!("{:#}", err),
        }
    }

    /// Stage the error originated from, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Precondition { stage, .. }
            | Self::MalformedOutput { stage, .. }
            | Self::Provider { stage, .. } => Some(*stage),
            Self::Unavailable(_) => None,
        }
    }
}
