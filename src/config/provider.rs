// Provider selection and per-backend credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which text-generation backend to use.
///
/// `Auto` prefers OpenAI when an OpenAI key is present and falls back to
/// Gemini otherwise. Serializes lowercase, e.g.:
/// ```toml
/// provider = "gemini"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSelection {
    #[default]
    Auto,
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
}

impl ProviderSelection {
    /// Short tag used in config files and the environment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "openai" => Ok(Self::OpenAI),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!(
                "Unknown provider '{}' (expected auto, openai or gemini)",
                other
            )),
        }
    }
}

/// Credentials and overrides for one backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Custom endpoint (proxies, test servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    /// The API key, if set and non-blank.
    pub fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
