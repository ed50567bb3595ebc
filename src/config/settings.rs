// Configuration structs

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::provider::{ProviderCredentials, ProviderSelection};

/// Score thresholds shared by the loop controller and the judge prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Overall score must be >= this to stop
    #[serde(default = "default_overall")]
    pub overall: f32,
    /// Every dimension must be >= this to stop
    #[serde(default = "default_dimension")]
    pub dimension: f32,
}

fn default_overall() -> f32 {
    OVERALL_THRESHOLD
}

fn default_dimension() -> f32 {
    DIMENSION_THRESHOLD
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            overall: OVERALL_THRESHOLD,
            dimension: DIMENSION_THRESHOLD,
        }
    }
}

/// Limits enforced by the local safety gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Target band quoted to the model; the hard limits above add tolerance.
    #[serde(default = "default_target_min")]
    pub target_min_words: usize,
    #[serde(default = "default_target_max")]
    pub target_max_words: usize,
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,
}

fn default_min_words() -> usize {
    MIN_WORDS
}

fn default_max_words() -> usize {
    MAX_WORDS
}

fn default_target_min() -> usize {
    TARGET_WORDS_MIN
}

fn default_target_max() -> usize {
    TARGET_WORDS_MAX
}

fn default_banned_terms() -> Vec<String> {
    owned_list(BANNED_TERMS)
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_words: MIN_WORDS,
            max_words: MAX_WORDS,
            target_min_words: TARGET_WORDS_MIN,
            target_max_words: TARGET_WORDS_MAX,
            banned_terms: default_banned_terms(),
        }
    }
}

impl SafetyLimits {
    /// Target band formatted for prompts, e.g. "250–400".
    pub fn target_band(&self) -> String {
        format!("{}–{}", self.target_min_words, self.target_max_words)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend selection (auto / openai / gemini)
    #[serde(default)]
    pub provider: ProviderSelection,

    #[serde(default)]
    pub openai: ProviderCredentials,

    #[serde(default)]
    pub gemini: ProviderCredentials,

    /// HTTP timeout for provider requests
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default iteration cap for a run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub thresholds: QualityThresholds,

    #[serde(default)]
    pub safety: SafetyLimits,
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderSelection::Auto,
            openai: ProviderCredentials::default(),
            gemini: ProviderCredentials::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            thresholds: QualityThresholds::default(),
            safety: SafetyLimits::default(),
        }
    }
}

impl Config {
    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_iterations == 0 {
            anyhow::bail!("max_iterations must be greater than 0 (recommended: 2-3)");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        for (label, value) in [
            ("thresholds.overall", self.thresholds.overall),
            ("thresholds.dimension", self.thresholds.dimension),
        ] {
            if !(0.0..=10.0).contains(&value) {
                anyhow::bail!("{} ({}) must be between 0 and 10", label, value);
            }
        }

        let s = &self.safety;
        if s.min_words > s.max_words {
            anyhow::bail!(
                "safety.min_words ({}) is greater than safety.max_words ({})",
                s.min_words,
                s.max_words
            );
        }
        if s.target_min_words > s.target_max_words {
            anyhow::bail!(
                "safety.target_min_words ({}) is greater than safety.target_max_words ({})",
                s.target_min_words,
                s.target_max_words
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.thresholds.overall, 8.0);
        assert_eq!(config.thresholds.dimension, 7.0);
        assert_eq!(config.safety.min_words, 200);
        assert_eq!(config.safety.max_words, 480);
        assert_eq!(config.safety.target_band(), "250–400");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = Config {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_word_band_rejected() {
        let mut config = Config::default();
        config.safety.min_words = 500;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_words"));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = Config::default();
        config.thresholds.overall = 11.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            provider = "gemini"
            max_iterations = 2

            [thresholds]
            overall = 8.5

            [gemini]
            api_key = "g-key"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider, ProviderSelection::Gemini);
        assert_eq!(config.max_iterations, 2);
        assert_eq!(config.thresholds.overall, 8.5);
        assert_eq!(config.thresholds.dimension, 7.0);
        assert_eq!(config.gemini.key(), Some("g-key"));
        assert_eq!(config.safety.banned_terms.len(), BANNED_TERMS.len());
    }
}
