// Configuration loader
// Built-in defaults, then ~/.bedtime/config.toml, then .env + environment

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::provider::ProviderSelection;
use super::settings::Config;

/// Load configuration from the default config file and the environment
pub fn load_config() -> Result<Config> {
    // A missing .env is normal; only the process environment is used then
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let path = default_config_path();
    load_config_from(path.as_deref(), |key| std::env::var(key).ok())
}

/// Location of the user config file (`~/.bedtime/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bedtime").join("config.toml"))
}

/// Load configuration from an explicit file (if it exists) and an
/// environment lookup, then validate.
pub fn load_config_from<F>(path: Option<&Path>, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) if p.exists() => read_config_file(p)?,
        _ => Config::default(),
    };

    apply_env_overrides(&mut config, env)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Environment variables win over file values.
fn apply_env_overrides<F>(config: &mut Config, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(provider) = non_empty("STORY_LLM_PROVIDER") {
        config.provider = provider
            .parse::<ProviderSelection>()
            .map_err(anyhow::Error::msg)
            .context("Invalid STORY_LLM_PROVIDER")?;
    }
    if let Some(key) = non_empty("OPENAI_API_KEY") {
        config.openai.api_key = Some(key);
    }
    if let Some(model) = non_empty("OPENAI_MODEL") {
        config.openai.model = Some(model);
    }
    if let Some(key) = non_empty("GOOGLE_API_KEY") {
        config.gemini.api_key = Some(key);
    }
    if let Some(model) = non_empty("GEMINI_MODEL") {
        config.gemini.model = Some(model);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_config_from(Some(Path::new("/nonexistent/bedtime.toml")), env_from(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = load_config_from(
            None,
            env_from(&[
                ("STORY_LLM_PROVIDER", "Gemini"),
                ("GOOGLE_API_KEY", "g-123"),
                ("GEMINI_MODEL", "gemini-2.0-flash"),
                ("OPENAI_API_KEY", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.provider, ProviderSelection::Gemini);
        assert_eq!(config.gemini.key(), Some("g-123"));
        assert_eq!(config.gemini.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(config.openai.key().is_none());
    }

    #[test]
    fn test_invalid_provider_env_is_error() {
        let result = load_config_from(None, env_from(&[("STORY_LLM_PROVIDER", "bard")]));
        assert!(result.is_err());
    }
}
