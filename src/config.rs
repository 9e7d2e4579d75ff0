//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model used for completions.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Runtime configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Base URL of the Ollama-compatible completion service.
    pub base_url: String,
    /// Default model identifier.
    pub model: String,
    /// Bound on a single completion request.
    pub request_timeout: Duration,
    /// Source language used when the sender gives no better hint.
    pub source_language: String,
    /// Target language for translations.
    pub target_language: String,
    /// Max concurrent message fetches in a batch.
    pub batch_concurrency: usize,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
            source_language: "Dutch".to_string(),
            target_language: "English".to_string(),
            batch_concurrency: 4,
        }
    }
}

impl AssistConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("OLLAMA_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);

        let model = lookup("OLLAMA_MODEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.model);

        let request_timeout = match lookup("OLLAMA_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("OLLAMA_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let source_language = lookup("MAIL_LENS_SOURCE_LANGUAGE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.source_language);

        let target_language = lookup("MAIL_LENS_TARGET_LANGUAGE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.target_language);

        let batch_concurrency = match lookup("MAIL_LENS_BATCH_CONCURRENCY") {
            Some(raw) => parse_positive("MAIL_LENS_BATCH_CONCURRENCY", &raw)? as usize,
            None => defaults.batch_concurrency,
        };

        Ok(Self {
            base_url,
            model,
            request_timeout,
            source_language,
            target_language,
            batch_concurrency,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let n: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })?;
    if n == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1".into(),
        });
    }
    Ok(n)
}
