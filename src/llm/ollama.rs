//! Ollama HTTP client (`/api/generate`, `/api/tags`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::AssistConfig;
use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

const PROVIDER: &str = "ollama";

/// Longest slice of an error body carried into `LlmError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// A model installed on the Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Completion provider backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaProvider {
    /// Build a provider with an explicit request timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &AssistConfig) -> Result<Self, LlmError> {
        let provider = Self::new(&config.base_url, &config.model, config.request_timeout)?;
        info!("Using Ollama at {} (model: {})", provider.base_url, provider.model);
        Ok(provider)
    }

    /// Switch the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = check_status(response).await?;

        let tags: TagsResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: PROVIDER.into(),
                    reason: e.to_string(),
                })?;
        Ok(tags.models)
    }

    /// Verify the server is reachable. Returns the number of installed models.
    pub async fn check_connection(&self) -> Result<usize, LlmError> {
        match self.list_models().await {
            Ok(models) => {
                info!(models = models.len(), "Ollama connected");
                Ok(models.len())
            }
            Err(e) => {
                error!(error = %e, "Ollama connection failed");
                Err(e)
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.into(),
                timeout: self.timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.options.temperature,
                top_p: request.options.top_p,
                num_predict: request.options.max_tokens,
            },
        };

        debug!(
            model = %model,
            prompt_chars = request.prompt.chars().count(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = check_status(response).await?;

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| {
                if e.is_timeout() {
                    self.transport_error(e)
                } else {
                    LlmError::InvalidResponse {
                        provider: PROVIDER.into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        debug!(
            model = %model,
            response_chars = parsed.response.chars().count(),
            "Completion received"
        );

        Ok(CompletionResponse {
            content: parsed.response,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }
}

/// Map any non-2xx response to `LlmError::Status`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown").to_string()
    } else {
        body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
    };

    Err(LlmError::Status {
        provider: PROVIDER.into(),
        status: status.as_u16(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            OllamaProvider::new("http://localhost:11434/", "llama3.2", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.model_name(), "llama3.2");
    }

    #[test]
    fn with_model_switches_default() {
        let provider = OllamaProvider::new("http://x", "llama3.2", Duration::from_secs(5))
            .unwrap()
            .with_model("phi3:latest");
        assert_eq!(provider.model_name(), "phi3:latest");
    }

    #[test]
    fn generate_request_wire_format() {
        let body = GenerateRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                temperature: 0.3,
                top_p: 0.9,
                num_predict: 1000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1000);
    }

    #[test]
    fn tags_response_tolerates_missing_fields() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models": [{"name": "phi3:latest"}]}"#).unwrap();
        assert_eq!(tags.models[0].name, "phi3:latest");
        assert!(tags.models[0].size.is_none());

        let empty: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.models.is_empty());
    }
}
