//! Completion capability the pipeline depends on.

use async_trait::async_trait;

use crate::error::LlmError;

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    /// Low temperature keeps translations consistent between runs.
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 1000,
        }
    }
}

/// A single prompt → text request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    pub options: GenerationOptions,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Completion output.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    /// Model that actually served the request.
    pub model: String,
}

/// A language-model endpoint that turns a prompt into free text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Default model identifier.
    fn model_name(&self) -> &str;

    /// One request/response exchange. No retries.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favor_determinism() {
        let options = GenerationOptions::default();
        assert!(options.temperature <= 0.3);
        assert_eq!(options.max_tokens, 1000);
    }

    #[test]
    fn builder_overrides() {
        let request = CompletionRequest::new("hi")
            .with_model("phi3:latest")
            .with_options(GenerationOptions {
                temperature: 0.1,
                max_tokens: 64,
                ..GenerationOptions::default()
            });
        assert_eq!(request.model.as_deref(), Some("phi3:latest"));
        assert!((request.options.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(request.options.max_tokens, 64);
        assert!((request.options.top_p - 0.9).abs() < f32::EPSILON);
    }
}
