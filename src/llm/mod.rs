//! LLM integration.
//!
//! The pipeline only sees the `LlmProvider` trait; `OllamaProvider` is the
//! HTTP implementation for a local Ollama server.

pub mod ollama;
pub mod provider;

pub use ollama::{ModelInfo, OllamaProvider};
pub use provider::{
    CompletionRequest, CompletionResponse, GenerationOptions, LlmProvider,
};
