//! Error types for mail-lens.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {reason}")]
    Status {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors scoped to a single message part during normalization.
///
/// These never abort normalization of the whole message: the failing
/// part is treated as absent.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Failed to decode {mime_type} part: {reason}")]
    DecodeFailure { mime_type: String, reason: String },
}

/// Orchestration errors returned as the failed side of a processing result.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("No readable content found in email")]
    EmptyContent,

    #[error("Unknown processing mode: {0}")]
    UnknownMode(String),

    #[error("Completion endpoint failed: {0}")]
    EndpointFailure(#[from] LlmError),
}

impl ProcessError {
    /// Stable machine-readable label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyContent => "empty_content",
            Self::UnknownMode(_) => "unknown_mode",
            Self::EndpointFailure(_) => "endpoint_failure",
        }
    }
}

/// Raw-message source errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Message {id} not found")]
    NotFound { id: String },

    #[error("Failed to parse message {id}: {reason}")]
    Parse { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
