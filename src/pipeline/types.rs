//! Shared types for the AI processing pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

// ── Mode ────────────────────────────────────────────────────────────

/// What to do with an email. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    Translate,
    Summarize,
    /// Translate, then summarize the translation.
    Both,
}

impl ProcessingMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Both => "both",
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translate" => Ok(Self::Translate),
            "summarize" => Ok(Self::Summarize),
            "both" => Ok(Self::Both),
            other => Err(ProcessError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Analysis ────────────────────────────────────────────────────────

/// Placeholder used for fields the model did not fill in.
pub const SEE_SUMMARY: &str = "See summary above";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Lenient read of a model-provided label; unknown → `Neutral`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "positive" | "bullish" => return Self::Positive,
            "negative" | "bearish" => return Self::Negative,
            "neutral" => return Self::Neutral,
            "mixed" => return Self::Mixed,
            _ => {}
        }

        // A negated label ("not negative", "no clear trend") says nothing definite.
        let negated = label
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| matches!(word, "not" | "no" | "neither" | "nor"));
        if negated {
            Self::Neutral
        } else if label.starts_with("mixed") {
            Self::Mixed
        } else if label.contains("negative") || label.contains("bearish") {
            Self::Negative
        } else if label.contains("positive") || label.contains("bullish") {
            Self::Positive
        } else {
            Self::Neutral
        }
    }
}

/// Fixed-shape summarization output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub key_insights: String,
    pub important_details: String,
    pub sentiment: Sentiment,
}

impl Analysis {
    /// Degraded analysis for free-text model output.
    pub fn plain(raw: &str) -> Self {
        Self {
            summary: raw.to_string(),
            key_insights: SEE_SUMMARY.to_string(),
            important_details: SEE_SUMMARY.to_string(),
            sentiment: Sentiment::Neutral,
        }
    }
}

/// Whether the analysis came from parsed structured output or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFormat {
    Structured,
    Plain,
}

// ── Results ─────────────────────────────────────────────────────────

/// A translation and the language pair it was made with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Successful output of one orchestration call, tagged by mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProcessingOutput {
    #[serde(rename_all = "camelCase")]
    Translate {
        translation: String,
        source_language: String,
        target_language: String,
    },
    #[serde(rename_all = "camelCase")]
    Summarize {
        analysis: Analysis,
        format: AnalysisFormat,
        language: String,
    },
    /// `analysis` is `None` when summarization of the translation failed.
    #[serde(rename_all = "camelCase")]
    Both {
        translation: String,
        source_language: String,
        target_language: String,
        analysis: Option<Analysis>,
    },
}

impl ProcessingOutput {
    pub fn mode(&self) -> ProcessingMode {
        match self {
            Self::Translate { .. } => ProcessingMode::Translate,
            Self::Summarize { .. } => ProcessingMode::Summarize,
            Self::Both { .. } => ProcessingMode::Both,
        }
    }

    pub fn translation(&self) -> Option<&str> {
        match self {
            Self::Translate { translation, .. } | Self::Both { translation, .. } => {
                Some(translation)
            }
            Self::Summarize { .. } => None,
        }
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Self::Summarize { analysis, .. } => Some(analysis),
            Self::Both { analysis, .. } => analysis.as_ref(),
            Self::Translate { .. } => None,
        }
    }
}

/// Result of one orchestration call. Never cached.
pub type ProcessingResult = Result<ProcessingOutput, ProcessError>;

/// Serializable envelope for consumers: a success flag plus either the
/// mode-tagged output or an error description.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingReport {
    pub success: bool,
    #[serde(flatten)]
    pub output: Option<ProcessingOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl From<&ProcessingResult> for ProcessingReport {
    fn from(result: &ProcessingResult) -> Self {
        match result {
            Ok(output) => Self {
                success: true,
                output: Some(output.clone()),
                error: None,
                error_kind: None,
            },
            Err(e) => Self {
                success: false,
                output: None,
                error: Some(e.to_string()),
                error_kind: Some(e.kind()),
            },
        }
    }
}

impl From<ProcessingResult> for ProcessingReport {
    fn from(result: ProcessingResult) -> Self {
        Self::from(&result)
    }
}
