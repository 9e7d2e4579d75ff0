//! AI processing pipeline.
//!
//! Every normalized email flows through:
//! 1. `content::prepare_content()`: pick a body, strip HTML, cap the length
//! 2. `prompts`: build the translation or analysis prompt
//! 3. `Orchestrator`: one completion call per step through `LlmProvider`
//! 4. `analysis::parse_analysis()`: structured JSON, or the plain fallback
//!
//! Results are returned to the caller and never stored.

pub mod analysis;
pub mod content;
pub mod language;
pub mod orchestrator;
pub mod prompts;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::{
    Analysis, AnalysisFormat, ProcessingMode, ProcessingOutput, ProcessingReport,
    ProcessingResult, Sentiment, Translation,
};
