//! AI orchestrator: runs a normalized email through translation and/or
//! analysis.
//!
//! Flow:
//! 1. Content preparation (select → sanitize → truncate), shared by all modes
//! 2. One completion call (`translate`, `summarize`) or two chained calls (`both`)
//! 3. Result assembly
//!
//! No retries and no caching: every call re-invokes the model.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::AssistConfig;
use crate::error::{LlmError, ProcessError};
use crate::llm::provider::{CompletionRequest, GenerationOptions, LlmProvider};
use crate::mail::normalize::NormalizedEmail;
use crate::pipeline::analysis::parse_analysis;
use crate::pipeline::content::{prepare_content, truncate_content};
use crate::pipeline::language::infer_source_language;
use crate::pipeline::prompts::{build_analysis_prompt, build_translation_prompt};
use crate::pipeline::types::{
    Analysis, AnalysisFormat, ProcessingMode, ProcessingOutput, ProcessingResult, Translation,
};

/// Orchestrates completion calls for one email at a time.
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    model: Option<String>,
    default_source_language: String,
    target_language: String,
    options: GenerationOptions,
}

impl Orchestrator {
    /// Orchestrator with Dutch → English defaults.
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            model: None,
            default_source_language: "Dutch".to_string(),
            target_language: "English".to_string(),
            options: GenerationOptions::default(),
        }
    }

    pub fn from_config(llm: Arc<dyn LlmProvider>, config: &AssistConfig) -> Self {
        Self::new(llm).with_languages(&config.source_language, &config.target_language)
    }

    /// Pin a model instead of the provider's default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_languages(mut self, source: &str, target: &str) -> Self {
        self.default_source_language = source.to_string();
        self.target_language = target.to_string();
        self
    }

    /// Source language used when the sender gives no hint.
    pub fn default_source_language(&self) -> &str {
        &self.default_source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Model the next completion will use.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.llm.model_name())
    }

    /// Parse `mode` and process. Unknown modes fail before any model call.
    pub async fn process_named(&self, email: &NormalizedEmail, mode: &str) -> ProcessingResult {
        match mode.parse::<ProcessingMode>() {
            Ok(mode) => self.process(email, mode).await,
            Err(e) => {
                warn!(id = %email.id, mode = %mode, "Rejecting unknown processing mode");
                Err(e)
            }
        }
    }

    /// Process a single email in the given mode.
    pub async fn process(&self, email: &NormalizedEmail, mode: ProcessingMode) -> ProcessingResult {
        info!(
            id = %email.id,
            subject = %email.subject,
            mode = mode.label(),
            "Processing email"
        );

        let result = self.run(email, mode).await;
        match &result {
            Ok(_) => info!(id = %email.id, mode = mode.label(), "Email processing completed"),
            Err(e) => error!(id = %email.id, mode = mode.label(), error = %e, "Email processing failed"),
        }
        result
    }

    /// Process emails one after another. Each gets its own result.
    pub async fn process_batch(
        &self,
        emails: &[NormalizedEmail],
        mode: ProcessingMode,
    ) -> Vec<(String, ProcessingResult)> {
        let mut results = Vec::with_capacity(emails.len());
        for email in emails {
            let result = self.process(email, mode).await;
            results.push((email.id.clone(), result));
        }

        let succeeded = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!(
            succeeded,
            total = emails.len(),
            mode = mode.label(),
            "Batch processing complete"
        );
        results
    }

    async fn run(&self, email: &NormalizedEmail, mode: ProcessingMode) -> ProcessingResult {
        let prepared = prepare_content(email)?;
        let source_language = infer_source_language(&email.from, &self.default_source_language);

        match mode {
            ProcessingMode::Translate => {
                let t = self
                    .translate(&prepared.text, &source_language, &self.target_language)
                    .await?;
                Ok(ProcessingOutput::Translate {
                    translation: t.text,
                    source_language: t.source_language,
                    target_language: t.target_language,
                })
            }
            ProcessingMode::Summarize => {
                let (analysis, format) = self.summarize(&prepared.text, &self.target_language).await?;
                Ok(ProcessingOutput::Summarize {
                    analysis,
                    format,
                    language: self.target_language.clone(),
                })
            }
            ProcessingMode::Both => {
                let t = self
                    .translate(&prepared.text, &source_language, &self.target_language)
                    .await?;

                // Translation success stands even if the analysis fails.
                let analysis = match self.summarize(&t.text, &t.target_language).await {
                    Ok((analysis, _)) => Some(analysis),
                    Err(e) => {
                        warn!(id = %email.id, error = %e, "Summarization of translation failed");
                        None
                    }
                };

                Ok(ProcessingOutput::Both {
                    translation: t.text,
                    source_language: t.source_language,
                    target_language: t.target_language,
                    analysis,
                })
            }
        }
    }

    /// Translate arbitrary content. The completion text is returned verbatim.
    pub async fn translate(
        &self,
        content: &str,
        from_language: &str,
        to_language: &str,
    ) -> Result<Translation, ProcessError> {
        if content.trim().is_empty() {
            return Err(ProcessError::EmptyContent);
        }
        let (content, _) = truncate_content(content);

        debug!(from = %from_language, to = %to_language, "Translating email content");
        let prompt = build_translation_prompt(&content, from_language, to_language);
        let text = self.complete(prompt).await?;

        Ok(Translation {
            text,
            source_language: from_language.to_string(),
            target_language: to_language.to_string(),
        })
    }

    /// Analyze arbitrary content. Unstructured model output degrades to
    /// `AnalysisFormat::Plain`; only endpoint failures are errors.
    pub async fn summarize(
        &self,
        content: &str,
        language: &str,
    ) -> Result<(Analysis, AnalysisFormat), ProcessError> {
        if content.trim().is_empty() {
            return Err(ProcessError::EmptyContent);
        }
        let (content, _) = truncate_content(content);

        debug!(language = %language, "Analyzing email content");
        let prompt = build_analysis_prompt(&content, language);
        let raw = self.complete(prompt).await?;

        let (analysis, format) = parse_analysis(&raw);
        match format {
            AnalysisFormat::Structured => info!("Email analysis completed (structured)"),
            AnalysisFormat::Plain => info!("Email analysis completed (plain text)"),
        }
        Ok((analysis, format))
    }

    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let mut request = CompletionRequest::new(prompt).with_options(self.options.clone());
        if let Some(ref model) = self.model {
            request = request.with_model(model.clone());
        }

        let response = self.llm.complete(request).await.map_err(|e| {
            error!(model = %self.model_name(), error = %e, "Completion request failed");
            e
        })?;
        Ok(response.content)
    }
}
