//! Content preparation shared by every mode: select → sanitize → truncate.

use tracing::info;

use crate::error::ProcessError;
use crate::mail::html::sanitize_html;
use crate::mail::normalize::NormalizedEmail;

/// Content longer than this many chars is cut before prompting.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Appended to content that was cut.
pub const TRUNCATION_MARKER: &str = "...[content truncated]";

/// Which body the prompt content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Html,
    PlainText,
}

/// Text ready to embed in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    pub text: String,
    pub source: ContentSource,
    pub truncated: bool,
}

/// Pick the body to send: HTML (sanitized) first, plain text otherwise.
///
/// HTML that sanitizes down to nothing falls back to the plain body.
pub fn select_content(email: &NormalizedEmail) -> Result<(String, ContentSource), ProcessError> {
    if !email.html_body.is_empty() {
        let text = sanitize_html(&email.html_body);
        if !text.is_empty() {
            return Ok((text, ContentSource::Html));
        }
    }
    if !email.plain_text_body.is_empty() {
        return Ok((email.plain_text_body.clone(), ContentSource::PlainText));
    }
    Err(ProcessError::EmptyContent)
}

/// Cut `text` to `MAX_CONTENT_CHARS` chars plus the marker. Returns whether it cut.
pub fn truncate_content(text: &str) -> (String, bool) {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => (format!("{}{}", &text[..cut], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

/// Full preparation for one email.
pub fn prepare_content(email: &NormalizedEmail) -> Result<PreparedContent, ProcessError> {
    let (selected, source) = select_content(email)?;
    let (text, truncated) = truncate_content(&selected);
    if truncated {
        info!(
            id = %email.id,
            original_chars = selected.chars().count(),
            "Email content truncated due to length"
        );
    }
    Ok(PreparedContent {
        text,
        source,
        truncated,
    })
}
