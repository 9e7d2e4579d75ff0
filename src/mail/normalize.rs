//! Body extractor: turns a `RawMessage` into a `NormalizedEmail`.
//!
//! Pure data transformation: no I/O, no shared state. Decode failures are
//! scoped to the offending part, which is treated as absent.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::mail::html::strip_tags;
use crate::mail::raw::{Header, MimeNode, RawMessage};

/// Max preview length before the ellipsis.
pub const PREVIEW_CHARS: usize = 200;

/// Suffix appended to a cut preview.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Normalized content model for one message. Immutable after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedEmail {
    pub id: String,
    pub thread_id: String,
    pub labels: Vec<String>,
    pub subject: String,
    pub from: String,
    /// `YYYY-MM-DD` (UTC), empty when the raw record had no usable date.
    pub date: String,
    pub plain_text_body: String,
    pub html_body: String,
    pub has_plain_text: bool,
    pub has_html: bool,
    pub preview: String,
}

/// Normalize a raw message.
pub fn normalize(raw: &RawMessage) -> NormalizedEmail {
    let headers = raw.headers();
    let bodies = extract_bodies(&raw.payload);

    let plain_text_body = clean_body(bodies.plain.as_deref().unwrap_or_default());
    let html_body = clean_body(bodies.html.as_deref().unwrap_or_default());
    let preview = build_preview(&plain_text_body, &html_body);

    let email = NormalizedEmail {
        id: raw.id.clone(),
        thread_id: raw.thread_id.clone(),
        labels: raw.label_ids.clone(),
        subject: header_value(headers, "Subject").to_string(),
        from: header_value(headers, "From").to_string(),
        date: format_date(raw.internal_date.as_deref()),
        has_plain_text: !plain_text_body.is_empty(),
        has_html: !html_body.is_empty(),
        plain_text_body,
        html_body,
        preview,
    };

    debug!(
        id = %email.id,
        subject = %email.subject,
        plain_chars = email.plain_text_body.chars().count(),
        html_chars = email.html_body.chars().count(),
        "Normalized message"
    );

    email
}

/// Case-insensitive header lookup. First match wins; missing → "".
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> &'a str {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .unwrap_or("")
}

/// Decoded (not yet cleaned) bodies; `None` means the slot is still empty.
#[derive(Debug, Default)]
struct Bodies {
    plain: Option<String>,
    html: Option<String>,
}

impl Bodies {
    fn is_complete(&self) -> bool {
        self.plain.is_some() && self.html.is_some()
    }
}

fn extract_bodies(payload: &MimeNode) -> Bodies {
    let mut bodies = Bodies::default();

    if let Some(data) = payload.inline_data() {
        // Single-part message: the top-level body is the only body.
        let media_type = payload.media_type();
        if let Some(text) = decode_or_skip(&media_type, data) {
            if media_type == "text/html" {
                bodies.html = Some(text);
            } else {
                bodies.plain = Some(text);
            }
        }
    } else if !payload.parts.is_empty() {
        walk_parts(&payload.parts, &mut bodies);
    }

    bodies
}

/// Depth-first walk; the first decodable part of each kind wins.
fn walk_parts(parts: &[MimeNode], bodies: &mut Bodies) {
    for part in parts {
        if bodies.is_complete() {
            return;
        }

        if let Some(data) = part.inline_data() {
            let media_type = part.media_type();
            let slot = match media_type.as_str() {
                "text/plain" => Some(&mut bodies.plain),
                "text/html" => Some(&mut bodies.html),
                _ => None,
            };
            if let Some(slot) = slot
                && slot.is_none()
                && let Some(text) = decode_or_skip(&media_type, data)
                && !text.trim().is_empty()
            {
                *slot = Some(text);
            }
        }

        if !part.parts.is_empty() {
            walk_parts(&part.parts, bodies);
        }
    }
}

fn decode_or_skip(media_type: &str, data: &str) -> Option<String> {
    match decode_part(media_type, data) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "Skipping undecodable body part");
            None
        }
    }
}

/// Decode a base64 part payload into UTF-8 text.
///
/// Accepts both the URL-safe and standard alphabets, with or without
/// padding, and ignores embedded line breaks.
pub fn decode_part(media_type: &str, data: &str) -> Result<String, NormalizeError> {
    let failure = |reason: String| NormalizeError::DecodeFailure {
        mime_type: if media_type.is_empty() {
            "untyped".to_string()
        } else {
            media_type.to_string()
        },
        reason,
    };

    let canonical: String = data
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(canonical.as_bytes())
        .map_err(|e| failure(format!("base64: {e}")))?;

    String::from_utf8(bytes).map_err(|e| failure(format!("utf-8: {e}")))
}

fn clean_body(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Build the preview: plain text first, tag-stripped HTML otherwise.
pub fn build_preview(plain_text_body: &str, html_body: &str) -> String {
    if !plain_text_body.is_empty() {
        truncate_preview(plain_text_body)
    } else if !html_body.is_empty() {
        truncate_preview(&strip_tags(html_body))
    } else {
        String::new()
    }
}

fn truncate_preview(source: &str) -> String {
    match source.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &source[..cut], PREVIEW_ELLIPSIS),
        None => source.to_string(),
    }
}

/// Render `internalDate` (epoch millis) as a UTC calendar date.
fn format_date(internal_date: Option<&str>) -> String {
    internal_date
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
