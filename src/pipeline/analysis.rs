//! Tolerant parsing of the model's analysis output.
//!
//! The model is asked for JSON but answers in free text often enough that
//! a parse failure is an expected outcome, not an error: it degrades to
//! `Analysis::plain` tagged `AnalysisFormat::Plain`.

use serde_json::Value;
use tracing::debug;

use crate::pipeline::types::{Analysis, AnalysisFormat, SEE_SUMMARY, Sentiment};

/// Parse model output into an analysis, falling back to the plain shape.
pub fn parse_analysis(raw: &str) -> (Analysis, AnalysisFormat) {
    match parse_structured(raw) {
        Ok(analysis) => (analysis, AnalysisFormat::Structured),
        Err(reason) => {
            debug!(reason = %reason, "Analysis not structured, using plain text");
            (Analysis::plain(raw), AnalysisFormat::Plain)
        }
    }
}

/// Strict half of `parse_analysis`: requires a JSON object with a `summary`.
fn parse_structured(raw: &str) -> Result<Analysis, String> {
    let json_str = extract_json_object(raw);
    let value: Value =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let summary = object
        .get("summary")
        .and_then(flatten_field)
        .ok_or_else(|| "missing summary".to_string())?;

    let sentiment = object
        .get("sentiment")
        .and_then(Value::as_str)
        .map(Sentiment::from_label)
        .unwrap_or_default();

    Ok(Analysis {
        summary,
        key_insights: field_or_placeholder(object.get("keyInsights")),
        important_details: field_or_placeholder(object.get("importantDetails")),
        sentiment,
    })
}

fn field_or_placeholder(value: Option<&Value>) -> String {
    value
        .and_then(flatten_field)
        .unwrap_or_else(|| SEE_SUMMARY.to_string())
}

/// Render a JSON field as text. Lists become one item per line.
fn flatten_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(flatten_field).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .filter_map(|(k, v)| flatten_field(v).map(|v| format!("{k}: {v}")))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        other => Some(other.to_string()),
    }
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_response() {
        let raw = r#"{"summary": "Markets rose.", "keyInsights": "Tech led gains", "importantDetails": "Fed meets 12 June", "sentiment": "positive"}"#;
        let (analysis, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Structured);
        assert_eq!(analysis.summary, "Markets rose.");
        assert_eq!(analysis.key_insights, "Tech led gains");
        assert_eq!(analysis.important_details, "Fed meets 12 June");
        assert_eq!(analysis.sentiment, Sentiment::Positive);
    }

    #[test]
    fn free_text_falls_back_to_plain() {
        let raw = "The email reports that the AEX closed 1.2% higher.";
        let (analysis, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Plain);
        assert_eq!(analysis.summary, raw);
        assert_eq!(analysis.key_insights, SEE_SUMMARY);
        assert_eq!(analysis.important_details, SEE_SUMMARY);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn broken_json_falls_back_to_plain() {
        let raw = r#"{"summary": "cut off mid"#;
        let (analysis, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Plain);
        assert_eq!(analysis.summary, raw);
    }

    #[test]
    fn json_without_summary_is_plain() {
        let raw = r#"{"sentiment": "negative"}"#;
        let (_, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Plain);
    }

    #[test]
    fn non_object_json_is_plain() {
        let (_, format) = parse_analysis(r#"["summary"]"#);
        assert_eq!(format, AnalysisFormat::Plain);
    }

    #[test]
    fn markdown_fenced_json_is_structured() {
        let raw = "Here is the analysis:\n```json\n{\"summary\": \"Rates unchanged\", \"sentiment\": \"Neutral\"}\n```";
        let (analysis, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Structured);
        assert_eq!(analysis.summary, "Rates unchanged");
        assert_eq!(analysis.key_insights, SEE_SUMMARY);
    }

    #[test]
    fn list_fields_are_joined() {
        let raw = r#"{"summary": "s", "keyInsights": ["Oil up", "Gold flat"], "importantDetails": {"date": "2024-05-01", "amount": 1500}}"#;
        let (analysis, format) = parse_analysis(raw);
        assert_eq!(format, AnalysisFormat::Structured);
        assert_eq!(analysis.key_insights, "Oil up\nGold flat");
        assert!(analysis.important_details.contains("date: 2024-05-01"));
        assert!(analysis.important_details.contains("amount: 1500"));
    }

    #[test]
    fn non_string_sentiment_defaults_neutral() {
        let raw = r#"{"summary": "s", "sentiment": 3}"#;
        let (analysis, _) = parse_analysis(raw);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn extract_json_embedded_in_text() {
        let input = "My analysis: {\"summary\": \"low\"} done.";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }
}
