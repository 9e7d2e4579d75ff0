//! Raw message records as delivered by the mail provider.
//!
//! The shape follows the Gmail API `users.messages.get?format=full`
//! response: a flat header list plus a recursively nested MIME tree whose
//! leaves carry base64-encoded payloads.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// A raw message record. Read-only input to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    /// Epoch milliseconds, encoded as a decimal string.
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MimeNode,
}

/// One node of the MIME tree: either a leaf with inline data, a container
/// with child parts, or (rarely) neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MimeNode {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MimeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Base64 payload (URL-safe alphabet from Gmail, standard from elsewhere).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, payload: MimeNode) -> Self {
        Self {
            id: id.into(),
            payload,
            ..Self::default()
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.label_ids = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_internal_date(mut self, epoch_millis: i64) -> Self {
        self.internal_date = Some(epoch_millis.to_string());
        self
    }

    /// Append a top-level header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Top-level headers.
    pub fn headers(&self) -> &[Header] {
        &self.payload.headers
    }
}

impl MimeNode {
    /// Leaf node carrying `text` encoded the way Gmail delivers it.
    pub fn text(mime_type: &str, text: &str) -> Self {
        Self::encoded(mime_type, URL_SAFE_NO_PAD.encode(text.as_bytes()))
    }

    /// Leaf node carrying an already-encoded payload.
    pub fn encoded(mime_type: &str, data: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            body: Some(PartBody {
                data: Some(data.into()),
                ..PartBody::default()
            }),
            ..Self::default()
        }
    }

    /// Container node (`multipart/*`) holding `parts`.
    pub fn multipart(mime_type: &str, parts: Vec<MimeNode>) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            body: Some(PartBody {
                size: Some(0),
                ..PartBody::default()
            }),
            parts,
            ..Self::default()
        }
    }

    /// Inline payload, if this node carries a non-empty one.
    pub fn inline_data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Lowercased media type without parameters; empty if absent.
    pub fn media_type(&self) -> String {
        self.mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_gmail_shape() {
        let json = r#"{
            "id": "18c1",
            "threadId": "18c0",
            "labelIds": ["INBOX", "UNREAD"],
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [{"name": "Subject", "value": "Marktupdate"}],
                "body": {"size": 0},
                "parts": [
                    {"partId": "0", "mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8"}},
                    {"partId": "1", "mimeType": "text/html", "body": {"size": 12, "data": "PGI-aGk8L2I-"}}
                ]
            }
        }"#;
        let raw: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(raw.thread_id, "18c0");
        assert_eq!(raw.label_ids, vec!["INBOX", "UNREAD"]);
        assert_eq!(raw.internal_date.as_deref(), Some("1700000000000"));
        assert_eq!(raw.headers()[0].value, "Marktupdate");
        assert_eq!(raw.payload.parts.len(), 2);
        assert_eq!(raw.payload.inline_data(), None);
        assert_eq!(raw.payload.parts[0].inline_data(), Some("aGVsbG8"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw: RawMessage = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(raw.thread_id.is_empty());
        assert!(raw.label_ids.is_empty());
        assert!(raw.internal_date.is_none());
        assert!(raw.payload.parts.is_empty());
    }

    #[test]
    fn media_type_strips_parameters_and_case() {
        let node = MimeNode::encoded("Text/Plain; charset=\"UTF-8\"", "");
        assert_eq!(node.media_type(), "text/plain");
        assert_eq!(MimeNode::default().media_type(), "");
    }

    #[test]
    fn empty_data_is_not_inline() {
        let node = MimeNode::encoded("text/plain", "");
        assert!(node.inline_data().is_none());
    }
}
