//! Raw-message sources.
//!
//! The mail provider itself (OAuth, pagination, transport) lives outside
//! this crate; anything that can list message ids and hand back a
//! `RawMessage` per id plugs in through `MessageSource`.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::mail::raw::RawMessage;

/// A supplier of raw messages: pure I/O, no normalization.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name for logging (e.g. "gmail", "directory").
    fn name(&self) -> &str;

    /// List up to `max_results` message ids matching `query`.
    ///
    /// Query syntax is source-specific and passed through untouched.
    async fn list_ids(&self, query: &str, max_results: usize) -> Result<Vec<String>, SourceError>;

    /// Fetch the full raw record for one id.
    async fn get(&self, id: &str) -> Result<RawMessage, SourceError>;
}

/// Reads `<id>.json` files (Gmail `format=full` dumps) from a directory.
///
/// `list_ids` does a case-insensitive substring match of the query against
/// each file's contents; an empty query matches everything. Ids come back
/// sorted.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.contains(['/', '\\'])
            && id != "."
            && id != "..";
        valid.then(|| self.root.join(format!("{id}.json")))
    }
}

#[async_trait]
impl MessageSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn list_ids(&self, query: &str, max_results: usize) -> Result<Vec<String>, SourceError> {
        let needle = query.trim().to_lowercase();
        let mut ids = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !needle.is_empty() {
                let contents = match tokio::fs::read_to_string(&path).await {
                    Ok(contents) => contents,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Unreadable message file, skipping");
                        continue;
                    }
                };
                if !contents.to_lowercase().contains(&needle) {
                    continue;
                }
            }
            ids.push(id.to_string());
        }

        ids.sort();
        ids.truncate(max_results);
        tracing::debug!(
            root = %self.root.display(),
            query = %query,
            found = ids.len(),
            "Listed directory messages"
        );
        Ok(ids)
    }

    async fn get(&self, id: &str) -> Result<RawMessage, SourceError> {
        let not_found = || SourceError::NotFound { id: id.to_string() };
        let path = self.path_for(id).ok_or_else(not_found)?;

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut raw: RawMessage =
            serde_json::from_str(&contents).map_err(|e| SourceError::Parse {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        if raw.id.is_empty() {
            raw.id = id.to_string();
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn lists_json_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.json", r#"{"id": "b"}"#);
        write(dir.path(), "a.json", r#"{"id": "a"}"#);
        write(dir.path(), "notes.txt", "ignore me");

        let source = DirectorySource::new(dir.path());
        let ids = source.list_ids("", 10).await.unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn list_respects_query_and_max() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1.json", r#"{"id": "1", "snippet": "Beurs update"}"#);
        write(dir.path(), "2.json", r#"{"id": "2", "snippet": "holiday photos"}"#);
        write(dir.path(), "3.json", r#"{"id": "3", "snippet": "BEURS sluit"}"#);

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.list_ids("beurs", 10).await.unwrap(), vec!["1", "3"]);
        assert_eq!(source.list_ids("beurs", 1).await.unwrap(), vec!["1"]);
    }

    #[tokio::test]
    async fn query_skips_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"id": "a", "snippet": "beurs"}"#);
        std::fs::write(dir.path().join("b.json"), [0xFF, 0xFE, b'{']).unwrap();
        write(dir.path(), "c.json", r#"{"id": "c", "snippet": "Beurs"}"#);

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.list_ids("beurs", 10).await.unwrap(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn get_parses_and_fills_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "abc.json", r#"{"id": "", "threadId": "t1"}"#);

        let raw = DirectorySource::new(dir.path()).get("abc").await.unwrap();
        assert_eq!(raw.id, "abc");
        assert_eq!(raw.thread_id, "t1");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectorySource::new(dir.path()).get("nope").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectorySource::new(dir.path())
            .get("../etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.json", "{ not json");
        let err = DirectorySource::new(dir.path()).get("bad").await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
