//! Batch fetch + normalize.
//!
//! Tolerant policy: a message that fails to fetch is logged and skipped,
//! the rest of the batch carries on, and the surviving messages keep the
//! order the source listed them in.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::SourceError;
use crate::mail::normalize::{NormalizedEmail, normalize};
use crate::mail::raw::RawMessage;
use crate::mail::source::MessageSource;

/// Knobs for `fetch_batch`.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound on in-flight `get` calls.
    pub concurrency: usize,
    /// Drop messages that normalize without a subject or a sender.
    pub require_subject_and_from: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            require_subject_and_from: true,
        }
    }
}

/// A message left out of a batch, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedMessage {
    pub id: String,
    pub reason: String,
}

/// Result of a batch: normalized emails in source order plus what was skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub emails: Vec<NormalizedEmail>,
    pub skipped: Vec<SkippedMessage>,
}

/// List, fetch and normalize messages from `source`.
///
/// Only a failure of the listing call is fatal; per-message failures end
/// up in `BatchOutcome::skipped`.
pub async fn fetch_batch(
    source: &dyn MessageSource,
    query: &str,
    max_results: usize,
    options: &BatchOptions,
) -> Result<BatchOutcome, SourceError> {
    let ids = source.list_ids(query, max_results).await?;
    info!(
        source = source.name(),
        count = ids.len(),
        "Fetching message batch"
    );

    let fetched: Vec<(String, Result<RawMessage, SourceError>)> =
        futures::stream::iter(ids.into_iter().map(|id| async move {
            let result = source.get(&id).await;
            (id, result)
        }))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let total = fetched.len();
    let mut outcome = BatchOutcome::default();

    for (id, result) in fetched {
        match result {
            Ok(raw) => {
                let email = normalize(&raw);
                if options.require_subject_and_from
                    && (email.subject.is_empty() || email.from.is_empty())
                {
                    warn!(id = %id, "Message missing subject or from, skipping");
                    outcome.skipped.push(SkippedMessage {
                        id,
                        reason: "missing subject or from header".into(),
                    });
                    continue;
                }
                outcome.emails.push(email);
            }
            Err(e) => {
                error!(id = %id, error = %e, "Failed to fetch message, skipping");
                outcome.skipped.push(SkippedMessage {
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        retrieved = outcome.emails.len(),
        total, "Batch fetch complete"
    );
    Ok(outcome)
}

/// Normalize already-fetched raw messages, preserving order.
pub fn normalize_batch(raws: &[RawMessage]) -> Vec<NormalizedEmail> {
    raws.iter().map(normalize).collect()
}

/// Read and normalize raw message files. Files that can't be read or
/// parsed are logged and reported as skipped, keyed by path.
pub async fn normalize_files(paths: &[PathBuf]) -> BatchOutcome {
    let mut raws = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match read_raw_file(path).await {
            Ok(raw) => raws.push(raw),
            Err(reason) => {
                warn!(path = %path.display(), reason = %reason, "Skipping message file");
                skipped.push(SkippedMessage {
                    id: path.display().to_string(),
                    reason,
                });
            }
        }
    }

    BatchOutcome {
        emails: normalize_batch(&raws),
        skipped,
    }
}

async fn read_raw_file(path: &Path) -> Result<RawMessage, String> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("read failed: {e}"))?;
    let mut raw: RawMessage =
        serde_json::from_str(&contents).map_err(|e| format!("invalid message JSON: {e}"))?;
    if raw.id.is_empty()
        && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
    {
        raw.id = stem.to_string();
    }
    Ok(raw)
}
