//! Mail ingestion: raw provider records in, `NormalizedEmail` out.

pub mod batch;
pub mod html;
pub mod normalize;
pub mod raw;
pub mod source;

pub use batch::{
    BatchOptions, BatchOutcome, SkippedMessage, fetch_batch, normalize_batch, normalize_files,
};
pub use normalize::{NormalizedEmail, normalize};
pub use raw::{Header, MimeNode, PartBody, RawMessage};
pub use source::{DirectorySource, MessageSource};
