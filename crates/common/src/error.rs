//! Per-record error type shared by the replay pipeline.

use serde_json::error::Category;
use thiserror::Error;

/// Why a single exported query record could not be processed.
///
/// Only [`RecordError::Io`] stops a run; every other variant is reported and
/// the record is skipped.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record is encrypted but no private key is configured.
    #[error("encrypted record {id} skipped: no private key configured")]
    NoKey { id: String },

    /// Decryption failed at a specific pipeline stage.
    #[error("record {id} unreadable at {stage} stage: {message} ({remedy})")]
    Unreadable {
        id: String,
        stage: &'static str,
        remedy: &'static str,
        message: String,
    },

    /// The record, or its decrypted content, is not the expected JSON shape.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Reading the export or writing output failed.
    #[error("i/o failure: {0}")]
    Io(String),
}

impl RecordError {
    /// Short machine-readable code, suitable for a log field.
    pub fn code(&self) -> &'static str {
        match self {
            RecordError::NoKey { .. } => "no_key",
            RecordError::Unreadable { .. } => "unreadable",
            RecordError::Malformed(_) => "malformed",
            RecordError::Io(_) => "io",
        }
    }

    /// A [`RecordError::Malformed`] describing where `e` failed to parse.
    ///
    /// The message is built from the error's category and position only;
    /// serde_json's own `Display` can quote the offending value, which may be
    /// decrypted plaintext.
    pub fn malformed_json(context: &str, e: &serde_json::Error) -> Self {
        let what = match e.classify() {
            Category::Io => "could not be read",
            Category::Syntax => "is not valid JSON",
            Category::Data => "does not have the expected JSON shape",
            Category::Eof => "ends before the JSON value is complete",
        };
        RecordError::Malformed(format!(
            "{context} {what} (line {} column {})",
            e.line(),
            e.column()
        ))
    }

    /// Whether processing of the remaining records must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::Io(_))
    }
}

impl From<std::io::Error> for RecordError {
    fn from(e: std::io::Error) -> Self {
        RecordError::Io(e.to_string())
    }
}
