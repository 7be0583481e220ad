//! Reading the exported query log.
//!
//! The export is JSON Lines: one [`QueryRecord`] per line, blank lines ignored.

use std::path::Path;

use common::protocol::QueryRecord;
use common::RecordError;

/// Read and parse the export at `path`.
///
/// Lines that fail to parse are returned as [`RecordError::Malformed`] in
/// place, so one bad line does not hide the rest of the log.
///
/// # Errors
///
/// Returns [`RecordError::Io`] if the file cannot be read.
pub async fn load(path: &Path) -> Result<Vec<Result<QueryRecord, RecordError>>, RecordError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RecordError::Io(format!("{}: {e}", path.display())))?;
    Ok(parse_records(&text))
}

/// Parse JSON Lines text into records, numbering lines from 1 in errors.
pub fn parse_records(text: &str) -> Vec<Result<QueryRecord, RecordError>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| RecordError::malformed_json(&format!("line {}", i + 1), &e))
        })
        .collect()
}
