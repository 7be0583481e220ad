//! Relay-log export for RDP sessions.
//!
//! An RDP replay is rendered by an external replayer from a directory of
//! relay-log files:
//!
//! ```text
//! <dir>/<query id>/relay.0000000000.log   postStart line (query metadata)
//! <dir>/<query id>/relay.0000000001.log   first chunk of events
//! ...
//! ```

use std::path::{Path, PathBuf};

use common::protocol::{QueryRecord, RelayEvent, RelayLine, ReplayChunkEvent};
use common::RecordError;
use tracing::debug;

/// Whether a record is exported as relay logs.
///
/// Start records (duration 0) lack the session metadata the replayer needs.
pub fn is_candidate(record: &QueryRecord) -> bool {
    record.resource_type == "rdp" && record.duration_ms > 0
}

/// Write the relay-log files for `record` under `dir/<record id>/`.
///
/// `chunks` holds the already-decrypted events of each replay chunk, in
/// order. Returns the directory the files were written to.
///
/// # Errors
///
/// Returns [`RecordError::Malformed`] if the record id is not a plain file
/// name, and [`RecordError::Io`] if a directory or file cannot be written.
pub async fn export(
    dir: &Path,
    record: &QueryRecord,
    chunks: &[Vec<ReplayChunkEvent>],
) -> Result<PathBuf, RecordError> {
    let id = record.id.as_str();
    if id.is_empty() || id == "." || id == ".." || id.contains(|c| c == '/' || c == '\\') {
        return Err(RecordError::Malformed(format!(
            "record id {id:?} cannot be used as a relay directory name"
        )));
    }
    let session_dir = dir.join(id);
    tokio::fs::create_dir_all(&session_dir).await?;

    let start = RelayLine::PostStart {
        uuid: record.id.clone(),
        query: record.query_body.clone(),
    };
    write_line(&session_dir, 0, &start).await?;

    for (i, events) in chunks.iter().enumerate() {
        let chunk_id = i + 1;
        let line = RelayLine::Chunk {
            uuid: record.id.clone(),
            chunk_id: chunk_id.to_string(),
            events: events.iter().map(RelayEvent::from).collect(),
        };
        write_line(&session_dir, chunk_id, &line).await?;
    }

    debug!(record_id = %record.id, chunks = chunks.len(), "relay logs written");
    Ok(session_dir)
}

fn file_name(chunk_id: usize) -> String {
    format!("relay.{chunk_id:010}.log")
}

async fn write_line(dir: &Path, chunk_id: usize, line: &RelayLine) -> Result<(), RecordError> {
    let body = serde_json::to_vec(line).map_err(|e| RecordError::Malformed(e.to_string()))?;
    tokio::fs::write(dir.join(file_name(chunk_id)), body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rdp_record(duration_ms: u64) -> QueryRecord {
        serde_json::from_value(serde_json::json!({
            "id": "s-1f2e",
            "resource_type": "rdp",
            "duration_ms": duration_ms,
            "query_body": "{\"width\":1280,\"height\":720}"
        }))
        .unwrap()
    }

    #[test]
    fn candidates() {
        assert!(is_candidate(&rdp_record(1500)));
        assert!(!is_candidate(&rdp_record(0)));
        let mut ssh = rdp_record(1500);
        ssh.resource_type = "ssh".into();
        assert!(!is_candidate(&ssh));
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(file_name(0), "relay.0000000000.log");
        assert_eq!(file_name(12), "relay.0000000012.log");
    }

    #[tokio::test]
    async fn writes_post_start_and_numbered_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = vec![
            vec![ReplayChunkEvent {
                data: b"frame".to_vec(),
                duration: Duration::from_millis(1),
            }],
            vec![],
        ];
        let out = export(dir.path(), &rdp_record(1500), &chunks).await.unwrap();
        assert_eq!(out, dir.path().join("s-1f2e"));

        let start = std::fs::read_to_string(out.join("relay.0000000000.log")).unwrap();
        assert_eq!(
            start,
            r#"{"type":"postStart","uuid":"s-1f2e","query":"{\"width\":1280,\"height\":720}"}"#
        );
        let first = std::fs::read_to_string(out.join("relay.0000000001.log")).unwrap();
        assert_eq!(
            first,
            r#"{"type":"chunk","uuid":"s-1f2e","chunkId":"1","events":[{"Data":"ZnJhbWU=","Duration":1000000}]}"#
        );
        let second = std::fs::read_to_string(out.join("relay.0000000002.log")).unwrap();
        assert_eq!(
            second,
            r#"{"type":"chunk","uuid":"s-1f2e","chunkId":"2","events":[]}"#
        );
        assert!(!out.join("relay.0000000003.log").exists());
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = rdp_record(1500);
        record.id = "../escape".into();
        let err = export(dir.path(), &record, &[]).await.unwrap_err();
        assert!(matches!(err, RecordError::Malformed(_)));
    }
}
