//! Wire shapes of an exported query log and of the relay-log files written
//! for external replay.
//!
//! Exported records are JSON, one [`QueryRecord`] per line. Decrypted
//! payloads use capitalised field names (`Command`, `Type`, `Data`,
//! `Duration`); lowercase spellings are accepted too.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Exported query log
// ---------------------------------------------------------------------------

/// One query made against a resource, as exported from the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Query id; also the replay id.
    pub id: String,

    /// Email of the account that made the query.
    #[serde(default)]
    pub account_email: String,

    /// When the query was made (RFC 3339 text, displayed verbatim).
    #[serde(default)]
    pub timestamp: String,

    #[serde(default)]
    pub resource_name: String,

    /// Resource kind, e.g. `"ssh"`, `"rdp"`, `"postgres"`.
    #[serde(default)]
    pub resource_type: String,

    /// Query duration in milliseconds. Zero marks a session start record.
    #[serde(default)]
    pub duration_ms: u64,

    /// Whether `query_body` and the replay chunks are encrypted.
    #[serde(default)]
    pub encrypted: bool,

    /// Base64 RSA-OAEP wrapped AES key. Empty when not encrypted.
    #[serde(default)]
    pub query_key: String,

    /// Plain JSON body, or base64 of the IV-prefixed ciphertext when encrypted.
    #[serde(default)]
    pub query_body: String,

    /// Whether a terminal replay exists. Recomputed after decryption for
    /// encrypted records.
    #[serde(default)]
    pub replayable: bool,

    /// Replay chunks in playback order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replay: Vec<ReplayChunk>,
}

/// A part of a session replay.
///
/// Encrypted chunks carry `data` (base64 ciphertext of a JSON event array);
/// plain chunks carry `events` directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ReplayChunkEvent>,
}

impl ReplayChunk {
    pub fn is_encrypted(&self) -> bool {
        self.data.is_some()
    }
}

/// A single terminal output event: bytes to print, then how long to wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayChunkEvent {
    #[serde(rename = "Data", alias = "data", default, with = "base64_bytes")]
    pub data: Vec<u8>,

    #[serde(rename = "Duration", alias = "duration", default, with = "duration_millis")]
    pub duration: Duration,
}

/// The decrypted (or plain) query body, reduced to the fields the replay
/// tooling looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedQuery {
    /// Capture kind; `"shell"` marks an interactive terminal session.
    #[serde(rename = "Type", alias = "type", default)]
    pub kind: Option<String>,

    /// The command that was run.
    #[serde(rename = "Command", alias = "command", default)]
    pub command: Option<String>,
}

impl CapturedQuery {
    /// Parse a captured query from JSON text.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Parse a decrypted replay chunk: a JSON array of events.
pub fn parse_chunk_events(json: &str) -> Result<Vec<ReplayChunkEvent>, serde_json::Error> {
    serde_json::from_str(json)
}

// ---------------------------------------------------------------------------
// Relay-log files
// ---------------------------------------------------------------------------

/// One relay-log file body, as consumed by an external RDP replayer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayLine {
    /// Session start metadata; always written as chunk `0`.
    #[serde(rename = "postStart")]
    PostStart { uuid: String, query: String },

    /// Replay events, numbered from 1.
    #[serde(rename = "chunk")]
    Chunk {
        uuid: String,
        #[serde(rename = "chunkId")]
        chunk_id: String,
        events: Vec<RelayEvent>,
    },
}

/// A replay event in relay-log form. Durations are nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEvent {
    #[serde(rename = "Data", with = "base64_bytes")]
    pub data: Vec<u8>,

    #[serde(rename = "Duration")]
    pub duration: u64,
}

impl From<&ReplayChunkEvent> for RelayEvent {
    fn from(e: &ReplayChunkEvent) -> Self {
        Self {
            data: e.data.clone(),
            duration: u64::try_from(e.duration.as_nanos()).unwrap_or(u64::MAX),
        }
    }
}

// ---------------------------------------------------------------------------
// Field codecs
// ---------------------------------------------------------------------------

/// Bytes as standard base64; `null` reads as empty.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) => STANDARD.decode(s).map_err(D::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Duration as integer milliseconds; negative values clamp to zero.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(d)?;
        Ok(Duration::from_millis(ms.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_record_minimal_defaults() {
        let rec: QueryRecord = serde_json::from_str(r#"{"id":"q1"}"#).unwrap();
        assert_eq!(rec.id, "q1");
        assert!(!rec.encrypted);
        assert!(!rec.replayable);
        assert!(rec.replay.is_empty());
        assert_eq!(rec.duration_ms, 0);
    }

    #[test]
    fn query_record_with_chunks() {
        let rec: QueryRecord = serde_json::from_value(json!({
            "id": "q2",
            "account_email": "ops@example.com",
            "resource_type": "ssh",
            "encrypted": true,
            "query_key": "a2V5",
            "query_body": "Ym9keQ==",
            "replay": [{"data": "Y2h1bms="}, {"events": [{"Data": "aGk=", "Duration": 5}]}]
        }))
        .unwrap();
        assert!(rec.replay[0].is_encrypted());
        assert!(!rec.replay[1].is_encrypted());
        assert_eq!(rec.replay[1].events[0].data, b"hi");
        assert_eq!(rec.replay[1].events[0].duration, Duration::from_millis(5));
    }

    #[test]
    fn chunk_events_accept_both_casings_and_null_data() {
        let events = parse_chunk_events(
            r#"[{"Data":"bHMK","Duration":120},{"data":"","duration":0},{"Data":null,"Duration":-3}]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data, b"ls\n");
        assert_eq!(events[0].duration, Duration::from_millis(120));
        assert!(events[1].data.is_empty());
        assert!(events[2].data.is_empty());
        assert_eq!(events[2].duration, Duration::ZERO);
    }

    #[test]
    fn chunk_events_reject_bad_base64() {
        assert!(parse_chunk_events(r#"[{"Data":"%%%","Duration":1}]"#).is_err());
    }

    #[test]
    fn captured_query_fields() {
        let q = CapturedQuery::from_json(r#"{"Type":"shell","Command":"ls -la","Extra":1}"#).unwrap();
        assert_eq!(q.kind.as_deref(), Some("shell"));
        assert_eq!(q.command.as_deref(), Some("ls -la"));

        let q = CapturedQuery::from_json(r#"{"command":"select 1"}"#).unwrap();
        assert_eq!(q.kind, None);
        assert_eq!(q.command.as_deref(), Some("select 1"));

        assert!(CapturedQuery::from_json("not json").is_err());
    }

    #[test]
    fn relay_post_start_shape() {
        let line = RelayLine::PostStart {
            uuid: "q9".into(),
            query: r#"{"width":1024}"#.into(),
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"type":"postStart","uuid":"q9","query":"{\"width\":1024}"}"#
        );
    }

    #[test]
    fn relay_chunk_shape_uses_nanoseconds() {
        let event = ReplayChunkEvent {
            data: b"hi".to_vec(),
            duration: Duration::from_millis(2),
        };
        let line = RelayLine::Chunk {
            uuid: "q9".into(),
            chunk_id: "1".into(),
            events: vec![RelayEvent::from(&event)],
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"type":"chunk","uuid":"q9","chunkId":"1","events":[{"Data":"aGk=","Duration":2000000}]}"#
        );
    }
}
