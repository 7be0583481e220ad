//! Per-record processing of an exported query log.
//!
//! For each record, in export order:
//!
//! 1. Encrypted records have their body decrypted and re-classified through
//!    the [`ReplayPolicy`].
//! 2. RDP session records are written out as relay logs when an export
//!    directory is configured.
//! 3. Replayable records have their chunks decrypted and played back.
//! 4. Everything else prints the command that was run.
//!
//! A record that fails is logged with its stage and remedy and skipped; the
//! run only stops early on I/O failure or when `fail_fast` is set.

pub mod playback;
pub mod policy;
pub mod relay;

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{parse_chunk_events, CapturedQuery, QueryRecord, ReplayChunk, ReplayChunkEvent};
use common::RecordError;
use replay_crypto::{DecryptError, HybridDecryptor};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

pub use policy::{ReplayPolicy, ShellPolicy};

/// Runtime switches for a [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Sleep for recorded event durations during playback.
    pub realtime: bool,
    /// Where to write RDP relay logs; `None` disables the export.
    pub relay_export_dir: Option<PathBuf>,
    /// Abort on the first failed record.
    pub fail_fast: bool,
}

/// Per-outcome record counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub played: usize,
    pub printed: usize,
    pub exported: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Played,
    Printed,
    Exported,
}

/// Decrypts, classifies and renders exported query records.
pub struct Pipeline<P> {
    decryptor: Option<HybridDecryptor>,
    policy: P,
    options: Options,
}

impl<P: ReplayPolicy> Pipeline<P> {
    /// `decryptor` is `None` when no private key is configured; encrypted
    /// records are then skipped.
    pub fn new(decryptor: Option<HybridDecryptor>, policy: P, options: Options) -> Self {
        Self {
            decryptor,
            policy,
            options,
        }
    }

    /// Process `records` in order, writing playback and command lines to `out`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`RecordError`], or the first failure of any
    /// kind when `fail_fast` is set. Otherwise failures are counted in the
    /// returned [`Summary`].
    pub async fn run<W>(
        &self,
        records: Vec<Result<QueryRecord, RecordError>>,
        out: &mut W,
    ) -> Result<Summary, RecordError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut summary = Summary::default();
        for entry in records {
            let result = match entry {
                Ok(record) => self.process(record, out).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(Outcome::Played) => summary.played += 1,
                Ok(Outcome::Printed) => summary.printed += 1,
                Ok(Outcome::Exported) => summary.exported += 1,
                Err(e @ RecordError::NoKey { .. }) => {
                    warn!(code = e.code(), error = %e, "record skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(code = e.code(), error = %e, "record failed");
                    summary.failed += 1;
                    if e.is_fatal() || self.options.fail_fast {
                        return Err(e);
                    }
                }
            }
        }
        Ok(summary)
    }

    async fn process<W>(&self, mut record: QueryRecord, out: &mut W) -> Result<Outcome, RecordError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut captured = None;
        if record.encrypted {
            let decryptor = self.decryptor_for(&record)?;
            debug!(record_id = %record.id, "decrypting encrypted query");
            let ciphertext = STANDARD
                .decode(&record.query_body)
                .map_err(|e| unreadable(&record.id, DecryptError::Decode(e)))?;
            let body = decryptor
                .decrypt_to_string(&record.query_key, &ciphertext)
                .map_err(|e| unreadable(&record.id, e))?;
            let query = CapturedQuery::from_json(&body)
                .map_err(|e| malformed(&record.id, "query body", e))?;
            record.replayable = self.policy.is_replayable(&query);
            record.query_body = body;
            captured = Some(query);
        }

        if let Some(dir) = &self.options.relay_export_dir {
            if relay::is_candidate(&record) {
                let chunks = self.resolve_chunks(&record)?;
                let path = relay::export(dir, &record, &chunks).await?;
                info!(record_id = %record.id, path = %path.display(), "relay logs exported");
                return Ok(Outcome::Exported);
            }
        }

        if record.replayable {
            // All chunks must decrypt before any output is written.
            let chunks = self.resolve_chunks(&record)?;
            let header = format!(
                "Replaying query made by {} at {}\n",
                record.account_email, record.timestamp
            );
            out.write_all(header.as_bytes()).await?;
            for events in &chunks {
                playback::play(events, out, self.options.realtime).await?;
            }
            out.write_all(b"\n").await?;
            out.flush().await?;
            return Ok(Outcome::Played);
        }

        let query = match captured {
            Some(q) => q,
            None => CapturedQuery::from_json(&record.query_body)
                .map_err(|e| malformed(&record.id, "query body", e))?,
        };
        let line = format!(
            "Command run by {} at {}: {}\n",
            record.account_email,
            record.timestamp,
            query.command.unwrap_or_default()
        );
        out.write_all(line.as_bytes()).await?;
        Ok(Outcome::Printed)
    }

    fn resolve_chunks(&self, record: &QueryRecord) -> Result<Vec<Vec<ReplayChunkEvent>>, RecordError> {
        record
            .replay
            .iter()
            .map(|chunk| self.resolve_chunk(record, chunk))
            .collect()
    }

    fn resolve_chunk(
        &self,
        record: &QueryRecord,
        chunk: &ReplayChunk,
    ) -> Result<Vec<ReplayChunkEvent>, RecordError> {
        let Some(data) = &chunk.data else {
            return Ok(chunk.events.clone());
        };
        let decryptor = self.decryptor_for(record)?;
        let ciphertext = STANDARD
            .decode(data)
            .map_err(|e| unreadable(&record.id, DecryptError::Decode(e)))?;
        let json = decryptor
            .decrypt_to_string(&record.query_key, &ciphertext)
            .map_err(|e| unreadable(&record.id, e))?;
        parse_chunk_events(&json).map_err(|e| malformed(&record.id, "replay chunk", e))
    }

    fn decryptor_for(&self, record: &QueryRecord) -> Result<&HybridDecryptor, RecordError> {
        self.decryptor.as_ref().ok_or_else(|| RecordError::NoKey {
            id: record.id.clone(),
        })
    }
}

fn unreadable(id: &str, e: DecryptError) -> RecordError {
    let stage = e.stage();
    RecordError::Unreadable {
        id: id.to_owned(),
        stage: stage.as_str(),
        remedy: stage.remedy(),
        message: e.to_string(),
    }
}

fn malformed(id: &str, what: &str, e: serde_json::Error) -> RecordError {
    RecordError::malformed_json(&format!("record {id}: {what}"), &e)
}
