//! `sdm-replay`: offline decryption and playback of exported query logs.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Load the log encryption private key, if configured.
//! 4. Read the exported query log.
//! 5. Run the replay pipeline, writing playback and commands to stdout.

mod config;
mod pipeline;
mod source;
mod telemetry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use replay_crypto::HybridDecryptor;
use tracing::{info, warn};

use config::Config;
use pipeline::{Options, Pipeline, ShellPolicy};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        query_log = %cfg.query_log_path,
        "sdm-replay starting"
    );

    // -----------------------------------------------------------------------
    // 3. Private key
    // -----------------------------------------------------------------------
    let decryptor = match &cfg.log_private_key_file {
        Some(path) => {
            let key = replay_crypto::load_private_key(path)
                .context("failed to load log encryption private key")?;
            Some(HybridDecryptor::new(key))
        }
        None => {
            warn!("SDM_LOG_PRIVATE_KEY_FILE not set; encrypted records will be skipped");
            None
        }
    };

    // -----------------------------------------------------------------------
    // 4. Query log
    // -----------------------------------------------------------------------
    let records = source::load(Path::new(&cfg.query_log_path))
        .await
        .context("failed to read query log")?;
    info!(records = records.len(), "query log loaded");

    // -----------------------------------------------------------------------
    // 5. Replay
    // -----------------------------------------------------------------------
    let options = Options {
        realtime: cfg.realtime_playback,
        relay_export_dir: cfg.relay_export_dir.as_ref().map(PathBuf::from),
        fail_fast: cfg.fail_fast,
    };
    let pipeline = Pipeline::new(decryptor, ShellPolicy, options);
    let mut stdout = tokio::io::stdout();
    let summary = pipeline.run(records, &mut stdout).await?;

    info!(
        played = summary.played,
        printed = summary.printed,
        exported = summary.exported,
        skipped = summary.skipped,
        failed = summary.failed,
        "replay finished"
    );

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
