//! Configuration loading and validation for the replay tool.
//!
//! All values are read from `SDM_`-prefixed environment variables at startup.
//! The process exits with a clear error message if a required variable is
//! missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated replay tool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the exported query log (JSON Lines). **Required.**
    pub query_log_path: String,

    /// Path to the PEM private key configured for remote log encryption.
    /// Without it, encrypted records are skipped.
    #[serde(default)]
    pub log_private_key_file: Option<String>,

    /// Sleep for each event's recorded duration during playback.
    #[serde(default)]
    pub realtime_playback: bool,

    /// Directory to write RDP relay-log files into.
    #[serde(default)]
    pub relay_export_dir: Option<String>,

    /// Stop at the first record that fails instead of skipping it.
    #[serde(default)]
    pub fail_fast: bool,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("SDM").try_parsing(true))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.query_log_path, "SDM_QUERY_LOG_PATH")?;
        if let Some(path) = &self.log_private_key_file {
            ensure_non_empty(path, "SDM_LOG_PRIVATE_KEY_FILE")?;
        }
        if let Some(dir) = &self.relay_export_dir {
            ensure_non_empty(dir, "SDM_RELAY_EXPORT_DIR")?;
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
