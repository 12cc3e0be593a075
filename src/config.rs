//! Runtime configuration.
//!
//! Resolved once at startup from command-line flags and environment
//! variables. Scan settings the operator edits live in the storage layer,
//! not here.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::storage::Storage;

/// Default bound on a single scan.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(120);

/// Default bound on device discovery.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(12);

/// How long external calls may take before they are abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub scan: Duration,
    pub list: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            scan: DEFAULT_SCAN_TIMEOUT,
            list: DEFAULT_LIST_TIMEOUT,
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Holds `settings.toml`, `history.jsonl`, and the log file.
    pub config_dir: PathBuf,

    /// Scanner program, `scanimage` unless overridden.
    pub scanner: String,

    pub timeouts: Timeouts,

    /// `tracing` filter directive, e.g. `info` or `scantui=debug`.
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Build the configuration from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, String> {
        let config_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => Storage::default_root().ok_or("could not determine config directory")?,
        };

        if cli.scan_timeout == 0 || cli.list_timeout == 0 {
            return Err("timeouts must be at least one second".into());
        }

        Ok(Self {
            config_dir,
            scanner: cli.scanner.clone(),
            timeouts: Timeouts {
                scan: Duration::from_secs(cli.scan_timeout),
                list: Duration::from_secs(cli.list_timeout),
            },
            log_filter: cli.log_level.clone(),
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.config_dir.join("scantui.log")
    }
}
