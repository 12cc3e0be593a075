//! Command-line interface.
//!
//! With no subcommand the interactive session starts. The subcommands are
//! non-interactive helpers that read the same settings and history the
//! session writes.

mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::device::{DeviceDirectory, Scanimage};
use crate::job;
use crate::storage::Storage;

use format::format_history_record;

/// Scan pages into numbered files from the terminal.
#[derive(Debug, Parser)]
#[command(name = "scantui", version, after_long_help = KEYS_HELP)]
pub struct Cli {
    /// Directory for settings, history, and the log file.
    /// Defaults to `<config dir>/scan_tui`.
    #[arg(long, env = "SCANTUI_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Scanner program to run.
    #[arg(long, env = "SCANTUI_SCANNER", default_value = "scanimage", global = true)]
    pub scanner: String,

    /// Seconds before a scan is abandoned.
    #[arg(long, default_value_t = 120, global = true)]
    pub scan_timeout: u64,

    /// Seconds before device discovery is abandoned.
    #[arg(long, default_value_t = 12, global = true)]
    pub list_timeout: u64,

    /// Log filter, e.g. `debug` or `scantui=trace`. Overrides `SCANTUI_LOG`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

const KEYS_HELP: &str = r"Session keys:
  Select screen   ↑↓ choose  ⏎ continue  r refresh  u auto-continue  q quit
  Scan screen     space/⏎ scan  b back  p prefix  o output dir  e extra args
                  t date prefix  y date dir  1/2/3 presets  g gray  d dpi
                  s source  m format  a advanced  x clear error  z reset stats
                  c clear log  v open last  w open dir  q quit";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List detected scanners, one per line: `<id>\t<name>`.
    Devices,

    /// Show recently completed scans.
    History {
        /// How many records to show, newest last.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the file the next scan would be written to.
    Next,
}

/// Run a subcommand, returning an error message on failure.
pub fn run(command: &Command, config: &AppConfig, storage: &Storage) -> Result<(), String> {
    match command {
        Command::Devices => cmd_devices(config),
        Command::History { limit } => cmd_history(storage, *limit),
        Command::Next => cmd_next(storage),
    }
}

fn cmd_devices(config: &AppConfig) -> Result<(), String> {
    let devices = Scanimage::new(&config.scanner)
        .list_devices(config.timeouts.list)
        .map_err(|e| format!("failed to list devices: {e}"))?;

    if devices.is_empty() {
        println!("No scanners found");
        return Ok(());
    }

    for d in &devices {
        println!("{}\t{}", d.id, d.display_name);
    }
    Ok(())
}

fn cmd_history(storage: &Storage, limit: usize) -> Result<(), String> {
    let records = storage
        .load_history()
        .map_err(|e| format!("failed to read history: {e}"))?;

    if records.is_empty() {
        println!("No scans recorded");
        return Ok(());
    }

    let skip = records.len().saturating_sub(limit);
    for record in &records[skip..] {
        println!("{}", format_history_record(record));
    }
    Ok(())
}

fn cmd_next(storage: &Storage) -> Result<(), String> {
    let settings = storage.load_settings();
    let path = job::preview_path(&settings).ok_or("prefix is empty after sanitizing")?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["scantui"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn history_limit_defaults_to_twenty() {
        let cli = Cli::try_parse_from(["scantui", "history"]).unwrap();
        assert!(matches!(cli.command, Some(Command::History { limit: 20 })));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["scantui", "devices", "--list-timeout", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Devices)));
        assert_eq!(cli.list_timeout, 3);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
