mod cli;
mod config;
mod controller;
mod device;
mod disk;
mod executor;
mod job;
mod logging;
mod model;
mod naming;
mod process;
mod storage;
mod tui;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use config::AppConfig;
use controller::ScanController;
use storage::Storage;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match logging::init(&config.log_path(), config.log_filter.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let storage = Storage::new(config.config_dir.clone());

    let result = match &cli.command {
        Some(command) => cli::run(command, &config, &storage),
        None => run_session(&config, storage),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting with error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_session(config: &AppConfig, storage: Storage) -> Result<(), String> {
    info!(scanner = %config.scanner, dir = %config.config_dir.display(), "session starting");
    let controller = Arc::new(ScanController::new(
        storage,
        Box::new(device::Scanimage::new(config.scanner.clone())),
        Box::new(executor::Scanimage::new(config.scanner.clone())),
        config.timeouts,
    ));
    tui::run(controller).map_err(|e| format!("terminal error: {e}"))
}
