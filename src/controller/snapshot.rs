//! Read-only views of the session for rendering.

use std::path::PathBuf;

use jiff::Timestamp;

use crate::disk;
use crate::job;
use crate::model::{DeviceHandle, ScanSettings, SessionStats, Stage};

use super::{ActivityLine, ScanController};

/// The controller's own state flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub stage: Stage,
    pub active_scan_in_flight: bool,
    pub queued_scan_requested: bool,
    pub last_error: Option<String>,
}

/// Everything a renderer needs, copied out so the lock isn't held while drawing.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: ControllerState,
    pub stats: SessionStats,
    pub settings: ScanSettings,
    pub devices: Vec<DeviceHandle>,
    pub selected_device: Option<DeviceHandle>,
    pub refreshing: bool,
    pub status: String,
    pub last_saved: Option<PathBuf>,
    pub last_scan_at: Option<Timestamp>,
    pub activity: Vec<ActivityLine>,

    /// Where the next scan would go, if the prefix is usable.
    pub next_file: Option<PathBuf>,

    /// Free bytes where the output directory lives.
    pub free_space: Option<u64>,
}

impl ScanController {
    /// Copy of the current state. Never waits on a running scan.
    pub fn current_state(&self) -> SessionSnapshot {
        let mut snapshot = {
            let inner = self.lock();
            SessionSnapshot {
                state: ControllerState {
                    stage: inner.stage,
                    active_scan_in_flight: inner.active_scan_in_flight,
                    queued_scan_requested: inner.queued_scan_requested,
                    last_error: inner.last_error.clone(),
                },
                stats: inner.stats.clone(),
                settings: inner.settings.clone(),
                devices: inner.devices.clone(),
                selected_device: inner.selected_handle(),
                refreshing: inner.refreshing,
                status: inner.status.clone(),
                last_saved: inner.last_saved.clone(),
                last_scan_at: inner.last_scan_at,
                activity: inner.activity.lines(),
                next_file: None,
                free_space: None,
            }
        };

        // Directory reads happen after the lock is released.
        snapshot.next_file = job::preview_path(&snapshot.settings);
        snapshot.free_space = disk::free_space(&job::expand_home(&snapshot.settings.output_dir));
        snapshot
    }
}
