//! The scan session: one device, one scan at a time, numbered output.
//!
//! `ScanController` owns everything that changes during a session: the
//! stage, the in-flight and queued flags, the last error, running totals,
//! and the operator's settings. All of it sits behind one mutex that is
//! only ever held briefly. Calls to the scanner and device directory, and
//! all file writes, happen with the lock released so the UI can keep
//! reading snapshots while a page is being scanned.
//!
//! The in-flight flag is the only thing standing between two overlapping
//! requests and two commands hitting the same physical device. A request
//! that arrives while a scan runs sets a single queued flag (not a counter)
//! and returns immediately; the running cycle picks it up when it finishes.

mod activity;
mod settings;
mod snapshot;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use jiff::Timestamp;
use tracing::{info, warn};

use crate::config::Timeouts;
use crate::device::{DeviceDirectory, DirectoryError};
use crate::disk::format_bytes;
use crate::executor::{ExecutorError, ScanExecutor};
use crate::job;
use crate::model::{DeviceHandle, HistoryRecord, ScanOutcome, ScanSettings, SessionStats, Stage};
use crate::naming;
use crate::storage::Storage;

pub use activity::{ActivityLevel, ActivityLine};
pub use snapshot::{ControllerState, SessionSnapshot};

use activity::ActivityLog;

/// Errors returned directly to the caller (as opposed to recorded as `last_error`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("No scanner selected")]
    NoDeviceSelected,
}

/// What `request_scan` did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRequest {
    /// Not on the scan screen; nothing happened.
    Ignored,

    /// A scan is running; this request will run right after it.
    Queued,

    /// A scan is running and one is already queued; this request was dropped.
    AlreadyQueued,

    /// This call ran one or more cycles to completion.
    Ran { completed: u32, failed: bool },
}

/// Session state guarded by the controller's mutex.
#[derive(Debug, Default)]
struct Inner {
    stage: Stage,
    active_scan_in_flight: bool,
    queued_scan_requested: bool,
    last_error: Option<String>,
    stats: SessionStats,
    settings: ScanSettings,
    devices: Vec<DeviceHandle>,
    selected_device: Option<String>,
    refreshing: bool,
    status: String,
    last_saved: Option<PathBuf>,
    last_scan_at: Option<Timestamp>,
    activity: ActivityLog,
}

impl Inner {
    fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.activity.error(format!("Last error: {message}"));
        self.last_error = Some(message);
    }

    /// The handle for the selected device. Ids that aren't in the current
    /// list still get a handle, named after the id.
    fn selected_handle(&self) -> Option<DeviceHandle> {
        let id = self.selected_device.as_ref()?;
        Some(
            self.devices
                .iter()
                .find(|d| &d.id == id)
                .cloned()
                .unwrap_or_else(|| DeviceHandle::new(id.clone(), id.clone())),
        )
    }
}

/// Drives scan sessions. Share it as `Arc<ScanController>`.
pub struct ScanController {
    storage: Storage,
    directory: Box<dyn DeviceDirectory>,
    executor: Box<dyn ScanExecutor>,
    timeouts: Timeouts,
    inner: Mutex<Inner>,

    /// Serializes settings writes so the newest settings are always written last.
    persist: Mutex<()>,
}

impl ScanController {
    /// Starts a session with settings loaded from `storage`.
    pub fn new(
        storage: Storage,
        directory: Box<dyn DeviceDirectory>,
        executor: Box<dyn ScanExecutor>,
        timeouts: Timeouts,
    ) -> Self {
        let settings = storage.load_settings();
        let inner = Inner {
            settings,
            status: "Select a scanner".to_string(),
            ..Inner::default()
        };
        Self {
            storage,
            directory,
            executor,
            timeouts,
            inner: Mutex::new(inner),
            persist: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current settings. Failures are logged by the store.
    fn persist_settings(&self) {
        let _guard = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        let settings = self.lock().settings.clone();
        self.storage.save_settings(&settings);
    }

    // ── Devices ──

    /// Re-list devices.
    ///
    /// Preselects the remembered device when present, else keeps the
    /// current choice, else picks the first. With auto-continue on and
    /// exactly one device found, moves straight to the scan screen, but
    /// only from device selection.
    pub fn refresh_devices(&self) -> Result<usize, DirectoryError> {
        {
            let mut inner = self.lock();
            if inner.refreshing {
                return Ok(inner.devices.len());
            }
            inner.refreshing = true;
            inner.status = "Refreshing scanners…".to_string();
            inner.activity.info("Scanning for devices…");
        }

        let result = self.directory.list_devices(self.timeouts.list);

        let mut inner = self.lock();
        inner.refreshing = false;
        let devices = match result {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "device listing failed");
                inner.status = "Device listing failed".to_string();
                inner.set_error(e.to_string());
                return Err(e);
            }
        };

        let count = devices.len();
        if devices.is_empty() {
            inner.devices.clear();
            inner.selected_device = None;
            inner.status = "No scanners found".to_string();
            inner.activity.warn("No scanners detected.");
            return Ok(0);
        }

        let remembered = inner.settings.last_device_id.clone();
        let current = inner.selected_device.clone();
        let in_list = |id: &Option<String>| {
            id.as_ref()
                .filter(|id| devices.iter().any(|d| &d.id == *id))
                .cloned()
        };
        inner.selected_device = in_list(&remembered)
            .or_else(|| in_list(&current))
            .or_else(|| devices.first().map(|d| d.id.clone()));
        inner.devices = devices;
        inner.status = format!("Found {count} scanner(s)");
        inner.activity.info(format!("Found {count} scanner(s)."));

        if inner.settings.auto_continue_on_single_device
            && count == 1
            && inner.stage == Stage::SelectingDevice
        {
            inner.stage = Stage::Ready;
            inner.status = "Ready".to_string();
            info!("single scanner found, continuing automatically");
        }
        Ok(count)
    }

    /// Choose a device tentatively. It is remembered for the next session.
    pub fn select_device(&self, id: &str) {
        {
            let mut inner = self.lock();
            inner.selected_device = Some(id.to_string());
            inner.settings.last_device_id = Some(id.to_string());
        }
        self.persist_settings();
    }

    /// Move to the scan screen with the selected device.
    pub fn confirm_device(&self) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        let Some(device) = inner.selected_handle() else {
            inner.activity.error("Select a scanner first.");
            return Err(ControllerError::NoDeviceSelected);
        };
        inner.stage = Stage::Ready;
        inner.status = "Ready".to_string();
        inner.activity.info(format!("Using {}", device.label()));
        Ok(())
    }

    /// Go back to device selection. A running scan is not affected.
    pub fn back(&self) {
        let mut inner = self.lock();
        inner.stage = Stage::SelectingDevice;
        if !inner.active_scan_in_flight {
            inner.status = "Select a scanner".to_string();
        }
    }

    // ── Scanning ──

    /// Ask for a scan.
    ///
    /// If nothing is running, runs a scan cycle on the calling thread and,
    /// if a request was queued meanwhile, the queued one too. If a scan is
    /// running, queues at most one follow-up and returns at once.
    pub fn request_scan(&self) -> ScanRequest {
        {
            let mut inner = self.lock();
            if inner.stage != Stage::Ready {
                return ScanRequest::Ignored;
            }
            if inner.active_scan_in_flight {
                if inner.queued_scan_requested {
                    inner.activity.warn("Scan already queued.");
                    return ScanRequest::AlreadyQueued;
                }
                inner.queued_scan_requested = true;
                inner.activity.warn("Queued one scan.");
                return ScanRequest::Queued;
            }
            inner.active_scan_in_flight = true;
        }

        let mut in_flight = InFlight {
            controller: self,
            released: false,
        };
        let mut completed = 0;
        loop {
            let ok = self.run_cycle();
            if ok {
                completed += 1;
            }

            // The queue check and the release of the in-flight flag happen
            // under one lock, so a request can't slip in between them.
            let mut inner = self.lock();
            if inner.queued_scan_requested {
                inner.queued_scan_requested = false;
                if ok && inner.stage == Stage::Ready {
                    inner.activity.info("Queued scan starting…");
                    continue;
                }
                inner.activity.warn("Queued scan dropped.");
            }
            inner.active_scan_in_flight = false;
            if ok {
                inner.status = "Ready for next page".to_string();
            }
            in_flight.released = true;
            return ScanRequest::Ran {
                completed,
                failed: !ok,
            };
        }
    }

    /// One scan: build, execute, record. Returns whether it succeeded.
    fn run_cycle(&self) -> bool {
        let (settings, device) = {
            let mut inner = self.lock();
            let sanitized = naming::sanitize_prefix(&inner.settings.prefix);
            if sanitized != inner.settings.prefix {
                inner.settings.prefix = sanitized;
                inner.activity.warn("Prefix sanitized.");
            }
            (inner.settings.clone(), inner.selected_handle())
        };

        let job = match job::build(&settings, device.as_ref()) {
            Ok(job) => job,
            Err(e) => {
                warn!(error = %e, "scan not attempted");
                let mut inner = self.lock();
                inner.status = "Scan not started".to_string();
                inner.set_error(e.to_string());
                return false;
            }
        };

        let file_name = job
            .target_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        {
            let mut inner = self.lock();
            inner.status = format!("Scanning {file_name}…");
            inner
                .activity
                .info(format!("Scanning {file_name} on {}", job.device.short_id()));
        }

        let started = Instant::now();
        let report = self
            .executor
            .execute(&job, self.timeouts.scan)
            .and_then(ExecutorError::check);
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, path = %job.target_path.display(), "scan failed");
                let outcome = ScanOutcome::failed(e.to_string(), started.elapsed().as_secs_f64());
                let mut inner = self.lock();
                inner.stats.record(&outcome);
                inner.status = match e {
                    ExecutorError::Timeout => "Scan timed out".to_string(),
                    _ => "Scan failed".to_string(),
                };
                inner.set_error(outcome.error_message.unwrap_or_default());
                return false;
            }
        };

        let size_bytes = fs::metadata(&job.target_path).ok().map(|m| m.len());
        let outcome = ScanOutcome::succeeded(
            job.target_path.clone(),
            size_bytes,
            report.elapsed.as_secs_f64(),
        );
        let now = Timestamp::now();
        let record = HistoryRecord::from_job(&job, &outcome, now);

        {
            let mut inner = self.lock();
            inner.last_error = None;
            inner.stats.record(&outcome);
            inner.last_saved = Some(job.target_path.clone());
            inner.last_scan_at = Some(now);
            inner.status = "Scan complete".to_string();
            let size = size_bytes.map(|b| format!(" ({})", format_bytes(b))).unwrap_or_default();
            inner.activity.success(format!(
                "Saved: {}{size} in {:.2}s",
                job.target_path.display(),
                outcome.duration_seconds
            ));
        }
        info!(
            path = %job.target_path.display(),
            size_bytes,
            seconds = outcome.duration_seconds,
            "scan saved"
        );

        self.storage.append_history(&record);
        self.persist_settings();
        true
    }

    /// Whether the session may end now. Refused while a scan is running,
    /// so its file is recorded before the program exits.
    pub fn request_quit(&self) -> bool {
        let mut inner = self.lock();
        if inner.active_scan_in_flight {
            inner
                .activity
                .warn("Scan in progress. Quit again once it finishes.");
            return false;
        }
        true
    }

    // ── Session bookkeeping ──

    /// Zero the running totals. Safe while a scan runs.
    pub fn reset_stats(&self) {
        let mut inner = self.lock();
        inner.stats.reset();
        inner.activity.info("Session totals reset.");
    }

    pub fn clear_last_error(&self) {
        self.lock().last_error = None;
    }

    pub fn clear_log(&self) {
        let mut inner = self.lock();
        inner.activity.clear();
        inner.activity.info("Log cleared.");
    }

    /// Add an operator-facing note to the activity log.
    pub fn note(&self, level: ActivityLevel, text: impl Into<String>) {
        self.lock().activity.push(level, text.into());
    }

    // ── Desktop integration ──

    /// Open the last saved scan in the desktop's default viewer.
    pub fn open_last_scan(&self) {
        let last = self.lock().last_saved.clone();
        match last.filter(|p| p.exists()) {
            Some(path) => self.open_with_desktop(path),
            None => self.note(ActivityLevel::Warn, "No last scan to open."),
        }
    }

    /// Open the output directory in the desktop's file manager.
    pub fn open_output_dir(&self) {
        let dir = self.lock().settings.output_dir.clone();
        if dir.as_os_str().is_empty() {
            self.note(ActivityLevel::Warn, "Output directory not set.");
            return;
        }
        self.open_with_desktop(job::expand_home(&dir));
    }

    fn open_with_desktop(&self, path: PathBuf) {
        match spawn_reaped(OPENER, &path) {
            Ok(_) => self.note(
                ActivityLevel::Success,
                format!("Opened: {}", path.display()),
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.note(ActivityLevel::Error, format!("{OPENER} not found."));
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to open");
                self.note(ActivityLevel::Error, format!("Failed to open: {e}"));
            }
        }
    }
}

/// Desktop opener for files and folders.
const OPENER: &str = "xdg-open";

/// Start `program arg` in the background and wait for it on its own thread,
/// so the finished process doesn't linger as a zombie.
fn spawn_reaped(program: &str, arg: &Path) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new(program)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

/// Releases the in-flight flag if a cycle unwinds before releasing it itself.
struct InFlight<'a> {
    controller: &'a ScanController,
    released: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mut inner = self.controller.lock();
        inner.active_scan_in_flight = false;
        inner.queued_scan_requested = false;
    }
}
