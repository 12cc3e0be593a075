//! Scan jobs, their outcomes, and the session totals they feed.

use std::path::PathBuf;

use super::{ColorMode, DeviceHandle, ImageFormat, ScanSource};

/// A fully resolved scan, ready to hand to the executor.
///
/// Built fresh for every attempt. Settings edited while a job runs
/// only affect the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanJob {
    pub device: DeviceHandle,
    pub target_path: PathBuf,
    pub format: ImageFormat,
    pub resolution_dpi: u32,
    pub mode: ColorMode,
    pub source: ScanSource,
    pub extra_arg_tokens: Vec<String>,
}

/// What one scan attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub success: bool,
    pub path: Option<PathBuf>,

    /// Size of the written file. `None` when it couldn't be stat'ed.
    pub size_bytes: Option<u64>,

    pub duration_seconds: f64,
    pub error_message: Option<String>,
}

impl ScanOutcome {
    pub fn succeeded(path: PathBuf, size_bytes: Option<u64>, duration_seconds: f64) -> Self {
        Self {
            success: true,
            path: Some(path),
            size_bytes,
            duration_seconds,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            success: false,
            path: None,
            size_bytes: None,
            duration_seconds,
            error_message: Some(message.into()),
        }
    }
}

/// Running totals for the current session.
///
/// Only successful scans are counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub scan_count: u64,
    pub total_bytes: u64,
    pub total_seconds: f64,
    pub last_outcome: Option<ScanOutcome>,
}

impl SessionStats {
    /// Fold a successful outcome into the totals. Failures are ignored.
    pub fn record(&mut self, outcome: &ScanOutcome) {
        if !outcome.success {
            return;
        }
        self.scan_count += 1;
        if let Some(bytes) = outcome.size_bytes {
            self.total_bytes += bytes;
        }
        self.total_seconds += outcome.duration_seconds;
        self.last_outcome = Some(outcome.clone());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mean seconds per scan, if anything has been scanned.
    #[allow(clippy::cast_precision_loss)] // Scan counts never approach 2^52.
    pub fn average_seconds(&self) -> Option<f64> {
        (self.scan_count > 0).then(|| self.total_seconds / self.scan_count as f64)
    }
}
