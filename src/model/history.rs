//! History records: one line per completed scan.

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{ColorMode, ImageFormat, ScanJob, ScanOutcome, ScanSource};

/// A completed scan, as written to the history log.
///
/// Written once and never updated. Failed scans are not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub timestamp: Timestamp,
    pub file_path: PathBuf,
    pub size_bytes: Option<u64>,
    pub duration_seconds: f64,
    pub device_id: String,
    pub format: ImageFormat,
    pub resolution_dpi: u32,
    pub mode: ColorMode,
    pub source: ScanSource,
}

impl HistoryRecord {
    /// Describe a finished job. Duration is rounded to milliseconds.
    pub fn from_job(job: &ScanJob, outcome: &ScanOutcome, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            file_path: job.target_path.clone(),
            size_bytes: outcome.size_bytes,
            duration_seconds: (outcome.duration_seconds * 1000.0).round() / 1000.0,
            device_id: job.device.id.clone(),
            format: job.format,
            resolution_dpi: job.resolution_dpi,
            mode: job.mode,
            source: job.source,
        }
    }
}
