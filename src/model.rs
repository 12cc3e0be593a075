//! Core data model for the scan session.
//!
//! Settings are the only mutable record the user edits directly.
//! Jobs, outcomes, and history records are values: built once, read, dropped
//! (or appended to the history log, which is never rewritten).

mod device;
mod history;
mod scan;
mod settings;

pub use device::DeviceHandle;
pub use history::HistoryRecord;
pub use scan::{ScanJob, ScanOutcome, SessionStats};
pub use settings::{ColorMode, ImageFormat, Preset, ScanSettings, ScanSource};

/// Which screen of the session the operator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Choosing a scanner. No scan may run here.
    #[default]
    SelectingDevice,

    /// A device is confirmed and scans can be requested.
    Ready,
}
