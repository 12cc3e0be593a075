//! Device discovery: ask the scanner program which devices it can see.
//!
//! `scanimage -L` prints one line per device:
//!
//! ```text
//! device `airscan:e0:Canon MF240' is a eSCL Canon MF240 ip=192.168.1.20
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::info;

use crate::model::DeviceHandle;
use crate::process::{self, RunError};

static DEVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"device\s+(.+?)\s+is\s+(.+)").expect("device line pattern is valid")
});

/// Why devices could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("{0} not found")]
    ToolNotFound(String),

    #[error("device listing timed out")]
    Timeout,

    #[error("{0}")]
    NonZeroExit(String),

    #[error("{0}")]
    SpawnFailed(String),
}

/// Something that can enumerate scanners.
pub trait DeviceDirectory: Send + Sync {
    fn list_devices(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, DirectoryError>;
}

/// Device directory backed by `scanimage -L`.
#[derive(Debug, Clone)]
pub struct Scanimage {
    program: String,
}

impl Scanimage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DeviceDirectory for Scanimage {
    fn list_devices(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, DirectoryError> {
        let output = process::run_with_timeout(&self.program, ["-L"], timeout).map_err(|e| {
            match e {
                RunError::NotFound(program) => DirectoryError::ToolNotFound(program),
                RunError::TimedOut { .. } => DirectoryError::Timeout,
                other => DirectoryError::SpawnFailed(other.to_string()),
            }
        })?;

        if !output.success() {
            let message = output
                .error_text()
                .map_or_else(|| format!("{} -L failed", self.program), str::to_string);
            return Err(DirectoryError::NonZeroExit(message));
        }

        let devices = parse_device_list(&output.stdout);
        info!(count = devices.len(), "listed scanners");
        Ok(devices)
    }
}

/// Parse `scanimage -L` output. Duplicates and blank identifiers are dropped;
/// order is preserved.
pub fn parse_device_list(output: &str) -> Vec<DeviceHandle> {
    let mut devices: Vec<DeviceHandle> = Vec::new();
    for line in output.lines() {
        let Some(caps) = DEVICE_LINE.captures(line) else {
            continue;
        };
        let id = caps[1].trim().trim_matches(|c| matches!(c, '`' | '\'' | '"'));
        let name = caps[2].trim();
        if id.is_empty() || devices.iter().any(|d| d.id == id) {
            continue;
        }
        devices.push(DeviceHandle::new(id, name));
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_listing() {
        let output = "\
device `airscan:e0:Canon MF240' is a eSCL Canon MF240 ip=192.168.1.20
device `v4l:/dev/video0' is a Noname Integrated Camera virtual device
";
        let devices = parse_device_list(output);
        assert_eq!(
            devices,
            vec![
                DeviceHandle::new(
                    "airscan:e0:Canon MF240",
                    "a eSCL Canon MF240 ip=192.168.1.20"
                ),
                DeviceHandle::new("v4l:/dev/video0", "a Noname Integrated Camera virtual device"),
            ]
        );
    }

    #[test]
    fn skips_noise_and_duplicates() {
        let output = "\
No scanners were identified. If you were expecting something different,
device `test:0' is a Noname frontend-tester virtual device
device `test:0' is a Noname frontend-tester virtual device
device `' is nothing
";
        let devices = parse_device_list(output);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "test:0");
    }

    #[test]
    fn empty_output_has_no_devices() {
        assert!(parse_device_list("").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn missing_tool_is_reported() {
        let dir = Scanimage::new("definitely-not-scanimage-xyz");
        assert_eq!(
            dir.list_devices(Duration::from_secs(1)).unwrap_err(),
            DirectoryError::ToolNotFound("definitely-not-scanimage-xyz".into())
        );
    }
}
