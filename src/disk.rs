//! Free-space queries and byte formatting.

use std::path::Path;

/// Bytes available to unprivileged users on the filesystem holding `dir`.
///
/// A directory that doesn't exist yet is measured through its parent.
/// Returns `None` when neither exists or the query fails.
pub fn free_space(dir: &Path) -> Option<u64> {
    let probe = if dir.exists() {
        dir
    } else {
        dir.parent().filter(|p| p.exists())?
    };
    available_bytes(probe)
}

#[cfg(unix)]
fn available_bytes(path: &Path) -> Option<u64> {
    let stat = rustix::fs::statvfs(path).ok()?;
    Some(stat.f_bavail.saturating_mul(stat.f_frsize))
}

#[cfg(not(unix))]
fn available_bytes(_path: &Path) -> Option<u64> {
    None
}

/// `1.5 KB`, `300.0 MB`, with one decimal and 1024-based units.
#[allow(clippy::cast_precision_loss)] // Display only.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} PB")
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn formats_across_units() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1536 * 1024), "1.5 MB");
        assert_eq!(format_bytes(1024_u64.pow(5) * 3), "3.0 PB");
    }

    #[cfg(unix)]
    #[test]
    fn missing_dir_measured_through_parent() {
        let dir = TempDir::new().unwrap();
        assert!(free_space(dir.path()).is_some());
        assert!(free_space(&dir.path().join("not-yet")).is_some());
        assert!(free_space(&dir.path().join("a").join("b")).is_none());
    }
}
