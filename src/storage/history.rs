//! History storage: append and load completed scans.

use std::{fs, io};

// Traits must be in scope for `.lines()` on BufReader and `.write_all()` on File.
use io::{BufRead, Write};

use tracing::warn;

use crate::model::HistoryRecord;

use super::{Result, Storage};

impl Storage {
    /// Appends a record to the history log, logging instead of failing.
    pub fn append_history(&self, record: &HistoryRecord) {
        if let Err(e) = self.try_append_history(record) {
            warn!(path = %self.history_path().display(), error = %e, "failed to append history");
        }
    }

    /// Appends a record as one JSON line. Existing lines are never touched.
    pub fn try_append_history(&self, record: &HistoryRecord) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Loads all history records, oldest first.
    ///
    /// Lines that don't parse are skipped with a warning rather than
    /// hiding the rest of the log.
    pub fn load_history(&self) -> Result<Vec<HistoryRecord>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(path)?;
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = number + 1, error = %e, "skipping malformed history line"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::model::{ColorMode, ImageFormat, ScanSource};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("scan_tui"));
        (dir, storage)
    }

    fn sample_record(name: &str) -> HistoryRecord {
        HistoryRecord {
            timestamp: Timestamp::new(1_700_000_000, 0).unwrap(),
            file_path: PathBuf::from(format!("/tmp/scans/{name}")),
            size_bytes: Some(2048),
            duration_seconds: 1.5,
            device_id: "test:0".into(),
            format: ImageFormat::Png,
            resolution_dpi: 300,
            mode: ColorMode::Gray,
            source: ScanSource::Unspecified,
        }
    }

    #[test]
    fn load_history_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_history().unwrap().is_empty());
    }

    #[test]
    fn append_and_load_history() {
        let (_dir, storage) = test_storage();
        storage.append_history(&sample_record("doc_0001.png"));
        storage.append_history(&sample_record("doc_0002.png"));

        let records = storage.load_history().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], sample_record("doc_0001.png"));
        assert_eq!(records[1].file_path, PathBuf::from("/tmp/scans/doc_0002.png"));
    }

    #[test]
    fn append_never_rewrites_existing_lines() {
        let (_dir, storage) = test_storage();
        storage.append_history(&sample_record("doc_0001.png"));
        let before = fs::read_to_string(storage.history_path()).unwrap();

        storage.append_history(&sample_record("doc_0002.png"));
        let after = fs::read_to_string(storage.history_path()).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!(after.lines().count(), 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (_dir, storage) = test_storage();
        storage.append_history(&sample_record("doc_0001.png"));
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(storage.history_path())
            .unwrap();
        file.write_all(b"{not json}\n").unwrap();
        storage.append_history(&sample_record("doc_0002.png"));

        assert_eq!(storage.load_history().unwrap().len(), 2);
    }

    #[test]
    fn records_use_camel_case_keys() {
        let json = serde_json::to_string(&sample_record("doc_0001.png")).unwrap();
        assert!(json.contains("\"filePath\""));
        assert!(json.contains("\"durationSeconds\":1.5"));
        assert!(json.contains("\"source\":\"\""));
    }
}
