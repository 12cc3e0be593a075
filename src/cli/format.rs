//! Output formatting for CLI display.

use crate::disk::format_bytes;
use crate::model::HistoryRecord;

/// One history line: `2024-03-09T10:15:00Z  /tmp/scans/doc_0001.png  2.0 KB  1.50s  300dpi Gray png`.
pub(super) fn format_history_record(record: &HistoryRecord) -> String {
    let size = record
        .size_bytes
        .map_or_else(|| "-".to_string(), format_bytes);
    let dpi = if record.resolution_dpi == 0 {
        "auto".to_string()
    } else {
        format!("{}dpi", record.resolution_dpi)
    };
    format!(
        "{}  {}  {size}  {:.2}s  {dpi} {} {}",
        record.timestamp,
        record.file_path.display(),
        record.duration_seconds,
        record.mode.label(),
        record.format.as_str(),
    )
}
