//! Output file naming: prefix sanitization and sequential numbering.
//!
//! Files are named `{prefix}_{index:04}.{ext}`. The next index is one past the
//! highest index already present in the output directory, so deleting a file in
//! the middle of a run never causes a later scan to overwrite anything.

use std::fs;
use std::path::{Path, PathBuf};

use jiff::civil::Date;
use regex::Regex;
use tracing::debug;

/// Characters trimmed from both ends of a sanitized prefix.
const EDGE_CHARS: &[char] = &['.', '_', '-'];

/// Make a user-entered prefix safe to use as a file name stem.
///
/// Whitespace and path separators become `_`, runs of anything outside
/// `[A-Za-z0-9._-]` collapse to a single `_`, and separator characters are
/// trimmed from the ends. Applying it twice gives the same result as once.
pub fn sanitize_prefix(raw: &str) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut cleaned = String::with_capacity(replaced.len());
    let mut in_disallowed_run = false;
    for c in replaced.chars() {
        if c.is_ascii_alphanumeric() || EDGE_CHARS.contains(&c) {
            cleaned.push(c);
            in_disallowed_run = false;
        } else if !in_disallowed_run {
            cleaned.push('_');
            in_disallowed_run = true;
        }
    }

    cleaned.trim_matches(EDGE_CHARS).to_string()
}

/// The next free index for `prefix` and `extension` in `directory`.
///
/// Looks at regular files directly inside `directory` whose names match
/// `{prefix}_NNNN*.{extension}` (case-insensitive) and returns one more than
/// the largest `NNNN`. Indices of five or more digits are read whole, so a
/// run past 9999 keeps counting up. Returns 1 when the directory is missing or nothing
/// matches. Never creates the directory.
pub fn next_index(prefix: &str, directory: &Path, extension: &str) -> u32 {
    let pattern = format!(
        r"(?i)^{}_([0-9]{{4,}}).*\.{}$",
        regex::escape(prefix),
        regex::escape(extension)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return 1;
    };

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %directory.display(), error = %e, "output directory not readable");
            return 1;
        }
    };

    let max = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            re.captures(name)?.get(1)?.as_str().parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);

    max + 1
}

/// Format a file name. Indices past 9999 simply grow wider.
pub fn file_name(prefix: &str, index: u32, extension: &str) -> String {
    format!("{prefix}_{index:04}.{extension}")
}

/// `YYYYMMDD`, for using the date as a prefix.
pub fn date_prefix(date: Date) -> String {
    date.strftime("%Y%m%d").to_string()
}

/// Whether a directory name looks like `YYYY-MM-DD`.
pub fn is_date_dir(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// `base/YYYY-MM-DD`. A trailing date component on `base` is replaced, not nested.
pub fn dated_dir(base: &Path, date: Date) -> PathBuf {
    let is_dated = base
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_date_dir);
    let root = if is_dated {
        base.parent().unwrap_or(base)
    } else {
        base
    };
    root.join(date.strftime("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn sanitize_replaces_separators_and_spaces() {
        assert_eq!(sanitize_prefix("  my scans/2024 "), "my_scans_2024");
        assert_eq!(sanitize_prefix(r"a\b"), "a_b");
    }

    #[test]
    fn sanitize_collapses_disallowed_runs() {
        assert_eq!(sanitize_prefix("tax*&^return"), "tax_return");
        assert_eq!(sanitize_prefix("café"), "caf");
    }

    #[test]
    fn sanitize_trims_edge_separators() {
        assert_eq!(sanitize_prefix("..-_doc_-.."), "doc");
        assert_eq!(sanitize_prefix("///"), "");
        assert_eq!(sanitize_prefix(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "scan",
            "  hello world  ",
            "../etc/passwd",
            "a**b",
            "ünïcödé",
            "-_.",
            "x y\tz",
            "2024-01-01 receipts (old)",
            "__init__",
        ];
        for input in inputs {
            let once = sanitize_prefix(input);
            assert_eq!(sanitize_prefix(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn next_index_after_a_run_of_files() {
        let dir = TempDir::new().unwrap();
        for i in 1..=37 {
            touch(dir.path(), &file_name("p", i, "png"));
        }
        assert_eq!(next_index("p", dir.path(), "png"), 38);
    }

    #[test]
    fn next_index_empty_or_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(next_index("p", dir.path(), "png"), 1);

        let missing = dir.path().join("missing");
        assert_eq!(next_index("p", &missing, "png"), 1);
        assert!(!missing.exists());
    }

    #[test]
    fn next_index_uses_max_not_count() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "doc_0002.png");
        touch(dir.path(), "doc_0010.png");
        assert_eq!(next_index("doc", dir.path(), "png"), 11);
    }

    #[test]
    fn next_index_ignores_other_prefixes_and_extensions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "doc_0005.jpg");
        touch(dir.path(), "docs_0009.png");
        touch(dir.path(), "other_0020.png");
        touch(dir.path(), "doc_12.png");
        assert_eq!(next_index("doc", dir.path(), "png"), 1);
    }

    #[test]
    fn next_index_is_case_insensitive_and_allows_suffixes() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "DOC_0004.PNG");
        touch(dir.path(), "doc_0007-edited.png");
        assert_eq!(next_index("doc", dir.path(), "png"), 8);
    }

    #[test]
    fn next_index_continues_past_four_digits() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "doc_9999.png");
        touch(dir.path(), "doc_10000.png");
        assert_eq!(next_index("doc", dir.path(), "png"), 10001);
        assert_eq!(file_name("doc", 10001, "png"), "doc_10001.png");
    }

    #[test]
    fn next_index_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("doc_0050.png")).unwrap();
        touch(dir.path(), "doc_0003.png");
        assert_eq!(next_index("doc", dir.path(), "png"), 4);
    }

    #[test]
    fn prefix_is_matched_literally() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "aXb_0009.png");
        assert_eq!(next_index("a.b", dir.path(), "png"), 1);
    }

    #[test]
    fn file_names_pad_to_four_digits() {
        assert_eq!(file_name("doc", 1, "png"), "doc_0001.png");
        assert_eq!(file_name("doc", 12345, "jpg"), "doc_12345.jpg");
    }

    #[test]
    fn date_helpers() {
        let d = date(2024, 3, 9);
        assert_eq!(date_prefix(d), "20240309");
        assert!(is_date_dir("2024-03-09"));
        assert!(!is_date_dir("2024-3-9"));
        assert_eq!(
            dated_dir(Path::new("/tmp/scans"), d),
            PathBuf::from("/tmp/scans/2024-03-09")
        );
        assert_eq!(
            dated_dir(Path::new("/tmp/scans/2024-01-01"), d),
            PathBuf::from("/tmp/scans/2024-03-09")
        );
    }
}
