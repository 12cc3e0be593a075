//! Scan job building: turn settings plus a device into a concrete job.
//!
//! Checks run in a fixed order and the first failure wins:
//! device, prefix, output directory, extra arguments.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{DeviceHandle, ScanJob, ScanSettings};
use crate::naming;

/// Used when the output directory setting is blank.
const FALLBACK_OUTPUT_DIR: &str = "./scans";

/// Why a job could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No scanner selected")]
    NoDeviceSelected,

    #[error("Prefix empty")]
    EmptyPrefix,

    #[error("Output directory error: {reason}")]
    OutputDirUnavailable { path: PathBuf, reason: String },

    #[error("Extra options parse error: {0}")]
    MalformedExtraArgs(String),
}

/// Builds the job for the next scan.
///
/// Creates the output directory if needed; that is the only side effect.
pub fn build(
    settings: &ScanSettings,
    device: Option<&DeviceHandle>,
) -> Result<ScanJob, ValidationError> {
    let device = device.ok_or(ValidationError::NoDeviceSelected)?;

    let prefix = naming::sanitize_prefix(&settings.prefix);
    if prefix.is_empty() {
        return Err(ValidationError::EmptyPrefix);
    }

    let output_dir = ensure_output_dir(&settings.output_dir)?;
    let extra_arg_tokens = split_args(&settings.extra_args)?;

    let extension = settings.format.extension();
    let index = naming::next_index(&prefix, &output_dir, extension);
    let target_path = output_dir.join(naming::file_name(&prefix, index, extension));

    Ok(ScanJob {
        device: device.clone(),
        target_path,
        format: settings.format,
        resolution_dpi: settings.resolution_dpi,
        mode: settings.mode,
        source: settings.source,
        extra_arg_tokens,
    })
}

/// The path the next scan would be written to, without touching the disk.
///
/// A missing directory counts as empty. Returns `None` when the prefix
/// sanitizes to nothing.
pub fn preview_path(settings: &ScanSettings) -> Option<PathBuf> {
    let prefix = naming::sanitize_prefix(&settings.prefix);
    if prefix.is_empty() {
        return None;
    }
    let output_dir = if settings.output_dir.as_os_str().is_empty() {
        PathBuf::from(FALLBACK_OUTPUT_DIR)
    } else {
        expand_home(&settings.output_dir)
    };
    let extension = settings.format.extension();
    let index = naming::next_index(&prefix, &output_dir, extension);
    Some(output_dir.join(naming::file_name(&prefix, index, extension)))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

fn ensure_output_dir(configured: &Path) -> Result<PathBuf, ValidationError> {
    if configured.as_os_str().is_empty() {
        return Err(ValidationError::OutputDirUnavailable {
            path: PathBuf::new(),
            reason: "output directory cannot be empty".into(),
        });
    }
    let dir = expand_home(configured);
    fs::create_dir_all(&dir).map_err(|e| ValidationError::OutputDirUnavailable {
        path: dir.clone(),
        reason: e.to_string(),
    })?;
    Ok(dir)
}

/// Split a string into arguments using POSIX shell quoting.
///
/// Supports single quotes, double quotes (with `\` escaping `"`, `\`, `$`,
/// `` ` `` and newline), and backslash escapes outside quotes. Unbalanced
/// quotes or a trailing backslash are errors.
pub fn split_args(input: &str) -> Result<Vec<String>, ValidationError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(malformed("no closing quotation")),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(malformed("no closing quotation")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(malformed("no closing quotation")),
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(c) => current.push(c),
                    None => return Err(malformed("no escaped character")),
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn malformed(reason: &str) -> ValidationError {
    ValidationError::MalformedExtraArgs(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::ImageFormat;

    fn device() -> DeviceHandle {
        DeviceHandle::new("test:0", "Test Scanner")
    }

    fn settings_in(dir: &Path) -> ScanSettings {
        ScanSettings {
            prefix: "doc".into(),
            output_dir: dir.to_path_buf(),
            ..ScanSettings::default()
        }
    }

    #[test]
    fn build_targets_first_file_in_empty_dir() {
        let dir = TempDir::new().unwrap();
        let job = build(&settings_in(dir.path()), Some(&device())).unwrap();

        assert_eq!(job.target_path, dir.path().join("doc_0001.png"));
        assert_eq!(job.device, device());
        assert_eq!(job.resolution_dpi, 300);
        assert!(job.extra_arg_tokens.is_empty());
    }

    #[test]
    fn build_uses_jpg_extension_for_jpeg() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("doc_0004.jpg"), "").unwrap();
        let settings = ScanSettings {
            format: ImageFormat::Jpeg,
            ..settings_in(dir.path())
        };

        let job = build(&settings, Some(&device())).unwrap();
        assert_eq!(job.target_path, dir.path().join("doc_0005.jpg"));
        assert_eq!(job.format, ImageFormat::Jpeg);
    }

    #[test]
    fn build_sanitizes_prefix() {
        let dir = TempDir::new().unwrap();
        let settings = ScanSettings {
            prefix: " my doc ".into(),
            ..settings_in(dir.path())
        };

        let job = build(&settings, Some(&device())).unwrap();
        assert_eq!(job.target_path, dir.path().join("my_doc_0001.png"));
    }

    #[test]
    fn build_creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        build(&settings_in(&nested), Some(&device())).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn missing_device_fails_first() {
        let settings = ScanSettings {
            prefix: "///".into(),
            extra_args: "'unbalanced".into(),
            ..ScanSettings::default()
        };
        assert_eq!(
            build(&settings, None).unwrap_err(),
            ValidationError::NoDeviceSelected
        );
    }

    #[test]
    fn empty_prefix_fails_before_output_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let settings = ScanSettings {
            prefix: " -- ".into(),
            ..settings_in(&blocker)
        };
        assert_eq!(
            build(&settings, Some(&device())).unwrap_err(),
            ValidationError::EmptyPrefix
        );
    }

    #[test]
    fn uncreatable_output_dir_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let settings = ScanSettings {
            extra_args: "'unbalanced".into(),
            ..settings_in(&blocker.join("sub"))
        };
        assert!(matches!(
            build(&settings, Some(&device())).unwrap_err(),
            ValidationError::OutputDirUnavailable { .. }
        ));
    }

    #[test]
    fn blank_output_dir_fails() {
        let settings = ScanSettings {
            output_dir: PathBuf::new(),
            ..ScanSettings::default()
        };
        assert!(matches!(
            build(&settings, Some(&device())).unwrap_err(),
            ValidationError::OutputDirUnavailable { .. }
        ));
    }

    #[test]
    fn malformed_extra_args_fail() {
        let dir = TempDir::new().unwrap();
        let settings = ScanSettings {
            extra_args: "--brightness \"10".into(),
            ..settings_in(dir.path())
        };
        assert!(matches!(
            build(&settings, Some(&device())).unwrap_err(),
            ValidationError::MalformedExtraArgs(_)
        ));
    }

    #[test]
    fn preview_does_not_create_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("later");
        let path = preview_path(&settings_in(&missing)).unwrap();

        assert_eq!(path, missing.join("doc_0001.png"));
        assert!(!missing.exists());
    }

    #[test]
    fn preview_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        assert_eq!(preview_path(&settings), preview_path(&settings));
    }

    #[test]
    fn preview_with_empty_prefix_is_none() {
        let settings = ScanSettings {
            prefix: "__".into(),
            ..ScanSettings::default()
        };
        assert!(preview_path(&settings).is_none());
    }

    #[test]
    fn split_plain_words() {
        assert_eq!(
            split_args("  --brightness 10   --contrast 5 ").unwrap(),
            vec!["--brightness", "10", "--contrast", "5"]
        );
        assert!(split_args("").unwrap().is_empty());
    }

    #[test]
    fn split_quotes_and_escapes() {
        assert_eq!(
            split_args(r#"--label 'two words' "say \"hi\"" a\ b ''"#).unwrap(),
            vec!["--label", "two words", "say \"hi\"", "a b", ""]
        );
        assert_eq!(split_args(r#""a\nb""#).unwrap(), vec![r"a\nb"]);
    }

    #[test]
    fn split_rejects_unbalanced_input() {
        assert!(split_args("'open").is_err());
        assert!(split_args("\"open").is_err());
        assert!(split_args("trailing\\").is_err());
    }

    #[test]
    fn expand_home_leaves_other_paths() {
        assert_eq!(expand_home(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home(Path::new("./x")), PathBuf::from("./x"));
    }
}
