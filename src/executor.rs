//! Scan execution: run the scanner program for one job.

use std::time::{Duration, Instant};

use tracing::info;

use crate::model::ScanJob;
use crate::process::{self, RunError};

/// What the scanner program reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub stdout: String,
    pub stderr: String,

    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,

    /// Wall-clock time the program ran for.
    pub elapsed: Duration,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Why the scan failed, for showing to the operator.
    pub fn failure_message(&self) -> String {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown error")
            .to_string()
    }
}

/// Why a scan attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Scan timed out")]
    Timeout,

    #[error("{0}")]
    ProcessSpawnFailed(String),

    /// The program ran but reported failure.
    #[error("{message}")]
    NonZeroExit {
        code: Option<i32>,
        message: String,
    },
}

impl ExecutorError {
    /// Turn an unsuccessful report into an error. Successful reports pass through.
    pub fn check(report: ExecutionReport) -> Result<ExecutionReport, Self> {
        if report.success() {
            Ok(report)
        } else {
            Err(Self::NonZeroExit {
                code: report.exit_code,
                message: report.failure_message(),
            })
        }
    }
}

/// Something that can perform a scan.
///
/// A returned report may still carry a non-zero exit code; callers decide
/// what counts as failure.
pub trait ScanExecutor: Send + Sync {
    fn execute(&self, job: &ScanJob, timeout: Duration) -> Result<ExecutionReport, ExecutorError>;
}

/// Executor backed by `scanimage`.
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

impl ScanExecutor for Scanimage {
    fn execute(&self, job: &ScanJob, timeout: Duration) -> Result<ExecutionReport, ExecutorError> {
        let args = scan_args(job);
        info!(
            device = %job.device.id,
            path = %job.target_path.display(),
            "starting scan"
        );
        let started = Instant::now();
        let output = process::run_with_timeout(&self.program, &args, timeout).map_err(|e| match e {
            RunError::TimedOut { .. } => ExecutorError::Timeout,
            other => ExecutorError::ProcessSpawnFailed(other.to_string()),
        })?;
        Ok(ExecutionReport {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            elapsed: started.elapsed(),
        })
    }
}

/// Argument vector for one scan.
///
/// `-d <device> --format <fmt> --output-file <path>`, then resolution, mode,
/// and source when set, then the extra tokens verbatim.
pub fn scan_args(job: &ScanJob) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        job.device.id.clone(),
        "--format".to_string(),
        job.format.as_str().to_string(),
        "--output-file".to_string(),
        job.target_path.to_string_lossy().into_owned(),
    ];
    if job.resolution_dpi > 0 {
        args.extend(["--resolution".to_string(), job.resolution_dpi.to_string()]);
    }
    if let Some(mode) = job.mode.as_arg() {
        args.extend(["--mode".to_string(), mode.to_string()]);
    }
    if let Some(source) = job.source.as_arg() {
        args.extend(["--source".to_string(), source.to_string()]);
    }
    args.extend(job.extra_arg_tokens.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use crate::model::{ColorMode, DeviceHandle, ImageFormat, ScanSource};

    fn job() -> ScanJob {
        ScanJob {
            device: DeviceHandle::new("test:0", "Test"),
            target_path: PathBuf::from("/tmp/scans/doc_0001.jpg"),
            format: ImageFormat::Jpeg,
            resolution_dpi: 300,
            mode: ColorMode::Gray,
            source: ScanSource::AdfDuplex,
            extra_arg_tokens: vec!["--brightness".into(), "10".into()],
        }
    }

    #[test]
    fn full_argument_vector() {
        assert_eq!(
            scan_args(&job()),
            vec![
                "-d",
                "test:0",
                "--format",
                "jpeg",
                "--output-file",
                "/tmp/scans/doc_0001.jpg",
                "--resolution",
                "300",
                "--mode",
                "Gray",
                "--source",
                "ADF Duplex",
                "--brightness",
                "10",
            ]
        );
    }

    #[test]
    fn unspecified_options_are_omitted() {
        let job = ScanJob {
            resolution_dpi: 0,
            mode: ColorMode::Unspecified,
            source: ScanSource::Unspecified,
            extra_arg_tokens: vec![],
            ..job()
        };
        assert_eq!(scan_args(&job).len(), 6);
    }

    #[test]
    fn failure_message_prefers_stderr() {
        let report = ExecutionReport {
            stdout: "progress".into(),
            stderr: "  Error during device I/O\n".into(),
            exit_code: Some(1),
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            ExecutorError::check(report).unwrap_err(),
            ExecutorError::NonZeroExit {
                code: Some(1),
                message: "Error during device I/O".into(),
            }
        );
    }

    #[test]
    fn failure_message_has_a_fallback() {
        let report = ExecutionReport {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.failure_message(), "Unknown error");
    }

    #[test]
    fn successful_report_passes_check() {
        let report = ExecutionReport {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            elapsed: Duration::ZERO,
        };
        assert!(ExecutorError::check(report).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn runs_a_real_program() {
        // `echo` stands in for the scanner and just prints its arguments.
        let exec = Scanimage::new("echo");
        let report = exec.execute(&job(), Duration::from_secs(5)).unwrap();
        assert!(report.success());
        assert!(report.stdout.contains("--output-file /tmp/scans/doc_0001.jpg"));
    }
}
