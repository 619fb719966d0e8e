//! Notebook re-execution through an external engine.
//!
//! The engine is opaque: it gets a notebook path, runs every cell in place
//! (tolerating failures in individual cells) and writes the outputs back to
//! the same file. The pipeline only sees the [`Executor`] trait so tests can
//! swap in a fake.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use super::pipeline::BakeError;
use crate::config::ExecuteConfig;

/// Re-executes a notebook in place.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn rerun(&self, path: &Path) -> Result<(), BakeError>;
}

/// Runs notebooks with `jupyter nbconvert --execute` (or whatever the
/// configured command is).
///
/// Reruns are idempotent, so a failed run is retried with exponential backoff.
/// A run that hits the timeout is not retried.
pub struct NbconvertExecutor {
    config: ExecuteConfig,
}

impl NbconvertExecutor {
    pub fn new(config: ExecuteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Executor for NbconvertExecutor {
    async fn rerun(&self, path: &Path) -> Result<(), BakeError> {
        let args = expand_args(&self.config.args, &[("{path}", path)]);
        let mut backoff = self.config.backoff();
        let mut attempt = 0;

        loop {
            match run_external(&self.config.program, &args, self.config.timeout()).await {
                Ok(()) => return Ok(()),
                Err(e @ BakeError::ExternalProcessTimeout { .. }) => return Err(e),
                Err(e) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "  run of {} failed ({}), retrying in {}ms ({}/{})",
                        path.display(),
                        e,
                        backoff.as_millis(),
                        attempt,
                        self.config.retries
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Double the retry delay, saturating instead of overflowing.
fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2)
}

/// Substitute `{placeholder}` arguments with paths.
pub(crate) fn expand_args(args: &[String], values: &[(&str, &Path)]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            values.iter().fold(arg.clone(), |arg, (placeholder, path)| {
                arg.replace(placeholder, &path.to_string_lossy())
            })
        })
        .collect()
}

/// Run an external command to completion, killing it if it outlives `timeout`.
pub(crate) async fn run_external(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<(), BakeError> {
    debug!("  $ {} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BakeError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // dropping the wait future on timeout drops the child, which kills it
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| BakeError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(BakeError::ExternalProcessTimeout {
                program: program.to_string(),
                timeout,
            });
        }
    };

    if !output.status.success() {
        return Err(BakeError::ExternalProcess {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_args() {
        let args = ["--output-dir".to_string(), "{out_dir}".to_string(), "{path}".to_string()];
        let expanded = expand_args(
            &args,
            &[("{path}", Path::new("a/b.ipynb")), ("{out_dir}", Path::new("a/html"))],
        );
        assert_eq!(expanded, vec!["--output-dir", "a/html", "a/b.ipynb"]);
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::MAX), Duration::MAX);
        assert_eq!(next_backoff(Duration::MAX / 2 + Duration::from_secs(1)), Duration::MAX);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_external_success() {
        run_external("true", &[], Duration::from_secs(5)).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_external_failure_captures_stderr() {
        let args = ["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        match run_external("sh", &args, Duration::from_secs(5)).await {
            Err(BakeError::ExternalProcess { status, stderr, .. }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected process failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_external_timeout() {
        let result = run_external("sleep", &["5".to_string()], Duration::from_millis(100)).await;
        assert!(matches!(result, Err(BakeError::ExternalProcessTimeout { .. })));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = run_external("nbbake-no-such-program", &[], Duration::from_secs(1)).await;
        assert!(matches!(result, Err(BakeError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_executor_retries_then_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("attempts");
        let script = format!("echo x >> {}; exit 1", counter.display());
        let executor = NbconvertExecutor::new(ExecuteConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script],
            retries: 2,
            backoff_ms: 1,
            ..ExecuteConfig::default()
        });

        let result = executor.rerun(Path::new("unused.ipynb")).await;
        assert!(matches!(result, Err(BakeError::ExternalProcess { .. })));
        let attempts = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(attempts.lines().count(), 3);
    }
}
