//! The external encoder gateway.
//!
//! [`EncoderGateway`] is the single seam between the cache managers and the
//! encoder executable: one method that runs an [`EncodeJob`] to completion and
//! reports the outcome. [`ProcessGateway`] is the production implementation,
//! spawning a subprocess per job; tests substitute a recording fake.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediavault_common::{Error, Result};
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Default job timeout: 1 hour.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// The artifact an [`EncodeJob`] is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeTarget {
    /// An HLS playlist; segments are written next to it.
    HlsPlaylist(PathBuf),
    /// A single JPEG frame.
    Thumbnail(PathBuf),
}

impl EncodeTarget {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::HlsPlaylist(p) | Self::Thumbnail(p) => p,
        }
    }
}

/// One encoder invocation: executable, argument vector and limits.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Short tool name used in logs and errors (e.g. "ffmpeg").
    pub tool: String,
    /// Resolved path to the executable.
    pub program: PathBuf,
    /// Argument vector, not including the program.
    pub args: Vec<String>,
    /// Hard limit on wall-clock time.
    pub timeout: Duration,
    /// What the job writes on success.
    pub target: EncodeTarget,
}

impl EncodeJob {
    pub fn new(tool: impl Into<String>, program: PathBuf, target: EncodeTarget) -> Self {
        Self {
            tool: tool.into(),
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            target,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The command line as a single string, for logging.
    pub fn display_command(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Output captured from a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct EncodeOutput {
    /// Process exit code (0 on success).
    pub exit_code: i32,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Runs encoder jobs.
///
/// A nonzero exit is always an error carrying the captured diagnostics.
/// Implementations never retry; the caller decides policy.
#[async_trait]
pub trait EncoderGateway: Send + Sync {
    async fn run(&self, job: EncodeJob) -> Result<EncodeOutput>;
}

/// Subprocess-backed gateway with a bound on concurrent jobs.
///
/// Jobs beyond the limit wait for a permit. Children are spawned with
/// `kill_on_drop`, so a timed-out or cancelled job terminates its process.
#[derive(Debug, Clone)]
pub struct ProcessGateway {
    permits: Arc<Semaphore>,
}

impl ProcessGateway {
    /// Create a gateway allowing at most `max_concurrent` jobs at once.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Number of jobs that could start right now without waiting.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for ProcessGateway {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl EncoderGateway for ProcessGateway {
    async fn run(&self, job: EncodeJob) -> Result<EncodeOutput> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::internal("encoder gateway is shut down"))?;

        tracing::debug!(tool = %job.tool, command = %job.display_command(), "Running encoder");
        let started = std::time::Instant::now();

        let mut cmd = Command::new(&job.program);
        cmd.args(&job.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::transcode(&job.tool, format!("failed to spawn: {e}")))?;

        let output = match tokio::time::timeout(job.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::transcode(
                    &job.tool,
                    format!("I/O error waiting for process: {e}"),
                ))
            }
            // Dropping the wait future drops the child, which kills it.
            Err(_elapsed) => {
                tracing::warn!(tool = %job.tool, timeout = ?job.timeout, "Encoder timed out");
                return Err(Error::transcode(
                    &job.tool,
                    format!("timed out after {:?}", job.timeout),
                ));
            }
        };

        let result = EncodeOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            tracing::error!(
                tool = %job.tool,
                status = %output.status,
                stderr = %stderr_tail(&result.stderr),
                "Encoder failed"
            );
            return Err(Error::transcode(
                &job.tool,
                failure_message(&output.status.to_string(), &result.stderr),
            ));
        }

        tracing::debug!(tool = %job.tool, elapsed = ?started.elapsed(), "Encoder finished");
        Ok(result)
    }
}

/// Build the diagnostic for a failed run. Never empty.
pub fn failure_message(status: &str, stderr: &str) -> String {
    let tail = stderr_tail(stderr);
    if tail.is_empty() {
        format!("exited with {status} (no diagnostic output)")
    } else {
        format!("exited with {status}: {tail}")
    }
}

/// The last few non-empty lines of stderr; ffmpeg prints its banner first.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
