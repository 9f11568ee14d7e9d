//! Process runner: spawn a subprocess in the project root with a hard timeout.
//!
//! Failing exit codes are data, not errors. Callers inspect
//! [`ProcessOutput::code`] and decide what a failure means for them.

use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Exit code reported when the child was killed for exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Default command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// How long to keep reading pipes after the child is gone. Grandchildren
/// that inherited the pipes can hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Fully buffered result of one subprocess run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessOutput {
    fn spawn_failure(error: std::io::Error) -> Self {
        Self {
            code: -1,
            stdout: String::new(),
            stderr: error.to_string(),
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0 && !self.timed_out
    }

    /// stdout and stderr joined, trimmed. Used for failure reports.
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Runs commands with a fixed working directory and a default timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
    default_timeout: Duration,
}

impl ProcessRunner {
    pub fn new(cwd: impl Into<PathBuf>, default_timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            default_timeout,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run a shell string through `sh -c` (`cmd /C` on Windows).
    pub async fn run_shell(&self, script: &str, timeout: Option<Duration>) -> ProcessOutput {
        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", script]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", script]);
            c
        };
        debug!(script = %script, "Running shell command");
        self.run_command(&mut command, timeout).await
    }

    /// Run `program` with an argument vector, no shell involved.
    pub async fn run<I, S>(&self, program: &str, args: I, timeout: Option<Duration>) -> ProcessOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command.args(args);
        debug!(program = %program, "Running program");
        self.run_command(&mut command, timeout).await
    }

    async fn run_command(&self, command: &mut Command, timeout: Option<Duration>) -> ProcessOutput {
        let timeout = timeout.unwrap_or(self.default_timeout);

        command
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "Failed to spawn process");
                return ProcessOutput::spawn_failure(e);
            }
        };

        let stdout_task = child.stdout.take().map(read_to_end);
        let stderr_task = child.stderr.take().map(read_to_end);

        let deadline = Instant::now() + timeout;
        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep_until(deadline) => None,
        };

        let (code, timed_out) = match status {
            Some(Ok(status)) => (status.code().unwrap_or(-1), false),
            Some(Err(e)) => {
                warn!(error = %e, "Failed to wait for process");
                (-1, false)
            }
            None => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Process timed out, killing");
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "Kill failed, process already exited");
                }
                let _ = child.wait().await;
                (TIMEOUT_EXIT_CODE, true)
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;

        ProcessOutput {
            code,
            stdout,
            stderr,
            timed_out,
        }
    }
}

fn read_to_end<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf).await;
        buf
    })
}

async fn drain(task: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(mut task) = task else {
        return String::new();
    };
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(buf)) => String::from_utf8_lossy(&buf).into_owned(),
        Ok(Err(_)) => String::new(),
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}
