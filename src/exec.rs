//! Subprocess plumbing for the external tool adapters.
//!
//! Tools write their results to files: stdout and stderr are redirected to
//! paths chosen by the caller, so nothing is buffered in memory and a long
//! running tool can be polled against its timeout without pipe deadlocks.
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Exit code, `None` when killed by a signal or timed out.
    pub code: Option<i32>,
    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
            timed_out: false,
        }
    }
}

/// Run `program` with `args`, sending stdout to `stdout` and stderr to
/// `stderr` (truncating both). The two paths may be the same file.
///
/// A non-zero exit is reported through [`ExecResult`], not as an error.
///
/// # Errors
///
/// Returns an error if a redirect file cannot be created or the program
/// cannot be started.
pub fn run_redirected(
    program: &str,
    args: &[String],
    stdout: &Path,
    stderr: &Path,
    timeout: Option<Duration>,
) -> io::Result<ExecResult> {
    let out = File::create(stdout)?;
    let err = if stdout == stderr {
        out.try_clone()?
    } else {
        File::create(stderr)?
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(out))
        .stderr(Stdio::from(err))
        .spawn()?;

    match timeout {
        Some(limit) => wait_with_timeout(child, limit),
        None => wait(child),
    }
}

fn wait(mut child: Child) -> io::Result<ExecResult> {
    Ok(child.wait()?.into())
}

fn wait_with_timeout(mut child: Child, limit: Duration) -> io::Result<ExecResult> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }
        if started.elapsed() >= limit {
            child.kill().ok();
            child.wait()?;
            return Ok(ExecResult {
                success: false,
                code: None,
                timed_out: true,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Check if a program is available on PATH (or is an executable path).
#[must_use]
pub fn which(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Make sure `path` exists as a (possibly empty) file.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn touch(path: &Path) -> io::Result<()> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
}
