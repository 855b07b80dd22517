//! Low-level async process management utilities.

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::process::{Child, Command};
use tracing::warn;

/// Errors that can occur during process operations.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    /// Failed to spawn the process.
    #[error("failed to start process: {0}")]
    Spawn(#[source] io::Error),

    /// Failed to wait for the child process.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    /// Failed to kill a process that outlived its timeout.
    #[error("failed to kill process: {0}")]
    Kill(#[source] io::Error),

    /// Process ran longer than allowed and was killed.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Spawn a new async process inside `cwd` with piped stdout and stderr.
///
/// Stdin is connected to `/dev/null` so a child waiting for input sees EOF
/// instead of hanging the slot it occupies. The child is killed if its handle
/// is dropped before it exits.
///
/// # Examples
///
/// ```rust,no_run
/// use sub_io::process::spawn_process;
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("echo", &["Hello".to_string()], ".").unwrap();
///     let output = child.stdout.take().unwrap();
/// }
/// ```
pub fn spawn_process(
    program: &str,
    args: &[String],
    cwd: impl AsRef<Path>,
) -> Result<Child, ProcessError> {
    Command::new(OsStr::new(program))
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ProcessError::Spawn)
}

/// Asynchronously terminate a child process and reap it.
pub async fn stop_child(child: &mut Child) -> Result<(), ProcessError> {
    child.kill().await.map_err(ProcessError::Kill)
}

/// Wait for a child process, killing it if `timeout` elapses first.
///
/// Without a timeout this waits for as long as the child runs.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sub_io::process::{spawn_process, wait_child, ProcessError};
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("sleep", &["60".to_string()], ".").unwrap();
///     let result = wait_child(&mut child, Some(Duration::from_millis(100))).await;
///     assert!(matches!(result, Err(ProcessError::TimedOut(_))));
/// }
/// ```
pub async fn wait_child(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, ProcessError> {
    let Some(limit) = timeout else {
        return child.wait().await.map_err(ProcessError::Wait);
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status.map_err(ProcessError::Wait),
        Err(_) => {
            warn!("Process {:?} exceeded {limit:?}, killing it", child.id());
            stop_child(child).await?;
            Err(ProcessError::TimedOut(limit))
        }
    }
}
