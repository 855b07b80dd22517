//! Turning a [`WorkItem`] into a [`TaskOutcome`].

use std::{future::Future, time::Duration};

use sub_io::runner::Runner;
use tracing::debug;

use crate::task::{TaskError, TaskOutcome, WorkItem};

/// Runs a single work item to completion.
///
/// Implementations must capture every failure into the returned outcome;
/// nothing is printed and nothing is propagated.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, item: &WorkItem) -> impl Future<Output = TaskOutcome> + Send;
}

/// Executes work items as OS processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any process still running after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Executor for ProcessExecutor {
    async fn execute(&self, item: &WorkItem) -> TaskOutcome {
        let runner = Runner::new(item.program(), item.args().to_vec())
            .current_dir(item.working_dir())
            .timeout(self.timeout);

        let output = runner.run().await;
        debug!("{} - `{}` finished", item.id(), runner.get_full_command());

        match output.status {
            Ok(status) if status.success() => TaskOutcome::success(item.id(), output.output),
            Ok(status) => TaskOutcome::failure(item.id(), output.output, TaskError::Exit(status)),
            Err(err) => TaskOutcome::failure(item.id(), output.output, err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(dir: &std::path::Path, command: &[&str]) -> WorkItem {
        WorkItem::new(
            "item",
            command.iter().map(|w| w.to_string()).collect(),
            dir,
        )
        .expect("Command is not empty")
    }

    #[tokio::test]
    async fn test_success_captures_output() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let outcome = ProcessExecutor::new()
            .execute(&item(dir.path(), &["sh", "-c", "echo hello; echo oops >&2"]))
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.id, "item");
        let text = String::from_utf8_lossy(&outcome.output);
        assert!(text.contains("hello\n"));
        assert!(text.contains("oops\n"));
    }

    #[tokio::test]
    async fn test_exit_status_is_failure() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let outcome = ProcessExecutor::new()
            .execute(&item(dir.path(), &["sh", "-c", "echo before; exit 1"]))
            .await;

        assert!(!outcome.succeeded());
        assert_eq!(outcome.output, b"before\n");
        match outcome.error {
            Some(TaskError::Exit(status)) => assert_eq!(status.code(), Some(1)),
            other => panic!("Unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_captured() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let outcome = ProcessExecutor::new()
            .execute(&item(dir.path(), &["sub-core-no-such-program"]))
            .await;

        assert!(!outcome.succeeded());
        assert!(matches!(outcome.error, Some(TaskError::Spawn(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let outcome = ProcessExecutor::with_timeout(Some(Duration::from_millis(100)))
            .execute(&item(dir.path(), &["sleep", "10"]))
            .await;

        assert!(matches!(outcome.error, Some(TaskError::TimedOut(_))));
    }
}
