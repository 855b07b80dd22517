//! Engine error types.

/// Errors that abort or summarize a whole run.
///
/// Failures of individual tasks never show up here directly; they are
/// captured in [`crate::task::TaskError`] and only counted by
/// [`Error::TasksFailed`] once every task has finished.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The concurrency limit could not be resolved to a positive number.
    #[error("Failed to determine the number of concurrent tasks: {0}")]
    PoolConstruction(#[source] std::io::Error),

    /// A command template or work item without a program.
    #[error("Command is empty")]
    EmptyCommand,

    /// At least one task did not succeed.
    #[error("{failed} of {total} tasks failed")]
    TasksFailed { failed: usize, total: usize },
}
