//! Units of work, their outcomes and the command template that produces them.

use std::{
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Duration,
};

use sub_io::process::ProcessError;

use crate::prelude::*;

/// Placeholder replaced by the directory id in every word of a template.
pub const PLACEHOLDER: &str = "{}";

/// One resolved command bound to one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Directory id, unique within a run.
    id: String,
    /// Program followed by its arguments, placeholders already substituted.
    /// Never empty.
    command: Vec<String>,
    /// Directory the command runs in.
    working_dir: PathBuf,
}

impl WorkItem {
    pub fn new(
        id: impl Into<String>,
        command: Vec<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(Self {
            id: id.into(),
            command,
            working_dir: working_dir.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn program(&self) -> &str {
        &self.command[0]
    }

    pub fn args(&self) -> &[String] {
        &self.command[1..]
    }
}

/// Why a task did not succeed.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("{0}")]
    Spawn(#[source] io::Error),

    #[error("{0}")]
    Exit(ExitStatus),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    #[error("failed to kill process: {0}")]
    Kill(#[source] io::Error),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl From<ProcessError> for TaskError {
    fn from(value: ProcessError) -> Self {
        match value {
            ProcessError::Spawn(err) => TaskError::Spawn(err),
            ProcessError::Wait(err) => TaskError::Wait(err),
            ProcessError::Kill(err) => TaskError::Kill(err),
            ProcessError::TimedOut(limit) => TaskError::TimedOut(limit),
        }
    }
}

/// The captured result of executing one [`WorkItem`].
#[derive(Debug)]
pub struct TaskOutcome {
    pub id: String,
    /// Combined stdout and stderr.
    pub output: Vec<u8>,
    pub error: Option<TaskError>,
}

impl TaskOutcome {
    pub fn success(id: impl Into<String>, output: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            output,
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, output: Vec<u8>, error: TaskError) -> Self {
        Self {
            id: id.into(),
            output,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A program and arguments that may contain [`PLACEHOLDER`].
///
/// # Examples
///
/// ```rust
/// use sub_core::task::CommandTemplate;
///
/// let template = CommandTemplate::new(vec!["git".into(), "-C".into(), "{}".into(), "status".into()]).unwrap();
/// assert_eq!(template.resolve("repo"), vec!["git", "-C", "repo", "status"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    words: Vec<String>,
}

impl CommandTemplate {
    pub fn new(words: Vec<String>) -> Result<Self> {
        if words.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(Self { words })
    }

    /// Substitute every occurrence of the placeholder with `dir`.
    pub fn resolve(&self, dir: &str) -> Vec<String> {
        self.words
            .iter()
            .map(|word| word.replace(PLACEHOLDER, dir))
            .collect()
    }

    /// Build one work item per directory, each running inside `root/dir`.
    pub fn work_items(&self, root: &Path, dirs: &[String]) -> Vec<WorkItem> {
        dirs.iter()
            .map(|dir| WorkItem {
                id: dir.clone(),
                command: self.resolve(dir),
                working_dir: root.join(dir),
            })
            .collect()
    }
}
