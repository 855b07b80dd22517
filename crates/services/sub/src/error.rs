#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] sub_config::error::Error),

    #[error(transparent)]
    Core(#[from] sub_core::error::Error),
}

impl Error {
    /// Failures already reported line by line while the tasks ran.
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            Error::Core(sub_core::error::Error::TasksFailed { .. })
        )
    }
}
