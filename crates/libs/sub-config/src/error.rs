//! Configuration error types.

use std::path::PathBuf;

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// JSON deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A config file could not be read or parsed.
    #[error("Failed to load {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The working directory could not be listed.
    #[error("Failed to list directories in {path:?}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
