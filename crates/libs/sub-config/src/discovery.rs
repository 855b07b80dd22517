//! Resolving the directories a command runs in.
//!
//! Sources are tried in order, first match wins:
//!
//! 1. directories given explicitly on the command line
//! 2. a JSON array config file, when one is given (errors are fatal)
//! 3. `sub.cnf` in the root, one directory per line (skipped if unreadable)
//! 4. every visible, non-hidden subdirectory of the root
//!
//! The result is always sorted and free of duplicates.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{directory_config::DirectoryConfig, prelude::*};

/// Line-based directory list looked up in the root.
pub const LIST_FILE: &str = "sub.cnf";

/// Where the resolved directories came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySource {
    Explicit,
    ConfigFile(PathBuf),
    ListFile(PathBuf),
    Listing(PathBuf),
}

/// Inputs for directory resolution.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Directories given with `-d`.
    pub explicit: Vec<String>,
    /// JSON config given with `-c`.
    pub config: Option<PathBuf>,
    /// Directory that `sub.cnf` and the listing are relative to.
    pub root: PathBuf,
}

impl Discovery {
    /// Resolve the directory list and report which source produced it.
    pub fn resolve(&self) -> Result<(DirectorySource, Vec<String>)> {
        let (source, dirs) = self.resolve_unsorted()?;
        debug!("Resolved {} directories from {:?}", dirs.len(), source);
        Ok((source, normalize(dirs)))
    }

    fn resolve_unsorted(&self) -> Result<(DirectorySource, Vec<String>)> {
        if !self.explicit.is_empty() {
            return Ok((DirectorySource::Explicit, self.explicit.clone()));
        }

        if let Some(config) = &self.config {
            let dirs = DirectoryConfig::from_file(config)?.directories;
            return Ok((DirectorySource::ConfigFile(config.clone()), dirs));
        }

        let list_file = self.root.join(LIST_FILE);
        match read_lines(&list_file) {
            Ok(dirs) => return Ok((DirectorySource::ListFile(list_file), dirs)),
            Err(err) => debug!("Not using {:?}: {err}", list_file),
        }

        let dirs = list_visible_dirs(&self.root)?;
        Ok((DirectorySource::Listing(self.root.clone()), dirs))
    }
}

/// Read a newline-delimited file, dropping line endings and empty lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Names of the immediate subdirectories of `path` not starting with `.`.
///
/// Symlinks are not followed, so a link to a directory is not listed.
pub fn list_visible_dirs(path: &Path) -> Result<Vec<String>> {
    let list_error = |source| Error::ListDirectory {
        path: path.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(path).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        if !entry.file_type().map_err(list_error)?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            dirs.push(name);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn normalize(mut dirs: Vec<String>) -> Vec<String> {
    dirs.sort();
    dirs.dedup();
    dirs
}
