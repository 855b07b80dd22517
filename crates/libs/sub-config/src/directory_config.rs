//! JSON directory list passed with `-c`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A JSON array of directory names.
///
/// ```json
/// ["api", "web", "tools/cli"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryConfig {
    pub directories: Vec<String>,
}

impl DirectoryConfig {
    /// Load the directory list from a JSON file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let load = || -> Result<Self> {
            let contents = std::fs::read_to_string(file_path)?;
            Self::from_json(&contents)
        };
        load().map_err(|err| Error::ConfigFile {
            path: file_path.to_path_buf(),
            source: Box::new(err),
        })
    }

    /// Parse the directory list from a JSON string.
    pub fn from_json(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() -> Result<()> {
        let config = DirectoryConfig::from_json(r#"["b", "a", "nested/c"]"#)?;
        assert_eq!(config.directories, vec!["b", "a", "nested/c"]);
        Ok(())
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(
            DirectoryConfig::from_json(r#"{"dirs": ["a"]}"#),
            Err(Error::Json(_))
        ));
        assert!(DirectoryConfig::from_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_serialize_deserialize() -> Result<()> {
        let config = DirectoryConfig {
            directories: vec!["x".into(), "y".into()],
        };
        assert_eq!(DirectoryConfig::from_json(&config.to_json()?)?, config);
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = DirectoryConfig::from_file(Path::new("/no/such/dirs.json")).unwrap_err();
        assert!(err.to_string().contains("/no/such/dirs.json"));
    }
}
