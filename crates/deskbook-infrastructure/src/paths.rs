//! Path management for deskbook configuration files.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for deskbook.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/deskbook/
/// └── config.toml    # Provider, timezone, slots and resource preferences
/// ```
///
/// Credentials are never written here; they come from the environment.
pub struct DeskbookPaths;

impl DeskbookPaths {
    /// Returns the deskbook configuration directory (e.g. `~/.config/deskbook/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("deskbook"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the default configuration file path.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_deskbook_dir() {
        if let Ok(path) = DeskbookPaths::config_file() {
            assert!(path.ends_with("deskbook/config.toml"));
        }
    }
}
