//! Configuration service implementation.
//!
//! Loads the run configuration from a TOML file (by default
//! `~/.config/deskbook/config.toml`) and combines it with credentials from the
//! environment.

use std::fs;
use std::path::{Path, PathBuf};

use deskbook_core::config::{RootConfig, RunConfig};
use deskbook_core::error::{DeskbookError, Result};

use crate::credential_source::CredentialSource;
use crate::paths::DeskbookPaths;

/// Reads the configuration file once per run.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default configuration path.
    pub fn new() -> Result<Self> {
        let path = DeskbookPaths::config_file()
            .map_err(|e| DeskbookError::configuration(e.to_string()))?;
        Ok(Self { path })
    }

    /// Uses an explicit configuration path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file contents.
    ///
    /// A missing or empty file yields the defaults, which still need a
    /// provider before they validate.
    pub fn load_root(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(RootConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            DeskbookError::configuration(format!(
                "Failed to read configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(RootConfig::default());
        }

        RootConfig::from_toml_str(&content).map_err(|e| {
            DeskbookError::configuration(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Loads and validates the full run configuration.
    pub fn load_run_config(&self, credentials: &impl CredentialSource) -> Result<RunConfig> {
        let root = self.load_root()?;
        RunConfig::from_root(root, credentials.credentials())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_source::StaticCredentials;
    use deskbook_core::Institution;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let root = service.load_root().unwrap();
        assert_eq!(root, RootConfig::default());
    }

    #[test]
    fn test_load_run_config_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "provider = \"kit\"").unwrap();
        writeln!(file, "accept_any_resource = false").unwrap();

        let service = ConfigService::with_path(&path);
        let config = service
            .load_run_config(&StaticCredentials::new("ab1234", "secret"))
            .unwrap();

        assert_eq!(config.institution, Institution::Kit);
        assert!(!config.preferences.accept_any_resource);
        assert_eq!(config.credentials.username(), "ab1234");
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "provider = [").unwrap();

        let err = ConfigService::with_path(&path).load_root().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("config.toml"));
    }
}
