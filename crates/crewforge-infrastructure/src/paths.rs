//! Unified path management for crewforge data files.
//!
//! All interview mirrors, rosters, and configuration live under a single
//! per-platform config directory.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/crewforge/              # Config directory
//! ├── config.toml                   # Engine configuration
//! ├── roster.json                   # Teams and materialized workers
//! └── orgs/<org-id>/interviews/     # One JSON file per session
//! ```

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

/// Unified path management for crewforge.
pub struct CrewforgePaths;

impl CrewforgePaths {
    /// Returns the crewforge configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/crewforge/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("crewforge"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the engine configuration file path.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the roster snapshot file path.
    pub fn roster_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("roster.json"))
    }
}
