//! Session configuration
//!
//! A session is configured entirely from the command line: where to look
//! for files and where to write the usage report.

use crate::report::DEFAULT_REPORT_FILE;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable scanned in search-path mode unless overridden
pub const DEFAULT_PATH_VAR: &str = "PATH";

/// How the set of files to watch is discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Regular files directly inside one directory
    Directory(PathBuf),
    /// Regular files in every directory of a colon-delimited environment variable
    SearchPath { var: String },
}

impl Default for DiscoveryMode {
    fn default() -> Self {
        Self::SearchPath {
            var: DEFAULT_PATH_VAR.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("search path variable name must not be empty")]
    EmptyPathVar,
    #[error("invalid search path variable name '{0}' (must not contain '=' or NUL)")]
    InvalidPathVar(String),
    #[error("report path must not be empty")]
    EmptyReportPath,
}

/// Configuration for a single monitoring session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: DiscoveryMode,
    pub report_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::default(),
            report_path: PathBuf::from(DEFAULT_REPORT_FILE),
        }
    }
}

impl SessionConfig {
    pub fn new(mode: DiscoveryMode, report_path: PathBuf) -> Self {
        Self { mode, report_path }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let DiscoveryMode::SearchPath { var } = &self.mode {
            if var.is_empty() {
                return Err(ConfigError::EmptyPathVar);
            }
            if var.contains('=') || var.contains('\0') {
                return Err(ConfigError::InvalidPathVar(var.clone()));
            }
        }

        if self.report_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyReportPath);
        }

        Ok(())
    }
}
