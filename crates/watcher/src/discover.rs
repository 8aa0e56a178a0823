//! File discovery
//!
//! Lists the regular files a session should watch, either from a single
//! directory or from every directory in a colon-delimited search path.
//! Scanning is flat: subdirectories are never descended into.

use exectrack_core::DiscoveryMode;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("search path variable ${var} is not set or empty")]
    SearchPathUnset { var: String },
    #[error("failed to read directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Discover files for the given mode
pub fn discover(mode: &DiscoveryMode) -> Result<Vec<PathBuf>, DiscoveryError> {
    match mode {
        DiscoveryMode::Directory(dir) => {
            let files = files_in_dir(dir)?;
            info!("Found {} files in {}", files.len(), dir.display());
            Ok(files)
        }
        DiscoveryMode::SearchPath { var } => {
            let value = std::env::var_os(var)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DiscoveryError::SearchPathUnset { var: var.clone() })?;

            let files = files_in_search_path(&value);
            info!("Found {} files across ${}", files.len(), var);
            Ok(files)
        }
    }
}

/// List regular files directly inside `dir`, sorted by file name
///
/// Symlinks, subdirectories, devices, fifos and sockets are skipped.
pub fn files_in_dir(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_dir_error = |source: io::Error| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    // WalkDir treats a non-directory root as a single entry; reject it up front
    let metadata = std::fs::metadata(dir).map_err(read_dir_error)?;
    if !metadata.is_dir() {
        return Err(read_dir_error(io::Error::other("not a directory")));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| read_dir_error(io::Error::from(e)))?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// List regular files in every directory of a colon-delimited search path
///
/// Directories are scanned in order and their results concatenated, so a
/// name present in two directories appears twice. Empty components are
/// skipped; unreadable directories are logged and skipped.
pub fn files_in_search_path(search_path: &OsStr) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for dir in std::env::split_paths(search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }

        match files_in_dir(&dir) {
            Ok(found) => {
                debug!("{}: {} files", dir.display(), found.len());
                files.extend(found);
            }
            Err(DiscoveryError::ReadDir { path, source }) => {
                warn!("Skipping {}: {}", path.display(), source);
            }
            Err(e) => warn!("Skipping {}: {}", dir.display(), e),
        }
    }

    files
}
