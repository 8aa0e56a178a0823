//! Watch registration
//!
//! Every discovered path is registered exactly once, before the session
//! starts. A single failure aborts startup: a partial watch set would make
//! the final counts misleading.

use exectrack_core::{WatchHandle, WatchSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Something that can hand out watch handles for paths
pub trait WatchBackend {
    /// Register `path` for read-access notifications
    fn add_watch(&mut self, path: &Path) -> io::Result<WatchHandle>;
}

#[derive(Debug, Error)]
#[error("cannot watch {}", path.display())]
pub struct RegisterError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Register all paths, in order, and build the session's watch set
pub fn register<B>(backend: &mut B, paths: Vec<PathBuf>) -> Result<WatchSet, RegisterError>
where
    B: WatchBackend + ?Sized,
{
    let mut watch_set = WatchSet::with_capacity(paths.len());

    for path in paths {
        let handle = match backend.add_watch(&path) {
            Ok(handle) => handle,
            Err(source) => return Err(RegisterError { path, source }),
        };

        debug!("Watching {} ({})", path.display(), handle);
        watch_set.push(path, handle);
    }

    info!("Registered {} watches", watch_set.len());
    Ok(watch_set)
}
