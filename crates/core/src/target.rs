//! Watch targets and the per-session watch set

use ahash::AHashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Watch descriptor assigned by the kernel when a path is registered
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct WatchHandle(i32);

impl WatchHandle {
    /// Wrap a raw watch descriptor
    pub const fn from_raw(wd: i32) -> Self {
        Self(wd)
    }

    /// Raw watch descriptor value
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wd:{}", self.0)
    }
}

/// A single observed file and its running access counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Path as discovered (directory joined with entry name)
    path: PathBuf,
    /// Kernel watch descriptor for this path
    handle: WatchHandle,
    /// Access events counted so far this session
    access_count: u64,
}

impl WatchTarget {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> WatchHandle {
        self.handle
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }
}

/// Ordered set of watch targets, in discovery order
///
/// Targets are addressed by index (report order) and by handle (event
/// resolution). Both views share one record per target, so path, handle
/// and counter can never drift apart.
///
/// The kernel hands out the same descriptor when one inode is registered
/// twice (e.g. `/bin/ls` and `/usr/bin/ls` on a merged-usr system). In that
/// case the first target registered under the descriptor receives every
/// event and the later ones stay at zero.
#[derive(Debug, Default)]
pub struct WatchSet {
    targets: Vec<WatchTarget>,
    by_handle: AHashMap<WatchHandle, usize>,
}

impl WatchSet {
    /// Create an empty watch set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty watch set with room for `capacity` targets
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            targets: Vec::with_capacity(capacity),
            by_handle: AHashMap::with_capacity(capacity),
        }
    }

    /// Append a target with a zero counter, returning its index
    pub fn push(&mut self, path: PathBuf, handle: WatchHandle) -> usize {
        let index = self.targets.len();
        self.targets.push(WatchTarget {
            path,
            handle,
            access_count: 0,
        });
        self.by_handle.entry(handle).or_insert(index);
        index
    }

    /// Count one access against the target registered under `handle`
    ///
    /// Returns the updated target, or `None` if the handle is unknown.
    pub fn record_access(&mut self, handle: WatchHandle) -> Option<&WatchTarget> {
        let index = *self.by_handle.get(&handle)?;
        let target = &mut self.targets[index];
        target.access_count += 1;
        Some(&*target)
    }

    pub fn get(&self, index: usize) -> Option<&WatchTarget> {
        self.targets.get(index)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterate over all targets in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &WatchTarget> {
        self.targets.iter()
    }

    /// Iterate over targets with at least one recorded access
    pub fn accessed(&self) -> impl Iterator<Item = &WatchTarget> {
        self.targets.iter().filter(|t| t.access_count > 0)
    }

    /// Sum of all access counters
    pub fn total_accesses(&self) -> u64 {
        self.targets.iter().map(|t| t.access_count).sum()
    }
}
