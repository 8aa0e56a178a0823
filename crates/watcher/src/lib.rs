//! File access watching for exectrack
//!
//! This crate provides:
//! - File discovery (single directory or search-path variable)
//! - Watch registration behind a backend trait
//! - Inotify record decoding and per-target tallying
//! - The event loop multiplexing notifications against the termination line

pub mod discover;
pub mod event;
pub mod event_loop;
pub mod platform;
pub mod registry;

// Re-exports
pub use discover::{discover, files_in_dir, files_in_search_path, DiscoveryError};
pub use event::{EventFlags, RawEvent, RawEvents, DECODE_BUFFER_LEN, EVENT_HEADER_LEN};
pub use event_loop::{
    tally_batch, BatchStats, EventLoop, EventLoopError, EventSource, LoopState, Termination,
};
pub use registry::{register, RegisterError, WatchBackend};

#[cfg(target_os = "linux")]
pub use platform::linux::{Inotify, InotifyReader};
