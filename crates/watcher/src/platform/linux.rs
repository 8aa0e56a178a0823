//! Linux inotify backend
//!
//! `Inotify` is the registration phase: watches are added one path at a
//! time. `into_reader` ends registration and hands the descriptor to the
//! tokio reactor, after which no more watches can be added.

use crate::event_loop::EventSource;
use crate::registry::WatchBackend;
use async_trait::async_trait;
use exectrack_core::WatchHandle;
use nix::errno::Errno;
use nix::libc;
use nix::NixPath;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::Path;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;

/// Inotify instance accepting new watches
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    /// Create a non-blocking, close-on-exec inotify instance
    pub fn init() -> io::Result<Self> {
        // SAFETY: inotify_init1 takes no pointers
        let raw = Errno::result(unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) })?;

        // SAFETY: `raw` is a freshly created descriptor owned by nobody else
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        Ok(Self { fd })
    }

    /// Stop registering and start reading events
    ///
    /// Must be called from within a tokio runtime with IO enabled.
    pub fn into_reader(self) -> io::Result<InotifyReader> {
        let fd = AsyncFd::with_interest(self.fd, Interest::READABLE)?;
        Ok(InotifyReader { fd })
    }
}

impl WatchBackend for Inotify {
    fn add_watch(&mut self, path: &Path) -> io::Result<WatchHandle> {
        let raw_fd = self.fd.as_raw_fd();

        // SAFETY: `cstr` is a valid NUL-terminated path for the duration of the call
        let wd = path.with_nix_path(|cstr| unsafe {
            libc::inotify_add_watch(raw_fd, cstr.as_ptr(), libc::IN_ACCESS)
        })?;

        Ok(WatchHandle::from_raw(Errno::result(wd)?))
    }
}

/// Inotify descriptor registered with the tokio reactor
#[derive(Debug)]
pub struct InotifyReader {
    fd: AsyncFd<OwnedFd>,
}

#[async_trait]
impl EventSource for InotifyReader {
    async fn read_batch(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self.fd.readable().await?;

        match guard.try_io(|fd| nix::unistd::read(fd.as_raw_fd(), buf).map_err(io::Error::from)) {
            Ok(result) => result,
            // Readiness was stale; it has been cleared, so the next call waits again
            Err(_would_block) => Ok(0),
        }
    }
}
