//! Session event loop
//!
//! The loop waits on exactly two sources: the notification channel and a
//! line-oriented termination input. A line (or end of input) on the
//! termination input ends the session; everything read from the
//! notification channel before that is decoded and tallied.
//!
//! Termination is polled first on every iteration, so once the line has
//! arrived no further batches are read even if the kernel has more queued.

use crate::event::{EventFlags, RawEvents, DECODE_BUFFER_LEN};
use async_trait::async_trait;
use exectrack_core::WatchSet;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace, warn};

/// Readable stream of packed inotify records
#[async_trait]
pub trait EventSource: Send {
    /// Wait until records are available and read one batch into `buf`
    ///
    /// `Ok(0)` means nothing was read this time (spurious wake-up).
    async fn read_batch(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[derive(Debug, Error)]
pub enum EventLoopError {
    #[error("failed to read inotify events")]
    Read(#[source] io::Error),
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A line was read from the termination input
    Line,
    /// The termination input reached end of stream
    EndOfInput,
    /// Reading the termination input failed
    InputError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Waiting,
    Terminated,
}

/// Outcome of tallying one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records decoded
    pub records: usize,
    /// Records counted against a target
    pub counted: usize,
    /// Access records whose handle matched no target
    pub unmatched: usize,
    /// Records without the access flag (overflow, ignored, unmount)
    pub skipped: usize,
}

/// Decode a batch and count every access record against its target
///
/// Each record is one access; repeated records for the same handle are
/// never coalesced.
pub fn tally_batch(watch_set: &mut WatchSet, batch: &[u8]) -> BatchStats {
    let mut stats = BatchStats::default();
    let mut events = RawEvents::new(batch);

    for event in events.by_ref() {
        stats.records += 1;

        if event.flags.contains(EventFlags::Q_OVERFLOW) {
            warn!("Inotify queue overflowed, some accesses were not counted");
            stats.skipped += 1;
            continue;
        }

        if !event.flags.contains(EventFlags::ACCESS) {
            debug!("Skipping {} on {}", event.flags, event.handle);
            stats.skipped += 1;
            continue;
        }

        match watch_set.record_access(event.handle) {
            Some(target) => {
                debug!(
                    "{} accessed ({} so far)",
                    target.path().display(),
                    target.access_count()
                );
                stats.counted += 1;
            }
            None => {
                trace!("No target for {}", event.handle);
                stats.unmatched += 1;
            }
        }
    }

    if events.remaining() > 0 {
        warn!(
            "Discarding {} bytes of incomplete event data",
            events.remaining()
        );
    }

    stats
}

/// Errors that end the current batch but not the session
fn is_recoverable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Single-owner loop over the session's watch set
pub struct EventLoop {
    watch_set: WatchSet,
    buffer: Vec<u8>,
    state: LoopState,
}

impl EventLoop {
    pub fn new(watch_set: WatchSet) -> Self {
        Self {
            watch_set,
            buffer: vec![0; DECODE_BUFFER_LEN],
            state: LoopState::Waiting,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    pub fn into_watch_set(self) -> WatchSet {
        self.watch_set
    }

    /// Run until the termination input yields a line or ends
    ///
    /// A non-recoverable read error on `source` ends the loop with an
    /// error; counts gathered up to that point stay in the watch set.
    pub async fn run<S, R>(
        &mut self,
        source: &mut S,
        termination: R,
    ) -> Result<Termination, EventLoopError>
    where
        S: EventSource + ?Sized,
        R: AsyncBufRead + Unpin,
    {
        let mut lines = termination.lines();

        loop {
            tokio::select! {
                biased;

                line = lines.next_line() => {
                    let reason = match line {
                        Ok(Some(_)) => Termination::Line,
                        Ok(None) => Termination::EndOfInput,
                        Err(e) => {
                            warn!("Failed to read termination input: {}", e);
                            Termination::InputError
                        }
                    };
                    self.state = LoopState::Terminated;
                    debug!("Event loop terminated ({:?})", reason);
                    return Ok(reason);
                }

                read = source.read_batch(&mut self.buffer) => {
                    match read {
                        Ok(0) => continue,
                        Ok(len) => {
                            let stats = tally_batch(&mut self.watch_set, &self.buffer[..len]);
                            trace!("Batch of {} bytes: {:?}", len, stats);
                        }
                        Err(e) if is_recoverable(&e) => continue,
                        Err(e) => {
                            self.state = LoopState::Terminated;
                            return Err(EventLoopError::Read(e));
                        }
                    }
                }
            }
        }
    }
}
