//! Inotify event records
//!
//! The kernel delivers events as a packed byte stream of `inotify_event`
//! records: a 16-byte header (`wd: i32`, `mask: u32`, `cookie: u32`,
//! `len: u32`) followed by `len` bytes of NUL-padded name. Records are
//! decoded in place; nothing here allocates.

use bitflags::bitflags;
use bytes::Buf;
use exectrack_core::WatchHandle;
use std::fmt;

/// Size of the fixed `inotify_event` header
pub const EVENT_HEADER_LEN: usize = 16;

/// Bytes read from the notification channel per batch
pub const DECODE_BUFFER_LEN: usize = 4096;

bitflags! {
    /// Inotify event mask bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        const ACCESS = 0x0000_0001;
        const MODIFY = 0x0000_0002;
        const ATTRIB = 0x0000_0004;
        const CLOSE_WRITE = 0x0000_0008;
        const CLOSE_NOWRITE = 0x0000_0010;
        const OPEN = 0x0000_0020;
        const MOVED_FROM = 0x0000_0040;
        const MOVED_TO = 0x0000_0080;
        const CREATE = 0x0000_0100;
        const DELETE = 0x0000_0200;
        const DELETE_SELF = 0x0000_0400;
        const MOVE_SELF = 0x0000_0800;
        const UNMOUNT = 0x0000_2000;
        const Q_OVERFLOW = 0x0000_4000;
        const IGNORED = 0x0000_8000;
        const ISDIR = 0x4000_0000;
    }
}

impl fmt::Display for EventFlags {
    /// Formats as `IN_ACCESS | IN_ISDIR`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "IN_{name}")?;
            first = false;
        }

        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 || first {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{unknown:#x}")?;
        }

        Ok(())
    }
}

/// One decoded inotify record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub handle: WatchHandle,
    pub flags: EventFlags,
    /// Length of the trailing name field, padding included
    pub name_len: u32,
}

/// Iterator over the records packed in one read batch
///
/// Stops at the first incomplete record; `remaining()` then reports how
/// many bytes were left undecoded.
#[derive(Debug, Clone)]
pub struct RawEvents<'a> {
    buf: &'a [u8],
}

impl<'a> RawEvents<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet decoded
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}

impl Iterator for RawEvents<'_> {
    type Item = RawEvent;

    fn next(&mut self) -> Option<RawEvent> {
        if self.buf.remaining() < EVENT_HEADER_LEN {
            return None;
        }

        let mut cursor = self.buf;
        let wd = cursor.get_i32_ne();
        let mask = cursor.get_u32_ne();
        let _cookie = cursor.get_u32_ne();
        let name_len = cursor.get_u32_ne();

        let name_len_bytes = usize::try_from(name_len).ok()?;
        if cursor.remaining() < name_len_bytes {
            return None;
        }
        cursor.advance(name_len_bytes);
        self.buf = cursor;

        Some(RawEvent {
            handle: WatchHandle::from_raw(wd),
            flags: EventFlags::from_bits_retain(mask),
            name_len,
        })
    }
}

/// Encode one record the way the kernel lays it out
#[cfg(test)]
pub(crate) fn encode_record(out: &mut Vec<u8>, wd: i32, flags: EventFlags, name: &[u8]) {
    use bytes::BufMut;

    // Names are NUL-terminated and padded to a 4-byte boundary
    let padded = if name.is_empty() {
        0
    } else {
        (name.len() + 1).next_multiple_of(4)
    };

    out.put_i32_ne(wd);
    out.put_u32_ne(flags.bits());
    out.put_u32_ne(0);
    out.put_u32_ne(padded as u32);
    out.put_slice(name);
    out.put_bytes(0, padded - name.len());
}
