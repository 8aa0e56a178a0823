//! Usage report writer
//!
//! The report lists every watched file that was accessed at least once,
//! one `<count> <path>` line per file, in discovery order.

use crate::target::WatchSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Report file name used when none is configured
pub const DEFAULT_REPORT_FILE: &str = "uses.log";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create report file {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write report file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What ended up in the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Lines written (targets with a non-zero count)
    pub entries: usize,
    /// Sum of all counts written
    pub total_accesses: u64,
}

/// Write the report to `path`, truncating any previous contents
pub fn write_report(path: &Path, watch_set: &WatchSet) -> Result<ReportSummary, ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    let summary = write_entries(&mut writer, watch_set)
        .and_then(|summary| writer.flush().map(|()| summary))
        .map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "Wrote {} report entries ({} accesses) to {}",
        summary.entries,
        summary.total_accesses,
        path.display()
    );

    Ok(summary)
}

/// Write report lines for every accessed target
///
/// Path bytes are written as-is so non-UTF-8 names survive.
pub fn write_entries<W: Write>(writer: &mut W, watch_set: &WatchSet) -> io::Result<ReportSummary> {
    let mut summary = ReportSummary::default();

    for target in watch_set.accessed() {
        write!(writer, "{} ", target.access_count())?;
        writer.write_all(target.path().as_os_str().as_bytes())?;
        writer.write_all(b"\n")?;

        summary.entries += 1;
        summary.total_accesses += target.access_count();
    }

    Ok(summary)
}
