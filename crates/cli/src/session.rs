//! One monitoring session: discover, register, listen, report

use anyhow::{Context, Result};
use exectrack_core::{write_report, ReportSummary, SessionConfig, WatchSet};
use owo_colors::OwoColorize;
use std::path::Path;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};
use watcher::{EventLoop, EventSource, Inotify};

/// Run a session to completion
pub async fn run(config: &SessionConfig) -> Result<()> {
    let paths = watcher::discover(&config.mode).context("Error when finding files")?;

    let mut inotify = Inotify::init().context("Failed to initialize inotify instance")?;
    let watch_set = watcher::register(&mut inotify, paths)?;
    let mut reader = inotify
        .into_reader()
        .context("Failed to register inotify instance with the runtime")?;

    if watch_set.is_empty() {
        warn!("No files to watch, the report will be empty");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    listen(config, watch_set, &mut reader, stdin).await
}

/// Count accesses until `termination` yields a line, then write the report
///
/// The report is written even when the loop stops on a fatal read error;
/// the error is returned afterwards.
pub async fn listen<S, R>(
    config: &SessionConfig,
    watch_set: WatchSet,
    source: &mut S,
    termination: R,
) -> Result<()>
where
    S: EventSource + ?Sized,
    R: AsyncBufRead + Unpin,
{
    eprintln!("{}", "Listening for events... (Press enter to end)".bold());

    let mut event_loop = EventLoop::new(watch_set);
    let outcome = event_loop.run(source, termination).await;

    let watch_set = event_loop.into_watch_set();
    let report = save_report(&config.report_path, &watch_set);
    eprintln!(
        "{}",
        summary_line(&watch_set, &config.report_path, report, outcome.is_ok())
    );

    let termination = outcome?;
    info!("Session ended ({:?})", termination);
    Ok(())
}

/// Write the report, logging instead of failing
fn save_report(path: &Path, watch_set: &WatchSet) -> Option<ReportSummary> {
    match write_report(path, watch_set) {
        Ok(summary) => Some(summary),
        Err(e) => {
            let cause = std::error::Error::source(&e)
                .map(|s| s.to_string())
                .unwrap_or_default();
            warn!("Failed to save report: {}: {}", e, cause);
            None
        }
    }
}

fn summary_line(
    watch_set: &WatchSet,
    report_path: &Path,
    report: Option<ReportSummary>,
    completed: bool,
) -> String {
    let marker = if completed {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    };

    let mut line = format!(
        "{} {} files watched, {} used, {} accesses",
        marker,
        watch_set.len(),
        watch_set.accessed().count(),
        watch_set.total_accesses()
    );

    match report {
        Some(summary) => line.push_str(&format!(
            "\n{}: {} ({} entries)",
            "Report".dimmed(),
            report_path.display(),
            summary.entries
        )),
        None => line.push_str(&format!("\n{}", "Report was not saved".yellow())),
    }

    line
}
