//! Core data model for exectrack
//!
//! This crate provides:
//! - Watch targets and the ordered watch set (handle → target resolution)
//! - Session configuration (discovery mode, report location)
//! - The usage report writer (`uses.log`)

pub mod config;
pub mod report;
pub mod target;

// Re-exports
pub use config::{ConfigError, DiscoveryMode, SessionConfig, DEFAULT_PATH_VAR};
pub use report::{write_report, ReportError, ReportSummary, DEFAULT_REPORT_FILE};
pub use target::{WatchHandle, WatchSet, WatchTarget};
