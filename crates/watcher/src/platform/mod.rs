//! Platform-specific notification backends

#[cfg(target_os = "linux")]
pub mod linux;
