//! exectrack - count how often executables are run

use anyhow::{Context, Result};
use clap::Parser;
use exectrack_core::{DiscoveryMode, SessionConfig, DEFAULT_PATH_VAR, DEFAULT_REPORT_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod session;

/// Count read accesses to executables until Enter is pressed, then write
/// the counts to a report
#[derive(Parser)]
#[command(name = "exectrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch (default: every directory in the search path)
    dir: Option<PathBuf>,

    /// Environment variable holding the colon-delimited search path
    #[arg(long, env = "EXECTRACK_PATH_VAR", default_value = DEFAULT_PATH_VAR)]
    path_var: String,

    /// Report file, overwritten on every run
    #[arg(short, long, env = "EXECTRACK_OUTPUT", default_value = DEFAULT_REPORT_FILE)]
    output: PathBuf,

    /// Log every counted access
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> SessionConfig {
        let mode = match self.dir {
            Some(dir) => DiscoveryMode::Directory(dir),
            None => DiscoveryMode::SearchPath { var: self.path_var },
        };
        SessionConfig::new(mode, self.output)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Usage errors exit here, before anything is allocated
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = cli.into_config();
    config.validate().context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(session::run(&config));

    // A stdin read may still be parked on a blocking thread after a fatal error
    runtime.shutdown_background();

    result
}
