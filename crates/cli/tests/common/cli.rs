//! CLI command execution helpers
//!
//! Wraps the `exectrack` binary so tests can run a whole session in a
//! scratch working directory and inspect the report it leaves behind.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Path to the binary under test
pub fn exectrack_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_exectrack"))
}

/// CLI command builder
pub struct ExecTrackCommand {
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin_data: String,
}

impl ExecTrackCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            stdin_data: "\n".to_string(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Replace the data written to stdin (default: a single newline)
    pub fn stdin(&mut self, data: &str) -> &mut Self {
        self.stdin_data = data.to_string();
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(exectrack_binary());
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("RUST_LOG")
            .env_remove("EXECTRACK_PATH_VAR")
            .env_remove("EXECTRACK_OUTPUT")
            .envs(&self.env);
        command
    }

    /// Run a session that ends as soon as stdin has been consumed
    pub fn execute(&self) -> Result<CommandResult> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn exectrack")?;

        if let Some(mut stdin) = child.stdin.take() {
            // The process may already have exited on a startup error
            let _ = stdin.write_all(self.stdin_data.as_bytes());
        }

        let output = child
            .wait_with_output()
            .context("Failed to wait for exectrack")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStderr: {}",
                self.args,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Start a session and wait until it is listening for events
    pub fn start_listening(&self) -> Result<RunningSession> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn exectrack")?;

        let stderr = child.stderr.take().context("stderr not captured")?;
        let mut lines = BufReader::new(stderr).lines();

        loop {
            match lines.next() {
                Some(line) => {
                    if line?.contains("Listening for events") {
                        break;
                    }
                }
                None => anyhow::bail!("exectrack exited before listening"),
            }
        }

        // Keep draining stderr so the child never blocks on a full pipe
        std::thread::spawn(move || for _ in lines {});

        Ok(RunningSession { child })
    }
}

/// A session started with `start_listening`
pub struct RunningSession {
    child: Child,
}

impl RunningSession {
    /// Send the termination line after letting pending events drain
    pub fn finish(mut self) -> Result<i32> {
        std::thread::sleep(Duration::from_millis(300));

        let mut stdin = self.child.stdin.take().context("stdin not captured")?;
        stdin.write_all(b"\n")?;
        drop(stdin);

        let status = self.child.wait().context("Failed to wait for exectrack")?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Command execution result
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// exectrack!(dir, "/usr/local/bin").assert_success()?;
/// ```
#[macro_export]
macro_rules! exectrack {
    ($dir:expr) => {{
        $crate::common::cli::ExecTrackCommand::new($dir)
    }};
    ($dir:expr, $($arg:expr),+) => {{
        let mut cmd = $crate::common::cli::ExecTrackCommand::new($dir);
        cmd.args(&[$($arg),+]);
        cmd
    }};
}
