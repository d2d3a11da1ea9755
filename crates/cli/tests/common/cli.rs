//! CLI command execution helpers with automatic timing
//!
//! This module provides a wrapper around the `taggr` CLI binary that
//! measures execution time and provides convenient assertion methods.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct TaggrCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin_data: Option<Vec<u8>>,
}

impl TaggrCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_taggr")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            stdin_data: None,
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

    /// Provide stdin data
    pub fn stdin(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.stdin_data = Some(data.into());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = if let Some(data) = &self.stdin_data {
            command.stdin(Stdio::piped());
            let mut child = command.spawn().context("Failed to spawn command")?;

            // Write stdin, then close it so the binary sees end of stream.
            // A binary that fails early may exit before reading any of it.
            if let Some(mut stdin) = child.stdin.take() {
                use std::io::{ErrorKind, Write};
                if let Err(e) = stdin.write_all(data) {
                    if e.kind() != ErrorKind::BrokenPipe {
                        return Err(e.into());
                    }
                }
            }

            child
                .wait_with_output()
                .context("Failed to wait for command")?
        } else {
            command.stdin(Stdio::null());
            command.output().context("Failed to execute command")?
        };

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Parse the content identity from `data <id>` output
    pub fn parse_data_id(&self) -> Option<i64> {
        self.stdout
            .lines()
            .find_map(|line| line.strip_prefix("data "))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|id| id.parse().ok())
    }

    /// Parse `<algorithm> <hex>` digest lines
    pub fn parse_digests(&self) -> HashMap<String, String> {
        self.stdout
            .lines()
            .filter(|line| !line.starts_with("data "))
            .filter_map(|line| line.split_once(' '))
            .map(|(alg, hex)| (alg.to_string(), hex.trim().to_string()))
            .collect()
    }

    /// Non-empty stdout lines
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().filter(|l| !l.trim().is_empty()).collect()
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// taggr!(dir, "meta.db", "insert", "tags", "a.b").assert_success()?;
/// taggr!(dir, "meta.db", "insert", "data", "-").stdin(b"bytes".to_vec()).assert_success()?;
/// ```
#[macro_export]
macro_rules! taggr {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::TaggrCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str) -> CommandResult {
        CommandResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_parse_data_id() {
        assert_eq!(result("data 42\nsha256 abcd\n").parse_data_id(), Some(42));
        assert_eq!(result("data 7 (3 bytes)\n").parse_data_id(), Some(7));
        assert_eq!(result("nothing here\n").parse_data_id(), None);
    }

    #[test]
    fn test_parse_digests() {
        let digests = result("data 1\nsha256 abcd\nmd5 ef01\n").parse_digests();
        assert_eq!(digests.len(), 2);
        assert_eq!(digests["sha256"], "abcd");
        assert_eq!(digests["md5"], "ef01");
    }
}
