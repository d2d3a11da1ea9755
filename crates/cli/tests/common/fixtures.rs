//! Scratch databases for end-to-end tests

use super::cli::TaggrCommand;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding one metadata database
pub struct TestDb {
    dir: TempDir,
    db: String,
}

impl TestDb {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        Ok(Self {
            dir,
            db: "meta.db".to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Database path as passed on the command line
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Command against this database: `taggr meta.db <args>`
    pub fn cmd(&self, args: &[&str]) -> TaggrCommand {
        let mut cmd = TaggrCommand::new(self.root());
        cmd.args(&[self.db()]).args(args);
        cmd
    }

    /// One counter from `taggr <db> stats`
    pub fn stat(&self, key: &str) -> Result<u64> {
        let result = self.cmd(&["stats"]).assert_success()?;
        let line = result
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with(key) && l[key.len()..].starts_with(':'))
            .ok_or_else(|| anyhow::anyhow!("no {} counter in {}", key, result.stdout))?;
        Ok(line[key.len() + 1..].trim().parse()?)
    }

    /// Write a file into the scratch directory
    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.root().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
