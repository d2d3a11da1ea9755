//! Store configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file at all) yields a working configuration.

use crate::error::Error;
use crate::hash::DigestAlgorithm;
use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound on the I/O chunk size
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default I/O chunk size
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for a store and its ingestion path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Destination store locator (a file path, or `:memory:`)
    pub database: PathBuf,
    /// Separator between hierarchical tag components
    pub separator: String,
    /// I/O chunk size in bytes
    pub chunk_size: usize,
    /// Digest algorithms applied when none are requested explicitly
    pub digests: Vec<DigestAlgorithm>,
    /// Persist each computed digest as a tag/value association
    pub record_digests: bool,
    /// How long to wait on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Write-ahead logging for file-backed stores
    pub wal_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("taggr.db"),
            separator: ".".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            digests: vec![DigestAlgorithm::Sha256],
            record_digests: true,
            busy_timeout_ms: 5000,
            wal_mode: true,
        }
    }
}

impl StoreConfig {
    /// Default configuration pointed at the given database
    pub fn new(database: impl AsRef<Path>) -> Self {
        Self {
            database: database.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// In-memory database, for tests and scratch work
    pub fn memory() -> Self {
        Self::new(":memory:")
    }

    /// Whether the locator names an in-memory database
    pub fn is_memory(&self) -> bool {
        self.database.as_os_str() == ":memory:"
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(Error::InvalidConfig("separator must not be empty".to_string()));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be between 1 and {} bytes, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.digests.is_empty() {
            return Err(Error::InvalidConfig(
                "digests must name at least one algorithm".to_string(),
            ));
        }
        if self.database.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("database must not be empty".to_string()));
        }
        Ok(())
    }

    /// Example configuration file contents
    pub fn example() -> String {
        format!(
            r#"# taggr configuration

# Destination store (file path or ":memory:")
database = "taggr.db"

# Separator between hierarchical tag components
separator = "."

# I/O chunk size in bytes (1 - {max})
chunk_size = {chunk}

# Digests computed when inserting data without -H
# Supported: {names}
digests = ["sha256"]

# Record each digest as a tag/value pair on the content
record_digests = true

# Lock wait before failing, in milliseconds
busy_timeout_ms = 5000

# Write-ahead logging for file-backed stores
wal_mode = true
"#,
            max = MAX_CHUNK_SIZE,
            chunk = DEFAULT_CHUNK_SIZE,
            names = DigestAlgorithm::ALL
                .iter()
                .map(|alg| alg.name())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
