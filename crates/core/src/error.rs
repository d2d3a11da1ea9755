//! Error types for the metadata store

use crate::association::Value;
use crate::content::DataId;
use crate::hash::DigestAlgorithm;
use crate::tag::TagId;
use rusqlite::{ffi, ErrorCode};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Store error type
#[derive(Error, Debug)]
pub enum Error {
    /// A dotted tag path with an empty component
    #[error("malformed tag path {path:?}: empty component at position {position}")]
    MalformedTagPath { path: String, position: usize },

    /// Digest algorithm name not in the supported set
    #[error("unsupported digest algorithm: {0:?}")]
    UnsupportedDigest(String),

    /// A tag value that cannot be stored
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Duplicate tag under the same parent
    #[error("tag {name:?} already exists under {}", describe_parent(.parent))]
    TagExists { name: String, parent: Option<TagId> },

    /// Duplicate association under the dual uniqueness rule
    #[error("association already exists: data {data}, tag {tag}{}", describe_value(.value))]
    AssociationExists {
        data: DataId,
        tag: TagId,
        value: Option<Value>,
    },

    /// Reference to a content item or tag that does not exist
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// Source read or storage write failure while streaming
    #[error("ingestion failed: {0}")]
    Ingest(#[source] io::Error),

    /// Source yielded a different number of bytes than it announced
    #[error("content length mismatch: expected {expected} bytes, source yielded {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Content exceeds what a single blob can hold
    #[error("content too large to store: {0} bytes")]
    ContentTooLarge(u64),

    /// A hash worker exited before yielding its digest
    #[error("hash worker for {0} stopped unexpectedly")]
    HashWorker(DigestAlgorithm),

    /// The store could not be opened
    #[error("cannot open store at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The directory holding the store could not be created
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Schema provisioning failed
    #[error("schema error: {0}")]
    Schema(String),

    /// Configuration file could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be parsed
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Whether the error was raised by input validation, before any mutation
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::MalformedTagPath { .. }
                | Error::UnsupportedDigest(_)
                | Error::MalformedValue(_)
                | Error::InvalidConfig(_)
                | Error::ConfigParse(_)
        )
    }

    /// Whether the error is a translated uniqueness or reference violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::TagExists { .. } | Error::AssociationExists { .. } | Error::MissingReference(_)
        )
    }
}

fn describe_parent(parent: &Option<TagId>) -> String {
    match parent {
        Some(id) => format!("parent {}", id),
        None => "the root".to_string(),
    }
}

fn describe_value(value: &Option<Value>) -> String {
    match value {
        Some(v) => format!(", value {}", v),
        None => String::new(),
    }
}

/// Storage-engine constraint that rejected a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
    NotNull,
    Other,
}

/// Classify a rusqlite error as a constraint violation, if it is one
pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Constraint::Unique
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
                ffi::SQLITE_CONSTRAINT_NOTNULL => Constraint::NotNull,
                _ => Constraint::Other,
            })
        }
        _ => None,
    }
}
