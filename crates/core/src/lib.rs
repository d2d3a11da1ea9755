//! Taggr Core - content-addressed metadata store with hierarchical tags
//!
//! This crate provides the storage/indexing engine:
//! - Schema provisioning (tags, content, associations)
//! - Hierarchical tag resolution (dotted paths, descendant closure)
//! - Content store with buffered and streamed ingestion
//! - Concurrent multi-algorithm hash pipeline
//! - Association engine with dual uniqueness rules
//! - Transaction scopes that commit or roll back as one

pub mod association;
pub mod config;
pub mod content;
pub mod error;
pub mod hash;
pub mod ingest;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod store;
pub mod tag;

// Re-export main types for convenience
pub use association::{Association, AssociationId, Associations, Value};
pub use config::StoreConfig;
pub use content::{ContentStore, DataId, IngestMode, StoredContent};
pub use error::Error;
pub use hash::{Digest, DigestAlgorithm};
pub use ingest::{ingest, IngestReport};
pub use pipeline::HashPipeline;
pub use source::{open_path, ByteSource, SeekableSource, StreamSource};
pub use store::{Scope, Store, StoreStats};
pub use tag::{split_path, Tag, TagId, TagResolver};

/// Common result type used throughout taggr-core
pub type Result<T> = std::result::Result<T, Error>;
