//! Content-addressed blob storage
//!
//! Content is keyed by its exact bytes: the `data.bytes` column is unique,
//! so inserting the same bytes twice resolves to the same row.
//!
//! Streamed content of known length goes through the connection-private
//! staging table. A zero-filled blob of the announced size is reserved there
//! first, then filled chunk by chunk through incremental blob I/O, so memory
//! use stays at one chunk. Once the blob is complete it is promoted into
//! `data`. SQLite refuses incremental writes to an indexed column, which is
//! why the reservation cannot happen in `data` directly.
//!
//! Streams of unknown length are drained into memory and take the buffered
//! path.

use crate::error::Error;
use crate::pipeline::HashPipeline;
use crate::source::ByteSource;
use crate::Result;
use rusqlite::blob::ZeroBlob;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::limits::Limit;
use rusqlite::{params, Connection, DatabaseName, ErrorCode, OptionalExtension};
use std::fmt;
use std::io::Write;
use tracing::{debug, info};

/// Opaque content identity
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct DataId(i64);

impl DataId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for DataId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for DataId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(DataId)
    }
}

/// Path a streamed ingestion took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Length measured up front; written incrementally into a reserved blob
    KnownSize,
    /// Length unknown; drained into memory then inserted whole
    Buffered,
}

/// Outcome of streaming one source into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredContent {
    pub data: DataId,
    pub size: u64,
    pub mode: IngestMode,
}

/// Content store bound to one scope
pub struct ContentStore<'a> {
    conn: &'a Connection,
}

impl<'a> ContentStore<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Largest blob the connection accepts, in bytes
    pub fn max_content_len(&self) -> u64 {
        self.conn.limit(Limit::SQLITE_LIMIT_LENGTH).max(0) as u64
    }

    /// Insert-or-find fully materialized content
    pub fn insert_bytes(&self, bytes: &[u8]) -> Result<DataId> {
        let size = bytes.len() as u64;
        if size > self.max_content_len() {
            return Err(Error::ContentTooLarge(size));
        }

        let inserted = self
            .conn
            .execute(
                "INSERT INTO data (bytes) VALUES (?1) ON CONFLICT(bytes) DO NOTHING",
                params![bytes],
            )
            .map_err(|e| too_big(e, size))?;

        let id = self.find(bytes)?.ok_or_else(|| {
            Error::MissingReference("content vanished after insert".to_string())
        })?;
        debug!(id = %id, size = bytes.len(), new = inserted > 0, "Stored content");
        Ok(id)
    }

    /// Stream a source into the store, feeding every chunk to `pipeline`
    ///
    /// The caller owns the pipeline and decides whether to finish or
    /// abandon it based on the result.
    pub fn ingest(
        &self,
        source: &mut dyn ByteSource,
        chunk_size: usize,
        pipeline: &mut HashPipeline,
    ) -> Result<StoredContent> {
        let announced = source.remaining_len().map_err(Error::Ingest)?;

        let stored = match announced {
            Some(size) => {
                let data = self.ingest_known_size(source, size, chunk_size, pipeline)?;
                StoredContent {
                    data,
                    size,
                    mode: IngestMode::KnownSize,
                }
            }
            None => {
                let (data, size) = self.ingest_buffered(source, chunk_size, pipeline)?;
                StoredContent {
                    data,
                    size,
                    mode: IngestMode::Buffered,
                }
            }
        };

        info!(
            id = %stored.data,
            size = stored.size,
            mode = ?stored.mode,
            "Ingested content"
        );
        Ok(stored)
    }

    fn ingest_known_size(
        &self,
        source: &mut dyn ByteSource,
        size: u64,
        chunk_size: usize,
        pipeline: &mut HashPipeline,
    ) -> Result<DataId> {
        if size > self.max_content_len() {
            return Err(Error::ContentTooLarge(size));
        }

        let staging = self.reserve(size)?;
        let result = self
            .fill(staging, source, size, chunk_size, pipeline)
            .and_then(|()| self.promote(staging));

        // Staging rows never outlive one ingestion
        let cleared = self
            .conn
            .execute("DELETE FROM temp.data_ingest WHERE id = ?1", [staging]);

        let id = result?;
        cleared?;
        Ok(id)
    }

    /// Reserve a zero-filled staging blob of `size` bytes
    fn reserve(&self, size: u64) -> Result<i64> {
        let len = i32::try_from(size).map_err(|_| Error::ContentTooLarge(size))?;
        self.conn
            .execute(
                "INSERT INTO temp.data_ingest (bytes) VALUES (?1)",
                [ZeroBlob(len)],
            )
            .map_err(|e| too_big(e, size))?;
        let staging = self.conn.last_insert_rowid();
        debug!(staging, size, "Reserved staging blob");
        Ok(staging)
    }

    /// Copy the source into the reserved blob one chunk at a time
    fn fill(
        &self,
        staging: i64,
        source: &mut dyn ByteSource,
        size: u64,
        chunk_size: usize,
        pipeline: &mut HashPipeline,
    ) -> Result<()> {
        let mut blob =
            self.conn
                .blob_open(DatabaseName::Temp, "data_ingest", "bytes", staging, false)?;

        let mut written: u64 = 0;
        while let Some(chunk) = source.read_chunk(chunk_size).map_err(Error::Ingest)? {
            let next = written + chunk.len() as u64;
            if next > size {
                return Err(Error::SizeMismatch {
                    expected: size,
                    actual: next,
                });
            }
            blob.write_all(&chunk).map_err(Error::Ingest)?;
            pipeline.feed(&chunk)?;
            written = next;
        }

        if written != size {
            return Err(Error::SizeMismatch {
                expected: size,
                actual: written,
            });
        }
        Ok(())
    }

    /// Move a completed staging blob into `data`, reusing an existing row
    fn promote(&self, staging: i64) -> Result<DataId> {
        let inserted = self.conn.execute(
            "INSERT INTO data (bytes)
             SELECT bytes FROM temp.data_ingest WHERE id = ?1
             ON CONFLICT(bytes) DO NOTHING",
            [staging],
        )?;

        let id: DataId = self.conn.query_row(
            "SELECT d.id FROM data d
             JOIN temp.data_ingest s ON s.bytes = d.bytes
             WHERE s.id = ?1",
            [staging],
            |row| row.get(0),
        )?;
        debug!(id = %id, staging, new = inserted > 0, "Promoted staging blob");
        Ok(id)
    }

    fn ingest_buffered(
        &self,
        source: &mut dyn ByteSource,
        chunk_size: usize,
        pipeline: &mut HashPipeline,
    ) -> Result<(DataId, u64)> {
        let limit = self.max_content_len();
        let mut buffer = Vec::new();
        while let Some(chunk) = source.read_chunk(chunk_size).map_err(Error::Ingest)? {
            let next = (buffer.len() + chunk.len()) as u64;
            if next > limit {
                return Err(Error::ContentTooLarge(next));
            }
            buffer.extend_from_slice(&chunk);
            pipeline.feed(&chunk)?;
        }

        let size = buffer.len() as u64;
        debug!(size, "Drained stream into memory");
        Ok((self.insert_bytes(&buffer)?, size))
    }

    /// Identity of stored bytes, if present
    pub fn find(&self, bytes: &[u8]) -> Result<Option<DataId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM data WHERE bytes = ?1",
                params![bytes],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn exists(&self, id: DataId) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM data WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Stored length in bytes
    pub fn size(&self, id: DataId) -> Result<Option<u64>> {
        let len: Option<i64> = self
            .conn
            .query_row("SELECT length(bytes) FROM data WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(len.map(|n| n as u64))
    }

    /// Full stored bytes
    pub fn read(&self, id: DataId) -> Result<Option<Vec<u8>>> {
        let bytes = self
            .conn
            .query_row("SELECT bytes FROM data WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(bytes)
    }

    /// Number of stored content items
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM data", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

/// Report the engine's length limit as oversized content
fn too_big(err: rusqlite::Error, size: u64) -> Error {
    match err.sqlite_error_code() {
        Some(ErrorCode::TooBig) => Error::ContentTooLarge(size),
        _ => Error::Sqlite(err),
    }
}
