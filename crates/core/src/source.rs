//! Byte sources feeding the content store
//!
//! A source is either random-access (its remaining length can be measured
//! up front) or a plain stream. Chunks come back as `Bytes` so the same
//! allocation can be handed to storage and to every hash worker.

use bytes::Bytes;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Chunked reader with optional random access
pub trait ByteSource {
    /// Whether `seek` and `remaining_len` are meaningful
    fn is_random_access(&self) -> bool;

    /// Read the next chunk of at most `max` bytes; `None` at end of stream
    fn read_chunk(&mut self, max: usize) -> io::Result<Option<Bytes>>;

    /// Current position from the start of the source
    fn position(&mut self) -> io::Result<u64>;

    /// Move to a new position
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Bytes left between the current position and the end
    ///
    /// Restores the position before returning. `None` for streams.
    fn remaining_len(&mut self) -> io::Result<Option<u64>> {
        if !self.is_random_access() {
            return Ok(None);
        }
        let original = self.position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(original))?;
        Ok(Some(end.saturating_sub(original)))
    }
}

/// Read one chunk, retrying on interruption
fn read_once<R: Read>(reader: &mut R, max: usize) -> io::Result<Option<Bytes>> {
    let mut buf = vec![0u8; max.max(1)];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(n) => {
                buf.truncate(n);
                return Ok(Some(Bytes::from(buf)));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Random-access source over anything `Read + Seek`
pub struct SeekableSource<R> {
    inner: R,
}

impl<R: Read + Seek> SeekableSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for SeekableSource<R> {
    fn is_random_access(&self) -> bool {
        true
    }

    fn read_chunk(&mut self, max: usize) -> io::Result<Option<Bytes>> {
        read_once(&mut self.inner, max)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Forward-only source over anything `Read`
pub struct StreamSource<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn is_random_access(&self) -> bool {
        false
    }

    fn read_chunk(&mut self, max: usize) -> io::Result<Option<Bytes>> {
        let chunk = read_once(&mut self.inner, max)?;
        if let Some(chunk) = &chunk {
            self.position += chunk.len() as u64;
        }
        Ok(chunk)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream source does not support seeking",
        ))
    }
}

/// Open a path as a byte source
///
/// Regular files are random-access; pipes, FIFOs and character devices
/// fail the seek probe and fall back to the stream path.
pub fn open_path(path: &Path) -> io::Result<Box<dyn ByteSource + Send>> {
    let mut file = File::open(path)?;
    if file.stream_position().is_ok() && file.metadata()?.is_file() {
        Ok(Box::new(SeekableSource::new(file)))
    } else {
        Ok(Box::new(StreamSource::new(file)))
    }
}
