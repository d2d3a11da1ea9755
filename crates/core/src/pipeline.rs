//! Concurrent multi-algorithm hash pipeline
//!
//! One worker thread per algorithm, each draining its own unbounded channel.
//! The producer pushes every chunk to every lane before reading the next one,
//! then pushes a single end marker per lane. A slow algorithm only grows its
//! own queue; it never holds back the producer or the other lanes.

use crate::error::Error;
use crate::hash::{Digest, DigestAlgorithm};
use crate::Result;
use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Message on a lane's private queue
enum Feed {
    Chunk(Bytes),
    End,
}

struct Lane {
    algorithm: DigestAlgorithm,
    tx: Sender<Feed>,
    handle: JoinHandle<Option<Digest>>,
}

/// Fan-out of one byte stream to one accumulator per algorithm
///
/// Dropping the pipeline without calling [`HashPipeline::finish`] abandons
/// it: the queues disconnect, each worker exits without a digest, and
/// nothing is joined.
pub struct HashPipeline {
    lanes: Vec<Lane>,
    chunks: u64,
    bytes: u64,
}

impl HashPipeline {
    /// Spawn one worker per algorithm
    pub fn spawn(algorithms: &[DigestAlgorithm]) -> Result<Self> {
        let mut lanes = Vec::with_capacity(algorithms.len());

        for &algorithm in algorithms {
            let (tx, rx) = unbounded();
            let handle = thread::Builder::new()
                .name(format!("hash-{}", algorithm))
                .spawn(move || run_lane(algorithm, rx))
                .map_err(Error::Ingest)?;
            lanes.push(Lane {
                algorithm,
                tx,
                handle,
            });
        }

        debug!(lanes = lanes.len(), "Spawned hash pipeline");
        Ok(Self {
            lanes,
            chunks: 0,
            bytes: 0,
        })
    }

    /// Algorithms in lane order
    pub fn algorithms(&self) -> Vec<DigestAlgorithm> {
        self.lanes.iter().map(|lane| lane.algorithm).collect()
    }

    /// Push the same chunk to every lane
    pub fn feed(&mut self, chunk: &Bytes) -> Result<()> {
        for lane in &self.lanes {
            lane.tx
                .send(Feed::Chunk(chunk.clone()))
                .map_err(|_| Error::HashWorker(lane.algorithm))?;
        }
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    /// Signal end of stream and collect one digest per algorithm, in lane order
    pub fn finish(self) -> Result<Vec<Digest>> {
        for lane in &self.lanes {
            lane.tx
                .send(Feed::End)
                .map_err(|_| Error::HashWorker(lane.algorithm))?;
        }

        let mut digests = Vec::with_capacity(self.lanes.len());
        for lane in self.lanes {
            match lane.handle.join() {
                Ok(Some(digest)) => digests.push(digest),
                Ok(None) | Err(_) => return Err(Error::HashWorker(lane.algorithm)),
            }
        }

        debug!(
            chunks = self.chunks,
            bytes = self.bytes,
            digests = digests.len(),
            "Hash pipeline finished"
        );
        Ok(digests)
    }

    /// Discard the pipeline without waiting for any worker
    pub fn abandon(self) {
        if !self.lanes.is_empty() {
            warn!(
                lanes = self.lanes.len(),
                bytes = self.bytes,
                "Abandoning hash pipeline"
            );
        }
    }
}

fn run_lane(algorithm: DigestAlgorithm, rx: Receiver<Feed>) -> Option<Digest> {
    let mut acc = algorithm.accumulator();
    for feed in rx.iter() {
        match feed {
            Feed::Chunk(chunk) => acc.update(&chunk),
            Feed::End => return Some(acc.finalize()),
        }
    }
    // Producer went away without an end marker
    None
}
