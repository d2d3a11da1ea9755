//! Content ingestion with concurrent digests
//!
//! Ties the content store to the hash pipeline: every chunk written to
//! storage is pushed to one worker per requested algorithm. When the store
//! is configured to record digests, each one is attached to the content as
//! an association with the algorithm's hierarchical tag (`SHA.2.256`) and
//! the hex digest as value.

use crate::association::Value;
use crate::content::{DataId, IngestMode};
use crate::hash::{Digest, DigestAlgorithm};
use crate::pipeline::HashPipeline;
use crate::source::ByteSource;
use crate::store::Scope;
use crate::Result;
use tracing::{debug, info};

/// Result of one ingestion
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub data: DataId,
    pub size: u64,
    pub mode: IngestMode,
    /// One digest per requested algorithm, in request order
    pub digests: Vec<Digest>,
}

/// Stream `source` into the store within `scope`, digesting as it goes
///
/// On any failure the hash workers are abandoned rather than awaited, and
/// the error propagates so the enclosing transaction rolls back.
pub fn ingest(
    scope: &Scope<'_>,
    source: &mut dyn ByteSource,
    algorithms: &[DigestAlgorithm],
) -> Result<IngestReport> {
    let config = scope.config();
    let mut pipeline = HashPipeline::spawn(algorithms)?;

    let stored = match scope
        .content()
        .ingest(source, config.chunk_size, &mut pipeline)
    {
        Ok(stored) => stored,
        Err(err) => {
            pipeline.abandon();
            return Err(err);
        }
    };
    let digests = pipeline.finish()?;

    if config.record_digests {
        record_digests(scope, stored.data, &digests)?;
    }

    info!(
        id = %stored.data,
        size = stored.size,
        digests = digests.len(),
        "Ingestion complete"
    );
    Ok(IngestReport {
        data: stored.data,
        size: stored.size,
        mode: stored.mode,
        digests,
    })
}

/// Attach each digest to the content under its algorithm's tag
fn record_digests(scope: &Scope<'_>, data: DataId, digests: &[Digest]) -> Result<()> {
    let tags = scope.tags();
    let associations = scope.associations();

    for digest in digests {
        let tag = tags.resolve_components(digest.algorithm().tag_components())?;
        let value = Value::Text(digest.to_hex());
        associations.ensure(data, tag, Some(&value))?;
        debug!(data = %data, algorithm = %digest.algorithm(), "Recorded digest");
    }
    Ok(())
}
