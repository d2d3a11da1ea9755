//! Insert content from a file or standard input

use crate::util;
use anyhow::{Context, Result};
use taggr_core::hash::parse_selection;
use taggr_core::StoreConfig;
use tracing::info;

pub fn run(
    mut config: StoreConfig,
    file: &str,
    buffer_size: Option<usize>,
    hashes: &[String],
) -> Result<()> {
    // 1. Validate the digest selection and buffer size up front
    let algorithms = if hashes.is_empty() {
        config.digests.clone()
    } else {
        parse_selection(hashes)?
    };
    if let Some(size) = buffer_size {
        config.chunk_size = size;
        config.validate()?;
    }

    // 2. Open the source; regular files take the known-size path
    let mut source = util::open_source(file)?;

    // 3. Store and digest in one scope
    let store = util::open_store(config)?;
    let report = store
        .transaction(|scope| taggr_core::ingest(scope, &mut *source, &algorithms))
        .with_context(|| format!("Failed to insert data from {}", file))?;

    info!(id = %report.data, mode = ?report.mode, "Inserted data");
    println!("data {}", report.data);
    for digest in &report.digests {
        println!("{}", digest);
    }

    Ok(())
}
