//! Insert hierarchical tags

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use taggr_core::StoreConfig;

pub fn run(config: StoreConfig, tags: &[String]) -> Result<()> {
    // 1. Reject malformed paths before opening anything
    util::validate_paths(tags.iter().map(String::as_str), &config.separator)?;

    // 2. Resolve every path in one scope: all persist or none do
    let store = util::open_store(config)?;
    let ids = store.transaction(|scope| {
        let resolver = scope.tags();
        tags.iter().map(|path| resolver.resolve(path)).collect::<taggr_core::Result<Vec<_>>>()
    })?;

    for (path, id) in tags.iter().zip(ids) {
        println!("{} tag {} {}", "✓".green(), id, path.yellow());
    }

    Ok(())
}
