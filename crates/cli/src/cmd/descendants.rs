//! List a tag and everything below it

use crate::util;
use anyhow::Result;
use taggr_core::StoreConfig;

pub fn run(config: StoreConfig, tag: &str) -> Result<()> {
    util::validate_paths([tag], &config.separator)?;
    let store = util::open_store(config)?;

    let mut names = store.read(|scope| {
        let id = util::existing_tag(scope, tag)?;
        let tags = scope.tags();
        tags.descendants(id)?
            .into_iter()
            .map(|t| tags.full_name(t.id))
            .collect::<taggr_core::Result<Vec<_>>>()
    })?;
    names.sort();

    for name in names {
        println!("{}", name);
    }

    Ok(())
}
