//! List tags by full hierarchical name

use crate::util;
use anyhow::Result;
use taggr_core::StoreConfig;

pub fn run(config: StoreConfig, roots_only: bool) -> Result<()> {
    let store = util::open_store(config)?;

    let mut names = store.read(|scope| {
        let tags = scope.tags();
        let listed = if roots_only { tags.roots()? } else { tags.all()? };
        listed
            .into_iter()
            .map(|tag| tags.full_name(tag.id))
            .collect::<taggr_core::Result<Vec<_>>>()
    })?;
    names.sort();

    for name in names {
        println!("{}", name);
    }

    Ok(())
}
