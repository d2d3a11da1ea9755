//! List content carrying a tag

use crate::util;
use anyhow::Result;
use taggr_core::StoreConfig;

pub fn run(config: StoreConfig, tag: &str, recursive: bool) -> Result<()> {
    util::validate_paths([tag], &config.separator)?;
    let store = util::open_store(config)?;

    let ids = store.read(|scope| {
        let id = util::existing_tag(scope, tag)?;
        scope.associations().data_with_tag(id, recursive)
    })?;

    for id in ids {
        println!("{}", id);
    }

    Ok(())
}
