//! Show row counts

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use taggr_core::StoreConfig;

pub fn run(config: StoreConfig) -> Result<()> {
    let database = config.database.clone();
    let store = util::open_store(config)?;
    let stats = store.stats()?;

    println!("{}", database.display().to_string().bold());
    println!("  tags:         {}", stats.tags);
    println!("  data:         {}", stats.data);
    println!("  associations: {}", stats.associations);

    Ok(())
}
