//! Show a content item and its associations

use crate::util;
use anyhow::{anyhow, Result};
use owo_colors::OwoColorize;
use taggr_core::{DataId, StoreConfig};

pub fn run(config: StoreConfig, data: i64) -> Result<()> {
    let data = DataId::new(data);
    let store = util::open_store(config)?;

    let (size, lines) = store.read(|scope| {
        let size = scope.content().size(data)?;
        let tags = scope.tags();
        let mut lines = Vec::new();
        for association in scope.associations().for_data(data)? {
            let name = tags.full_name(association.tag)?;
            lines.push(match association.value {
                Some(value) => format!("{}={}", name, value),
                None => name,
            });
        }
        Ok((size, lines))
    })?;

    let size = size.ok_or_else(|| anyhow!("Content {} not found", data))?;
    println!("data {} {}", data, format!("({} bytes)", size).dimmed());
    for line in lines {
        println!("  {}", line);
    }

    Ok(())
}
