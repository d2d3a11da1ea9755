//! Associate stored content with tags

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use taggr_core::{DataId, StoreConfig};

pub fn run(config: StoreConfig, data: i64, assignments: &[String]) -> Result<()> {
    let data = DataId::new(data);
    let parsed: Vec<_> = assignments.iter().map(|a| util::parse_assignment(a)).collect();
    util::validate_paths(parsed.iter().map(|(path, _)| *path), &config.separator)?;

    let store = util::open_store(config)?;
    store
        .transaction(|scope| {
            if !scope.content().exists(data)? {
                return Err(taggr_core::Error::MissingReference(format!("content {}", data)));
            }

            let resolver = scope.tags();
            let associations = scope.associations();
            for (path, value) in &parsed {
                let tag = resolver.resolve(path)?;
                associations.associate(data, tag, value.as_ref())?;
            }
            Ok(())
        })
        .with_context(|| format!("Failed to tag data {}", data))?;

    for (path, value) in &parsed {
        match value {
            Some(value) => println!("{} {} {}={}", "✓".green(), data, path.yellow(), value),
            None => println!("{} {} {}", "✓".green(), data, path.yellow()),
        }
    }

    Ok(())
}
