//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use taggr_core::{
    open_path, split_path, ByteSource, Scope, Store, StoreConfig, StreamSource, TagId, Value,
};

/// Build the store configuration from the config file and command-line overrides
pub fn load_config(
    database: &Path,
    config_file: Option<&Path>,
    separator: Option<String>,
) -> Result<StoreConfig> {
    let mut config = match config_file {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };

    config.database = database.to_path_buf();
    if let Some(separator) = separator {
        config.separator = separator;
    }
    config.validate()?;
    Ok(config)
}

/// Open the store, naming the database on failure
pub fn open_store(config: StoreConfig) -> Result<Store> {
    let database = config.database.clone();
    Store::open(config)
        .with_context(|| format!("Failed to open metadata database {}", database.display()))
}

/// Open a path, or standard input for "-"
pub fn open_source(file: &str) -> Result<Box<dyn ByteSource + Send>> {
    if file == "-" {
        return Ok(Box::new(StreamSource::new(io::stdin())));
    }
    open_path(Path::new(file)).with_context(|| format!("Failed to open {}", file))
}

/// Split `TAG=VALUE` at the first `=`
///
/// Values are typed by [`Value::parse_literal`].
pub fn parse_assignment(arg: &str) -> (&str, Option<Value>) {
    match arg.split_once('=') {
        Some((tag, value)) => (tag, Some(Value::parse_literal(value))),
        None => (arg, None),
    }
}

/// Reject malformed tag paths before anything touches the store
pub fn validate_paths<'a, I>(paths: I, separator: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for path in paths {
        split_path(path, separator)?;
    }
    Ok(())
}

/// Look up an existing tag, failing if any component is missing
pub fn existing_tag(scope: &Scope<'_>, path: &str) -> taggr_core::Result<TagId> {
    scope
        .tags()
        .find(path)?
        .ok_or_else(|| taggr_core::Error::MissingReference(format!("tag '{}'", path)))
}

/// Process exit status for a failed command
///
/// Malformed input exits with 2, every other failure with 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let malformed = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<taggr_core::Error>())
        .any(|e| e.is_malformed_input());
    if malformed {
        2
    } else {
        1
    }
}
