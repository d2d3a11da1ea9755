//! Schema management and migrations

use crate::error::Error;
use crate::Result;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
///
/// The version check and every migration run under one write lock, so
/// connections opening a fresh database at the same time provision it once.
pub fn apply_migrations(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(&tx)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version > SCHEMA_VERSION {
        return Err(Error::Schema(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < 1 {
        info!(from = current_version, to = SCHEMA_VERSION, "Applying schema migrations");
        apply_migration_v1(&tx)?;
    }

    tx.commit()?;
    Ok(())
}

/// Create the per-connection staging relation used by streamed ingestion
///
/// Temporary tables live as long as the connection, so this runs on every open.
pub fn provision_staging(conn: &Connection) -> Result<()> {
    conn.execute_batch(STAGING)
        .map_err(|e| Error::Schema(format!("Failed to create staging table: {}", e)))?;
    Ok(())
}

/// Get current schema version
pub fn current_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: tags, content and associations
fn apply_migration_v1(conn: &Connection) -> Result<()> {
    debug!("Applying migration v1: tag/data/data_tag schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| Error::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: tag
-- ============================================================================
-- Forest of named tags; children point at their parent

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER NOT NULL PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(name) > 0),
    parent_id INTEGER REFERENCES tag(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS unique_root_tags
ON tag(name)
WHERE parent_id IS NULL;

CREATE UNIQUE INDEX IF NOT EXISTS unique_tag_in_parent
ON tag(name, parent_id)
WHERE parent_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_tag_parent ON tag(parent_id);

-- ============================================================================
-- TABLE: data
-- ============================================================================
-- Content stored once per distinct byte sequence

CREATE TABLE IF NOT EXISTS data (
    id INTEGER NOT NULL PRIMARY KEY,
    bytes BLOB NOT NULL UNIQUE
);

-- ============================================================================
-- TABLE: data_tag
-- ============================================================================
-- Content/tag links with an optional value

CREATE TABLE IF NOT EXISTS data_tag (
    id INTEGER NOT NULL PRIMARY KEY,
    data_id INTEGER NOT NULL REFERENCES data(id),
    tag_id INTEGER NOT NULL REFERENCES tag(id),
    value
);

CREATE UNIQUE INDEX IF NOT EXISTS unique_data_tag
ON data_tag(data_id, tag_id)
WHERE value IS NULL;

CREATE UNIQUE INDEX IF NOT EXISTS unique_data_tag_value
ON data_tag(data_id, tag_id, value)
WHERE value IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_data_tag_tag ON data_tag(tag_id);
"#;

const STAGING: &str = r#"
CREATE TEMP TABLE IF NOT EXISTS data_ingest (
    id INTEGER NOT NULL PRIMARY KEY,
    bytes BLOB NOT NULL
);
"#;
