//! Store handle and transaction scopes
//!
//! A `Store` owns one SQLite connection behind a mutex. Every mutation runs
//! inside [`Store::transaction`], which begins an IMMEDIATE transaction,
//! hands the closure a [`Scope`], and commits only if the closure returns
//! `Ok`. Any error (or a panic unwinding through the closure) rolls the
//! whole scope back.

use crate::association::Associations;
use crate::config::StoreConfig;
use crate::content::ContentStore;
use crate::error::Error;
use crate::schema;
use crate::tag::TagResolver;
use crate::Result;
use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Metadata store backed by a single SQLite database
pub struct Store {
    conn: Mutex<Connection>,
    config: StoreConfig,
}

impl Store {
    /// Open (or create) the store named by the configuration
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        info!(path = ?config.database, "Opening store");

        let conn = if config.is_memory() {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = config.database.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
            }
            Connection::open(&config.database)
        }
        .map_err(|source| Error::Open {
            path: config.database.clone(),
            source,
        })?;

        configure_pragmas(&conn, &config)?;
        schema::apply_migrations(&conn)?;
        schema::provision_staging(&conn)?;

        info!("Store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// In-memory store with default settings
    pub fn memory() -> Result<Self> {
        Self::open(StoreConfig::memory())
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `f` as one atomic unit of work
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Scope<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = {
            let scope = Scope::new(&tx, &self.config);
            f(&scope)
        };

        match result {
            Ok(value) => {
                tx.commit()?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Run read-only queries
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Scope<'_>) -> Result<T>,
    {
        let conn = self.conn.lock();
        let scope = Scope::new(&conn, &self.config);
        f(&scope)
    }

    /// Row counts per relation
    pub fn stats(&self) -> Result<StoreStats> {
        self.read(|scope| {
            let count = |sql: &str| -> Result<u64> {
                let n: i64 = scope.conn.query_row(sql, [], |row| row.get(0))?;
                Ok(n as u64)
            };
            Ok(StoreStats {
                tags: count("SELECT COUNT(*) FROM tag")?,
                data: count("SELECT COUNT(*) FROM data")?,
                associations: count("SELECT COUNT(*) FROM data_tag")?,
            })
        })
    }
}

/// Row counts per relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub tags: u64,
    pub data: u64,
    pub associations: u64,
}

/// Configure SQLite PRAGMA settings
fn configure_pragmas(conn: &Connection, config: &StoreConfig) -> Result<()> {
    debug!("Configuring SQLite pragmas");

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.pragma_update(None, "encoding", "UTF-8")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    let enforced: bool = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if !enforced {
        return Err(Error::Schema(
            "foreign key enforcement is unavailable".to_string(),
        ));
    }

    if config.wal_mode && !config.is_memory() {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "Journal mode set");
    }

    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}

/// Handles for one unit of work
///
/// Borrowed from a transaction (or, for reads, the bare connection); every
/// handle it gives out shares that borrow.
pub struct Scope<'a> {
    conn: &'a Connection,
    config: &'a StoreConfig,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(conn: &'a Connection, config: &'a StoreConfig) -> Self {
        Self { conn, config }
    }

    /// Tag resolver and hierarchical queries
    pub fn tags(&self) -> TagResolver<'a> {
        TagResolver::new(self.conn, &self.config.separator)
    }

    /// Content store
    pub fn content(&self) -> ContentStore<'a> {
        ContentStore::new(self.conn)
    }

    /// Association engine
    pub fn associations(&self) -> Associations<'a> {
        Associations::new(self.conn)
    }

    /// Configuration of the owning store
    pub fn config(&self) -> &'a StoreConfig {
        self.config
    }
}
