//! Hierarchical tag resolution
//!
//! A dotted name such as `a.b.c` is a path from a root tag down to a leaf.
//! Resolution walks the path from the root, reusing each component that
//! already exists under the current parent and creating the ones that don't.
//! Tags only ever point at their parent, so the forest is acyclic by
//! construction.

use crate::error::{constraint_kind, Constraint, Error};
use crate::Result;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use tracing::debug;

/// Opaque tag identity
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TagId(i64);

impl TagId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for TagId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for TagId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TagId)
    }
}

/// A node in the tag forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub parent: Option<TagId>,
}

/// Split a hierarchical name into its components
///
/// Empty components (leading, trailing or doubled separators) are rejected
/// with the position of the first one.
pub fn split_path<'p>(path: &'p str, separator: &str) -> Result<Vec<&'p str>> {
    let components: Vec<&str> = path.split(separator).collect();
    if let Some(position) = components.iter().position(|c| c.is_empty()) {
        return Err(Error::MalformedTagPath {
            path: path.to_string(),
            position,
        });
    }
    Ok(components)
}

/// Tag resolver and read path over the tag forest
pub struct TagResolver<'a> {
    conn: &'a Connection,
    separator: &'a str,
}

impl<'a> TagResolver<'a> {
    pub(crate) fn new(conn: &'a Connection, separator: &'a str) -> Self {
        Self { conn, separator }
    }

    /// Separator used to split dotted names
    pub fn separator(&self) -> &str {
        self.separator
    }

    /// Resolve a dotted name to its leaf tag, creating missing ancestors
    pub fn resolve(&self, path: &str) -> Result<TagId> {
        let components = split_path(path, self.separator)?;
        self.resolve_components(&components)
    }

    /// Resolve pre-split components to the leaf tag, creating missing ones
    pub fn resolve_components<S: AsRef<str>>(&self, components: &[S]) -> Result<TagId> {
        validate_components(components, self.separator)?;

        let mut current: Option<TagId> = None;
        for component in components {
            let name = component.as_ref();
            let next = match self.find_child(name, current)? {
                Some(id) => {
                    debug!(name, id = %id, "Reusing tag");
                    id
                }
                None => self.create(name, current)?,
            };
            current = Some(next);
        }

        // validate_components rejects an empty slice
        current.ok_or_else(|| Error::MalformedTagPath {
            path: String::new(),
            position: 0,
        })
    }

    /// Look up a dotted name without creating anything
    pub fn find(&self, path: &str) -> Result<Option<TagId>> {
        let components = split_path(path, self.separator)?;

        let mut current: Option<TagId> = None;
        for name in components {
            match self.find_child(name, current)? {
                Some(id) => current = Some(id),
                None => return Ok(None),
            }
        }
        Ok(current)
    }

    /// Look up a tag by name under a parent (`None` = among roots)
    pub fn find_child(&self, name: &str, parent: Option<TagId>) -> Result<Option<TagId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM tag WHERE name = ?1 AND parent_id IS ?2",
                params![name, parent],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn create(&self, name: &str, parent: Option<TagId>) -> Result<TagId> {
        match self.conn.execute(
            "INSERT INTO tag (name, parent_id) VALUES (?1, ?2)",
            params![name, parent],
        ) {
            Ok(_) => {
                let id = TagId(self.conn.last_insert_rowid());
                debug!(name, id = %id, parent = ?parent, "Created tag");
                Ok(id)
            }
            Err(e) => match constraint_kind(&e) {
                // Another writer created it between lookup and insert
                Some(Constraint::Unique) => {
                    self.find_child(name, parent)?
                        .ok_or_else(|| Error::TagExists {
                            name: name.to_string(),
                            parent,
                        })
                }
                Some(Constraint::ForeignKey) => Err(Error::MissingReference(format!(
                    "parent tag {} of {:?}",
                    parent.map_or_else(|| "?".to_string(), |p| p.to_string()),
                    name
                ))),
                _ => Err(e.into()),
            },
        }
    }

    /// Fetch one tag
    pub fn get(&self, id: TagId) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, name, parent_id FROM tag WHERE id = ?1",
                [id],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Every tag
    pub fn all(&self) -> Result<Vec<Tag>> {
        self.collect("SELECT id, name, parent_id FROM tag ORDER BY id", [])
    }

    /// Tags without a parent
    pub fn roots(&self) -> Result<Vec<Tag>> {
        self.collect(
            "SELECT id, name, parent_id FROM tag WHERE parent_id IS NULL ORDER BY id",
            [],
        )
    }

    /// Direct children of a tag
    pub fn children(&self, id: TagId) -> Result<Vec<Tag>> {
        self.collect(
            "SELECT id, name, parent_id FROM tag WHERE parent_id = ?1 ORDER BY id",
            [id],
        )
    }

    /// Transitive closure below a tag, including the tag itself
    ///
    /// One recursive query: seed with the start row, then keep adding rows
    /// whose parent is already in the set until nothing new appears.
    pub fn descendants(&self, id: TagId) -> Result<Vec<Tag>> {
        self.collect(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM tag WHERE id = ?1
                UNION
                SELECT t.id FROM tag t
                JOIN subtree s ON t.parent_id = s.id
            )
            SELECT t.id, t.name, t.parent_id
            FROM tag t
            JOIN subtree s ON t.id = s.id
            ORDER BY t.id
            "#,
            [id],
        )
    }

    /// Path from a tag up to its root, starting with the tag itself
    pub fn ancestors(&self, id: TagId) -> Result<Vec<Tag>> {
        self.collect(
            r#"
            WITH RECURSIVE lineage(id, depth) AS (
                SELECT id, 0 FROM tag WHERE id = ?1
                UNION ALL
                SELECT t.parent_id, l.depth + 1 FROM tag t
                JOIN lineage l ON t.id = l.id
                WHERE t.parent_id IS NOT NULL
            )
            SELECT t.id, t.name, t.parent_id
            FROM tag t
            JOIN lineage l ON t.id = l.id
            ORDER BY l.depth
            "#,
            [id],
        )
    }

    /// Dotted name of a tag, rebuilt from its ancestors
    pub fn full_name(&self, id: TagId) -> Result<String> {
        let lineage = self.ancestors(id)?;
        if lineage.is_empty() {
            return Err(Error::MissingReference(format!("tag {}", id)));
        }
        let names: Vec<&str> = lineage.iter().rev().map(|t| t.name.as_str()).collect();
        Ok(names.join(self.separator))
    }

    /// Number of tags
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tag", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn collect<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(sql)?;
        let tags = stmt
            .query_map(params, row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }
}

fn validate_components<S: AsRef<str>>(components: &[S], separator: &str) -> Result<()> {
    let joined = || {
        components
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(separator)
    };

    if components.is_empty() {
        return Err(Error::MalformedTagPath {
            path: String::new(),
            position: 0,
        });
    }
    if let Some(position) = components.iter().position(|c| c.as_ref().is_empty()) {
        return Err(Error::MalformedTagPath {
            path: joined(),
            position,
        });
    }
    Ok(())
}

/// Convert a database row to a Tag
fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        parent: row.get(2)?,
    })
}
