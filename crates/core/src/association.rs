//! Content/tag associations
//!
//! An association links one content item to one tag, optionally with a value.
//! Two partial unique indexes enforce the dual rule: without a value the
//! (data, tag) pair is unique, with a value the (data, tag, value) triple is.

use crate::content::DataId;
use crate::error::{constraint_kind, Constraint, Error};
use crate::tag::TagId;
use crate::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use tracing::debug;

/// Opaque association identity
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AssociationId(i64);

impl AssociationId {
    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar carried by an association
///
/// Stored with its native type, so `Integer(1)` and `Text("1")` are
/// different values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Interpret a command-line literal
    ///
    /// Integers first, then finite reals, otherwise text. A number is only
    /// taken when it prints back as the same literal, so `007`, `+5` and
    /// `1.10` stay text.
    pub fn parse_literal(literal: &str) -> Self {
        if let Ok(n) = literal.parse::<i64>() {
            if n.to_string() == literal {
                return Value::Integer(n);
            }
        }
        match literal.parse::<f64>() {
            Ok(x) if x.is_finite() && x.to_string() == literal => Value::Real(x),
            _ => Value::Text(literal.to_string()),
        }
    }

    fn check(&self) -> Result<()> {
        match self {
            // SQLite stores NaN as NULL, which would turn a value into a flag
            Value::Real(x) if x.is_nan() => {
                Err(Error::MalformedValue("NaN cannot be stored".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "x'{}'", hex::encode(b)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(n) => ToSqlOutput::Borrowed(ValueRef::Integer(*n)),
            Value::Real(x) => ToSqlOutput::Borrowed(ValueRef::Real(*x)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Err(FromSqlError::InvalidType),
            ValueRef::Integer(n) => Ok(Value::Integer(n)),
            ValueRef::Real(x) => Ok(Value::Real(x)),
            ValueRef::Text(t) => std::str::from_utf8(t)
                .map(|s| Value::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(b) => Ok(Value::Blob(b.to_vec())),
        }
    }
}

/// A stored link between content and a tag
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub id: AssociationId,
    pub data: DataId,
    pub tag: TagId,
    pub value: Option<Value>,
}

/// Association engine bound to one scope
pub struct Associations<'a> {
    conn: &'a Connection,
}

impl<'a> Associations<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Link content to a tag; fails if the link already exists
    pub fn associate(
        &self,
        data: DataId,
        tag: TagId,
        value: Option<&Value>,
    ) -> Result<AssociationId> {
        if let Some(v) = value {
            v.check()?;
        }

        match self.conn.execute(
            "INSERT INTO data_tag (data_id, tag_id, value) VALUES (?1, ?2, ?3)",
            params![data, tag, value],
        ) {
            Ok(_) => {
                let id = AssociationId(self.conn.last_insert_rowid());
                debug!(id = %id, data = %data, tag = %tag, "Associated");
                Ok(id)
            }
            Err(e) => Err(match constraint_kind(&e) {
                Some(Constraint::Unique) => Error::AssociationExists {
                    data,
                    tag,
                    value: value.cloned(),
                },
                Some(Constraint::ForeignKey) => self.describe_missing(data, tag)?,
                _ => e.into(),
            }),
        }
    }

    /// Link content to a tag unless the exact link already exists
    pub fn ensure(&self, data: DataId, tag: TagId, value: Option<&Value>) -> Result<AssociationId> {
        if let Some(id) = self.find(data, tag, value)? {
            debug!(id = %id, data = %data, tag = %tag, "Association already present");
            return Ok(id);
        }
        self.associate(data, tag, value)
    }

    /// Exact link lookup under the same rule the indexes enforce
    pub fn find(
        &self,
        data: DataId,
        tag: TagId,
        value: Option<&Value>,
    ) -> Result<Option<AssociationId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM data_tag WHERE data_id = ?1 AND tag_id = ?2 AND value IS ?3",
                params![data, tag, value],
                |row| row.get(0).map(AssociationId),
            )
            .optional()?;
        Ok(id)
    }

    /// Every association of one content item
    pub fn for_data(&self, data: DataId) -> Result<Vec<Association>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data_id, tag_id, value FROM data_tag WHERE data_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([data], row_to_association)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Content carrying a tag, or any tag below it when `include_descendants`
    pub fn data_with_tag(&self, tag: TagId, include_descendants: bool) -> Result<Vec<DataId>> {
        let sql = if include_descendants {
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM tag WHERE id = ?1
                UNION
                SELECT t.id FROM tag t
                JOIN subtree s ON t.parent_id = s.id
            )
            SELECT DISTINCT dt.data_id
            FROM data_tag dt
            JOIN subtree s ON dt.tag_id = s.id
            ORDER BY dt.data_id
            "#
        } else {
            "SELECT DISTINCT data_id FROM data_tag WHERE tag_id = ?1 ORDER BY data_id"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map([tag], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<DataId>>>()?;
        Ok(ids)
    }

    /// Number of associations
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM data_tag", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn describe_missing(&self, data: DataId, tag: TagId) -> Result<Error> {
        let exists = |sql: &str, id: i64| -> Result<bool> {
            let found: Option<i64> = self
                .conn
                .query_row(sql, [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        };

        let what = if !exists("SELECT 1 FROM data WHERE id = ?1", data.raw())? {
            format!("content {}", data)
        } else if !exists("SELECT 1 FROM tag WHERE id = ?1", tag.raw())? {
            format!("tag {}", tag)
        } else {
            format!("content {} or tag {}", data, tag)
        };
        Ok(Error::MissingReference(what))
    }
}

fn row_to_association(row: &rusqlite::Row) -> rusqlite::Result<Association> {
    Ok(Association {
        id: AssociationId(row.get(0)?),
        data: row.get(1)?,
        tag: row.get(2)?,
        value: row.get(3)?,
    })
}
