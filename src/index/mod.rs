//! Abstract content-index interface
//!
//! The gallery core is a read/transform layer over an external row store.
//! This module defines the consumed surface: scalar values, rows, query
//! specifications and the [`ContentIndex`] trait, plus the change
//! notification channel live streams subscribe to.

pub mod fs;
pub mod time;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;

/// A scalar cell value in a content-index row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }

    /// Ordering used when an index sorts rows by column in process.
    /// Values of different types compare equal so sorts stay stable.
    pub(crate) fn compare(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

/// One row returned by a content-index query: column name to scalar value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Drop every column not named in `projection`
    pub fn project(mut self, projection: &[&str]) -> Self {
        self.values.retain(|k, _| projection.contains(&k.as_str()));
        self
    }

    fn require(&self, column: &str) -> Result<&Value> {
        self.get(column).ok_or_else(|| Error::MissingColumn {
            column: column.to_string(),
        })
    }

    /// Integer cell; missing column or wrong type is a contract violation
    pub fn require_i64(&self, column: &str) -> Result<i64> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(Error::ColumnType {
                column: column.to_string(),
                expected: "integer",
                found: other.type_name(),
            }),
        }
    }

    /// Text cell; missing column or wrong type is a contract violation
    pub fn require_str(&self, column: &str) -> Result<&str> {
        match self.require(column)? {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(Error::ColumnType {
                column: column.to_string(),
                expected: "text",
                found: other.type_name(),
            }),
        }
    }

    /// Optional text cell: absent columns and NULL both read as `None`
    pub fn opt_str(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(Value::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Optional real cell: absent columns and NULL both read as `None`
    pub fn opt_f64(&self, column: &str) -> Option<f64> {
        match self.get(column) {
            Some(Value::Real(v)) => Some(*v),
            Some(Value::Integer(v)) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Identifier of an observable collection inside a content index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri(String);

impl Uri {
    /// The shared media collection every gallery view observes
    pub fn media() -> Self {
        Uri("content://media/external".to_string())
    }

    pub fn new(uri: impl Into<String>) -> Self {
        Uri(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort request for a query, mirroring a `column ASC|DESC` order clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn descending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            descending: true,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            descending: false,
        }
    }
}

/// Extra query behavior flags
///
/// The index hides trashed rows by default, the way the platform media
/// store does; album aggregation asks for them explicitly so the Trash
/// bucket can be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub include_trashed: bool,
}

/// A full query against a content index
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub uri: Uri,
    /// Columns to return; `None` means every column the index has
    pub projection: Option<Vec<&'static str>>,
    /// Structured filter; `None` selects everything
    pub selection: Option<crate::predicate::Predicate>,
    pub sort: Option<SortKey>,
    pub flags: QueryFlags,
}

impl QuerySpec {
    /// Query the media collection, newest first, all columns
    pub fn media_newest_first() -> Self {
        QuerySpec {
            uri: Uri::media(),
            projection: None,
            selection: None,
            sort: Some(SortKey::descending(crate::classify::columns::DATE_ADDED)),
            flags: QueryFlags::default(),
        }
    }

    pub fn with_selection(mut self, predicate: crate::predicate::Predicate) -> Self {
        self.selection = Some(predicate);
        self
    }

    pub fn with_trashed(mut self) -> Self {
        self.flags.include_trashed = true;
        self
    }
}

/// Notification that rows under a URI changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uri: Uri,
}

/// The consumed surface of the platform's shared media index
///
/// `query` must run without blocking the caller's thread beyond the await;
/// `changes` hands out a broadcast receiver that fires after any mutation
/// of rows under `uri`. Dropping the receiver is unsubscription.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn query(&self, spec: &QuerySpec) -> Result<Vec<Row>>;

    fn changes(&self, uri: &Uri) -> broadcast::Receiver<ChangeEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_require_missing_column() {
        let row = Row::new().set("_id", 1i64);
        let err = row.require_i64("media_type").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column } if column == "media_type"));
    }

    #[test]
    fn test_row_require_type_mismatch() {
        let row = Row::new().set("_id", "oops");
        let err = row.require_i64("_id").unwrap_err();
        assert!(matches!(err, Error::ColumnType { .. }));
    }

    #[test]
    fn test_row_projection() {
        let row = Row::new()
            .set("_id", 1i64)
            .set("mime_type", "image/jpeg")
            .project(&["_id"]);
        assert!(row.get("_id").is_some());
        assert!(row.get("mime_type").is_none());
    }

    #[test]
    fn test_opt_f64_accepts_integer_cells() {
        let row = Row::new().set("latitude", Value::Real(48.85)).set("longitude", 2i64);
        assert_eq!(row.opt_f64("latitude"), Some(48.85));
        assert_eq!(row.opt_f64("longitude"), Some(2.0));
        assert_eq!(row.opt_f64("altitude"), None);
    }

    #[test]
    fn test_value_ordering_is_stable_across_types() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Text("a".into())),
            std::cmp::Ordering::Equal
        );
        assert_eq!(
            Value::Integer(1).compare(&Value::Integer(2)),
            std::cmp::Ordering::Less
        );
    }
}
