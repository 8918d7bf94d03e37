//! Row-source contract with the query engine.
//!
//! The engine executes a load query and hands back a forward-only
//! [`RowSource`]. Rows are positional: value `i` belongs to column `i`.

pub mod memory;

use crate::error::{FetchError, TimestampError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used by the grant tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Declared storage kind of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Character data.
    String,
    /// Single-valued enumeration, e.g. `enum('N','Y')`.
    Enum,
    /// Multi-valued set, e.g. `set('Select','Insert',...)`.
    Set,
    /// Date and time.
    Timestamp,
    /// Integer.
    Integer,
    /// Anything else (blobs, decimals, ...).
    Other,
}

/// Name and storage kind of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as returned by the engine.
    pub name: String,
    /// Declared storage kind.
    pub kind: StorageKind,
}

impl ColumnDescriptor {
    /// Create a column descriptor.
    pub fn new(name: impl Into<String>, kind: StorageKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// A character column.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, StorageKind::String)
    }

    /// A `Y`/`N` enumeration column.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, StorageKind::Enum)
    }

    /// A set-valued column.
    pub fn set(name: impl Into<String>) -> Self {
        Self::new(name, StorageKind::Set)
    }

    /// A timestamp column.
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, StorageKind::Timestamp)
    }
}

/// Discriminator of a [`Datum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumKind {
    /// [`Datum::Null`].
    Null,
    /// [`Datum::String`].
    String,
    /// [`Datum::Enum`].
    Enum,
    /// [`Datum::Set`].
    Set,
    /// [`Datum::Timestamp`].
    Timestamp,
    /// [`Datum::Integer`].
    Integer,
}

/// A single value in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    /// SQL NULL.
    Null,
    /// Character data.
    String(String),
    /// Enumeration value.
    Enum(String),
    /// Set value in engine encoding: comma-separated member names.
    Set(String),
    /// Timestamp text as produced by the engine.
    Timestamp(String),
    /// Integer value.
    Integer(i64),
}

impl Datum {
    /// Character datum.
    pub fn string(value: impl Into<String>) -> Self {
        Datum::String(value.into())
    }

    /// `Y`/`N` enumeration datum.
    pub fn flag(granted: bool) -> Self {
        Datum::Enum(if granted { "Y" } else { "N" }.to_string())
    }

    /// Set datum from its members.
    pub fn set(members: &[&str]) -> Self {
        Datum::Set(members.join(","))
    }

    /// Timestamp datum from engine text.
    pub fn timestamp(value: impl Into<String>) -> Self {
        Datum::Timestamp(value.into())
    }

    /// Build a datum from text according to the column's storage kind.
    ///
    /// `None` is NULL. Integer text that does not parse is kept as a string.
    pub fn from_text(kind: StorageKind, text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Datum::Null;
        };
        match kind {
            StorageKind::Enum => Datum::Enum(text.to_string()),
            StorageKind::Set => Datum::Set(text.to_string()),
            StorageKind::Timestamp => Datum::Timestamp(text.to_string()),
            StorageKind::Integer => text
                .parse()
                .map(Datum::Integer)
                .unwrap_or_else(|_| Datum::String(text.to_string())),
            StorageKind::String | StorageKind::Other => Datum::String(text.to_string()),
        }
    }

    /// The datum's kind.
    pub fn kind(&self) -> DatumKind {
        match self {
            Datum::Null => DatumKind::Null,
            Datum::String(_) => DatumKind::String,
            Datum::Enum(_) => DatumKind::Enum,
            Datum::Set(_) => DatumKind::Set,
            Datum::Timestamp(_) => DatumKind::Timestamp,
            Datum::Integer(_) => DatumKind::Integer,
        }
    }

    /// Whether the datum is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Textual content of any non-NULL, non-integer datum.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) | Datum::Enum(s) | Datum::Set(s) | Datum::Timestamp(s) => Some(s),
            Datum::Null | Datum::Integer(_) => None,
        }
    }

    /// Enumeration value. Plain strings are accepted for engines that do
    /// not distinguish enums at the value level.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Datum::Enum(s) | Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a set value; empty for NULL or the empty set.
    ///
    /// Any textual datum is read in the set encoding, so engines that report
    /// sets as plain strings decode the same way.
    pub fn set_members(&self) -> impl Iterator<Item = &str> {
        self.as_str()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|member| !member.is_empty())
    }

    /// Parse a timestamp value.
    ///
    /// NULL and the engine's zero date (`0000-00-00 ...`) yield `Ok(None)`.
    pub fn as_timestamp(&self) -> Result<Option<NaiveDateTime>, TimestampError> {
        match self {
            Datum::Null => Ok(None),
            Datum::Timestamp(text) | Datum::String(text) => parse_timestamp(text),
            other => Err(TimestampError(other.to_string())),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Integer(value) => write!(f, "{}", value),
            Datum::String(s) | Datum::Enum(s) | Datum::Set(s) | Datum::Timestamp(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

fn parse_timestamp(text: &str) -> Result<Option<NaiveDateTime>, TimestampError> {
    let text = text.trim();
    if text.starts_with("0000-00-00") {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|_| TimestampError(text.to_string()))
}

/// One result row, positionally aligned with the source's columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Vec<Datum>,
}

impl Row {
    /// Create a row from its values.
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    /// Value at position `index`.
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }

    /// All values in column order.
    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Datum>> for Row {
    fn from(values: Vec<Datum>) -> Self {
        Self::new(values)
    }
}

/// A forward-only cursor over the rows of one executed query.
pub trait RowSource {
    /// Descriptors of the result columns.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Fetch the next row; `Ok(None)` at end of results.
    fn next_row(&mut self) -> Result<Option<Row>, FetchError>;

    /// Release the underlying resources. Called exactly once by the loader.
    fn close(&mut self) {}
}

/// Executes load queries on behalf of the cache.
pub trait QueryExecutor: Send + Sync {
    /// Execute `query` and return a cursor over its rows.
    fn execute(&self, query: &str) -> Result<Box<dyn RowSource + '_>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_by_kind() {
        assert_eq!(Datum::from_text(StorageKind::Enum, Some("Y")), Datum::flag(true));
        assert_eq!(Datum::from_text(StorageKind::String, None), Datum::Null);
        assert_eq!(
            Datum::from_text(StorageKind::Integer, Some("42")),
            Datum::Integer(42)
        );
        assert_eq!(
            Datum::from_text(StorageKind::Integer, Some("n/a")),
            Datum::string("n/a")
        );
    }

    #[test]
    fn test_set_members() {
        let datum = Datum::Set("Select, Insert,,Create View".to_string());
        let members: Vec<&str> = datum.set_members().collect();
        assert_eq!(members, vec!["Select", "Insert", "Create View"]);

        assert_eq!(Datum::set(&[]).set_members().count(), 0);
        assert_eq!(Datum::Null.set_members().count(), 0);
    }

    #[test]
    fn test_timestamp_parsing() {
        let ts = Datum::timestamp("2016-03-01 12:30:45").as_timestamp().unwrap().unwrap();
        assert_eq!(ts.to_string(), "2016-03-01 12:30:45");

        let frac = Datum::timestamp("2016-03-01 12:30:45.250000").as_timestamp().unwrap();
        assert!(frac.is_some());

        assert_eq!(Datum::Null.as_timestamp().unwrap(), None);
        assert_eq!(
            Datum::timestamp("0000-00-00 00:00:00").as_timestamp().unwrap(),
            None
        );
        assert_eq!(
            Datum::timestamp("yesterday").as_timestamp(),
            Err(TimestampError("yesterday".to_string()))
        );
        assert!(Datum::Integer(7).as_timestamp().is_err());
    }

    #[test]
    fn test_enum_accessors() {
        assert_eq!(Datum::flag(false).as_enum(), Some("N"));
        assert_eq!(Datum::string("Y").as_enum(), Some("Y"));
        assert_eq!(Datum::Integer(1).as_enum(), None);
        assert_eq!(Datum::Integer(1).kind(), DatumKind::Integer);
        assert!(Datum::Null.is_null());
    }
}
