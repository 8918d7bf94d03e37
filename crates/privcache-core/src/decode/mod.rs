//! Decoding grant-table rows into typed records.
//!
//! Each grant level has a [`RowDecoder`]. For every column of a row the
//! decoder either stores an identity field (host, user, db, ...), folds a
//! privilege column into the record's privilege bits, or ignores the column.
//! Privilege columns come in two shapes:
//!
//! - flag columns (`Select_priv enum('N','Y')`), one privilege per column
//! - set columns (`Table_priv set('Select','Insert',...)`), many per column
//!
//! Names are resolved through [`PrivilegeBitMap`]. An unmapped name aborts the
//! load instead of being skipped, and resolved bits must fit the level mask.

mod levels;

pub use levels::{ColumnsPrivDecoder, DbDecoder, TablesPrivDecoder, UserDecoder};

use crate::config::TimestampPolicy;
use crate::error::LoadError;
use crate::privilege::{GrantLevel, PrivilegeBitMap, PrivilegeBits};
use crate::record::zero_timestamp;
use crate::source::{ColumnDescriptor, Datum, Row, StorageKind};
use chrono::NaiveDateTime;
use std::fmt;

/// Value of an enum flag column that grants its privilege.
const GRANTED: &str = "Y";

/// Converts one raw row into one typed record.
pub trait RowDecoder {
    /// Record type produced for each row.
    type Record;

    /// Grant level this decoder handles.
    const LEVEL: GrantLevel;

    /// Decode `row`, whose values align with `columns`.
    fn decode(
        &self,
        row: &Row,
        columns: &[ColumnDescriptor],
        ctx: &mut DecodeContext,
    ) -> Result<Self::Record, LoadError>;
}

/// A non-fatal problem found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A timestamp failed to parse and was replaced by the zero timestamp.
    MalformedTimestamp {
        /// Level being loaded.
        level: GrantLevel,
        /// Ordinal of the row within the level.
        row: usize,
        /// Timestamp column name.
        column: String,
        /// The text that failed to parse.
        value: String,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::MalformedTimestamp {
                level,
                row,
                column,
                value,
            } => write!(
                f,
                "{} row {}: malformed timestamp `{}` in column {}",
                level, row, value, column
            ),
        }
    }
}

/// Per-load decoding state: current row ordinal, policy, and warnings.
#[derive(Debug)]
pub struct DecodeContext {
    level: GrantLevel,
    row: usize,
    timestamp_policy: TimestampPolicy,
    warnings: Vec<DecodeWarning>,
}

impl DecodeContext {
    /// Create a context for loading `level`.
    pub fn new(level: GrantLevel, timestamp_policy: TimestampPolicy) -> Self {
        Self {
            level,
            row: 0,
            timestamp_policy,
            warnings: Vec::new(),
        }
    }

    /// Set the ordinal of the row about to be decoded.
    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Consume the context, returning its warnings.
    pub fn into_warnings(self) -> Vec<DecodeWarning> {
        self.warnings
    }

    /// Decode a timestamp column, applying the timestamp policy.
    pub fn timestamp(
        &mut self,
        column: &ColumnDescriptor,
        datum: &Datum,
    ) -> Result<NaiveDateTime, LoadError> {
        match datum.as_timestamp() {
            Ok(value) => Ok(value.unwrap_or_else(zero_timestamp)),
            Err(source) => match self.timestamp_policy {
                TimestampPolicy::Reject => Err(LoadError::MalformedTimestamp {
                    column: column.name.clone(),
                    source,
                }),
                TimestampPolicy::Default => {
                    tracing::warn!(
                        level = %self.level,
                        row = self.row,
                        column = %column.name,
                        value = %source.0,
                        "malformed grant timestamp, using zero value"
                    );
                    self.warnings.push(DecodeWarning::MalformedTimestamp {
                        level: self.level,
                        row: self.row,
                        column: column.name.clone(),
                        value: source.0,
                    });
                    Ok(zero_timestamp())
                }
            },
        }
    }
}

/// Text of an identity column; NULL decodes to the empty string.
fn identity(datum: &Datum) -> String {
    match datum {
        Datum::Integer(value) => value.to_string(),
        other => other.as_str().unwrap_or_default().to_string(),
    }
}

/// Pair each column with its value, rejecting rows of the wrong width.
fn cells<'a>(
    row: &'a Row,
    columns: &'a [ColumnDescriptor],
) -> Result<impl Iterator<Item = (&'a ColumnDescriptor, &'a Datum)>, LoadError> {
    if row.len() != columns.len() {
        return Err(LoadError::ColumnMismatch {
            expected: columns.len(),
            found: row.len(),
        });
    }
    Ok(columns.iter().zip(row.values()))
}

/// Fold a privilege column into `target` if it is one.
///
/// Enum columns are flags, set columns are privilege lists, anything else is
/// ignored. The resolved bits must lie within `mask`.
fn accumulate(
    column: &ColumnDescriptor,
    datum: &Datum,
    level: GrantLevel,
    mask: PrivilegeBits,
    target: &mut PrivilegeBits,
) -> Result<(), LoadError> {
    let bits = match column.kind {
        StorageKind::Enum => flag_bits(column, datum)?,
        StorageKind::Set => set_bits(column, datum)?,
        _ => return Ok(()),
    };
    merge(column, bits, level, mask, target)
}

/// Fold a column known by name to hold a privilege set (`Table_priv`,
/// `Column_priv`), whatever storage kind the engine declared for it.
fn accumulate_set(
    column: &ColumnDescriptor,
    datum: &Datum,
    level: GrantLevel,
    mask: PrivilegeBits,
    target: &mut PrivilegeBits,
) -> Result<(), LoadError> {
    let bits = set_bits(column, datum)?;
    merge(column, bits, level, mask, target)
}

fn merge(
    column: &ColumnDescriptor,
    bits: PrivilegeBits,
    level: GrantLevel,
    mask: PrivilegeBits,
    target: &mut PrivilegeBits,
) -> Result<(), LoadError> {
    let outside = bits.difference(mask);
    if !outside.is_empty() {
        return Err(LoadError::PrivilegeOutsideMask {
            column: column.name.clone(),
            privileges: outside,
            level,
        });
    }

    *target |= bits;
    Ok(())
}

fn flag_bits(column: &ColumnDescriptor, datum: &Datum) -> Result<PrivilegeBits, LoadError> {
    // Only a granted flag is looked up: enum columns that are not
    // privileges (ssl_type and friends) never hold `Y`.
    if datum.as_enum() != Some(GRANTED) {
        return Ok(PrivilegeBits::empty());
    }
    PrivilegeBitMap::flag_column(&column.name).ok_or_else(|| LoadError::UnknownPrivilegeColumn {
        column: column.name.clone(),
        name: column.name.clone(),
    })
}

fn set_bits(column: &ColumnDescriptor, datum: &Datum) -> Result<PrivilegeBits, LoadError> {
    if let Datum::Integer(value) = datum {
        return Err(LoadError::NotASet {
            column: column.name.clone(),
            value: value.to_string(),
        });
    }
    datum
        .set_members()
        .try_fold(PrivilegeBits::empty(), |acc, member| {
            PrivilegeBitMap::set_member(member)
                .map(|bits| acc | bits)
                .ok_or_else(|| LoadError::UnknownPrivilegeColumn {
                    column: column.name.clone(),
                    name: member.to_string(),
                })
        })
}
