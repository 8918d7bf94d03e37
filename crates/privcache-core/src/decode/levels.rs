//! Decoders for the four grant tables.

use super::{accumulate, accumulate_set, cells, identity, DecodeContext, RowDecoder};
use crate::error::LoadError;
use crate::privilege::GrantLevel;
use crate::record::{ColumnPrivRecord, DbRecord, TablePrivRecord, UserRecord};
use crate::source::{ColumnDescriptor, Row};

/// Decodes `mysql.user` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDecoder;

impl RowDecoder for UserDecoder {
    type Record = UserRecord;
    const LEVEL: GrantLevel = GrantLevel::User;

    fn decode(
        &self,
        row: &Row,
        columns: &[ColumnDescriptor],
        _ctx: &mut DecodeContext,
    ) -> Result<UserRecord, LoadError> {
        let mut record = UserRecord::default();
        for (column, datum) in cells(row, columns)? {
            match column.name.to_ascii_lowercase().as_str() {
                "host" => record.host = identity(datum),
                "user" => record.user = identity(datum),
                "password" | "authentication_string" => {
                    // Keep a non-empty hash if both columns are present.
                    let hash = identity(datum);
                    if !hash.is_empty() {
                        record.password_hash = hash;
                    }
                }
                _ => accumulate(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.privileges,
                )?,
            }
        }
        Ok(record)
    }
}

/// Decodes `mysql.db` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbDecoder;

impl RowDecoder for DbDecoder {
    type Record = DbRecord;
    const LEVEL: GrantLevel = GrantLevel::Db;

    fn decode(
        &self,
        row: &Row,
        columns: &[ColumnDescriptor],
        _ctx: &mut DecodeContext,
    ) -> Result<DbRecord, LoadError> {
        let mut record = DbRecord::default();
        for (column, datum) in cells(row, columns)? {
            match column.name.to_ascii_lowercase().as_str() {
                "host" => record.host = identity(datum),
                "db" => record.db = identity(datum),
                "user" => record.user = identity(datum),
                _ => accumulate(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.privileges,
                )?,
            }
        }
        Ok(record)
    }
}

/// Decodes `mysql.tables_priv` rows.
///
/// `Table_priv` fills the table privileges; `Column_priv` records which
/// column-level privileges exist somewhere on the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TablesPrivDecoder;

impl RowDecoder for TablesPrivDecoder {
    type Record = TablePrivRecord;
    const LEVEL: GrantLevel = GrantLevel::TablesPriv;

    fn decode(
        &self,
        row: &Row,
        columns: &[ColumnDescriptor],
        ctx: &mut DecodeContext,
    ) -> Result<TablePrivRecord, LoadError> {
        let mut record = TablePrivRecord::default();
        for (column, datum) in cells(row, columns)? {
            match column.name.to_ascii_lowercase().as_str() {
                "host" => record.host = identity(datum),
                "db" => record.db = identity(datum),
                "user" => record.user = identity(datum),
                "table_name" => record.table = identity(datum),
                "grantor" => record.grantor = identity(datum),
                "timestamp" => record.granted_at = ctx.timestamp(column, datum)?,
                "table_priv" => accumulate_set(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.table_privileges,
                )?,
                "column_priv" => accumulate_set(
                    column,
                    datum,
                    Self::LEVEL,
                    GrantLevel::ColumnsPriv.mask(),
                    &mut record.column_privileges,
                )?,
                _ => accumulate(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.table_privileges,
                )?,
            }
        }
        Ok(record)
    }
}

/// Decodes `mysql.columns_priv` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnsPrivDecoder;

impl RowDecoder for ColumnsPrivDecoder {
    type Record = ColumnPrivRecord;
    const LEVEL: GrantLevel = GrantLevel::ColumnsPriv;

    fn decode(
        &self,
        row: &Row,
        columns: &[ColumnDescriptor],
        ctx: &mut DecodeContext,
    ) -> Result<ColumnPrivRecord, LoadError> {
        let mut record = ColumnPrivRecord::default();
        for (column, datum) in cells(row, columns)? {
            match column.name.to_ascii_lowercase().as_str() {
                "host" => record.host = identity(datum),
                "db" => record.db = identity(datum),
                "user" => record.user = identity(datum),
                "table_name" => record.table = identity(datum),
                "column_name" => record.column = identity(datum),
                "timestamp" => record.granted_at = ctx.timestamp(column, datum)?,
                "column_priv" => accumulate_set(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.privileges,
                )?,
                _ => accumulate(
                    column,
                    datum,
                    Self::LEVEL,
                    Self::LEVEL.mask(),
                    &mut record.privileges,
                )?,
            }
        }
        Ok(record)
    }
}
