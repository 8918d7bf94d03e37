//! Typed grant records, one type per grant level.

use crate::privilege::PrivilegeBits;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp used when a grant row has no usable timestamp (the Unix epoch).
pub fn zero_timestamp() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// A row of `mysql.user`: global privileges for an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UserRecord {
    /// Host pattern the grant applies to.
    pub host: String,
    /// Account name; empty for the anonymous user.
    pub user: String,
    /// Stored credential hash. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Global privileges, always within [`PrivilegeBits::GLOBAL_MASK`].
    pub privileges: PrivilegeBits,
}

/// A row of `mysql.db`: privileges on one database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DbRecord {
    /// Host pattern the grant applies to.
    pub host: String,
    /// Database name or pattern.
    pub db: String,
    /// Account name; empty for the anonymous user.
    pub user: String,
    /// Database privileges, always within [`PrivilegeBits::DB_MASK`].
    pub privileges: PrivilegeBits,
}

/// A row of `mysql.tables_priv`: privileges on one table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TablePrivRecord {
    /// Host pattern the grant applies to.
    pub host: String,
    /// Database name or pattern.
    pub db: String,
    /// Account name; empty for the anonymous user.
    pub user: String,
    /// Table name.
    pub table: String,
    /// Account that issued the grant.
    pub grantor: String,
    /// When the grant was issued; the zero timestamp if unknown.
    pub granted_at: NaiveDateTime,
    /// Table privileges, always within [`PrivilegeBits::TABLE_MASK`].
    pub table_privileges: PrivilegeBits,
    /// Column privileges granted on some column of this table.
    /// Always within [`PrivilegeBits::COLUMN_MASK`].
    pub column_privileges: PrivilegeBits,
}

/// A row of `mysql.columns_priv`: privileges on one column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ColumnPrivRecord {
    /// Host pattern the grant applies to.
    pub host: String,
    /// Database name or pattern.
    pub db: String,
    /// Account name; empty for the anonymous user.
    pub user: String,
    /// Table name.
    pub table: String,
    /// Column name.
    pub column: String,
    /// When the grant was issued; the zero timestamp if unknown.
    pub granted_at: NaiveDateTime,
    /// Always within [`PrivilegeBits::COLUMN_MASK`].
    pub privileges: PrivilegeBits,
}
