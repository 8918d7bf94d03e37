//! One immutable generation of the privilege cache.

use crate::record::{ColumnPrivRecord, DbRecord, TablePrivRecord, UserRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of records per grant level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecordCounts {
    /// Records from `mysql.user`.
    pub users: usize,
    /// Records from `mysql.db`.
    pub dbs: usize,
    /// Records from `mysql.tables_priv`.
    pub tables_privs: usize,
    /// Records from `mysql.columns_priv`.
    pub columns_privs: usize,
}

impl RecordCounts {
    /// Records across all levels.
    pub fn total(&self) -> usize {
        self.users + self.dbs + self.tables_privs + self.columns_privs
    }
}

/// The four grant-level record sequences from one successful reload.
///
/// Each sequence keeps the order of its load query (host, user, then the
/// level's remaining keys, ascending). A snapshot is never modified after it
/// is built; a reload always produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    generation: u64,
    loaded_at: DateTime<Utc>,
    users: Vec<UserRecord>,
    dbs: Vec<DbRecord>,
    tables_privs: Vec<TablePrivRecord>,
    columns_privs: Vec<ColumnPrivRecord>,
}

impl Snapshot {
    /// Assemble a snapshot from fully loaded record sequences.
    pub fn new(
        generation: u64,
        users: Vec<UserRecord>,
        dbs: Vec<DbRecord>,
        tables_privs: Vec<TablePrivRecord>,
        columns_privs: Vec<ColumnPrivRecord>,
    ) -> Self {
        Self {
            generation,
            loaded_at: Utc::now(),
            users,
            dbs,
            tables_privs,
            columns_privs,
        }
    }

    /// Publish sequence number, starting at 1 for the first published snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the snapshot was assembled.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// `mysql.user` records ordered by host, user.
    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// `mysql.db` records ordered by host, db, user.
    pub fn dbs(&self) -> &[DbRecord] {
        &self.dbs
    }

    /// `mysql.tables_priv` records ordered by host, db, user, table.
    pub fn tables_privs(&self) -> &[TablePrivRecord] {
        &self.tables_privs
    }

    /// `mysql.columns_priv` records ordered by host, db, user, table, column.
    pub fn columns_privs(&self) -> &[ColumnPrivRecord] {
        &self.columns_privs
    }

    /// Record counts per level.
    pub fn record_counts(&self) -> RecordCounts {
        RecordCounts {
            users: self.users.len(),
            dbs: self.dbs.len(),
            tables_privs: self.tables_privs.len(),
            columns_privs: self.columns_privs.len(),
        }
    }

    /// Whether no level holds any record.
    pub fn is_empty(&self) -> bool {
        self.record_counts().total() == 0
    }
}
