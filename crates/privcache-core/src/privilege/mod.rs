//! Privilege bits, per-level masks, and grant levels.

mod bitmap;

pub use bitmap::PrivilegeBitMap;

use serde::{Deserialize, Serialize};
use std::fmt;

bitflags::bitflags! {
    /// A set of privileges, one bit per grantable privilege.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PrivilegeBits: u32 {
        const SELECT = 1 << 0;
        const INSERT = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETE = 1 << 3;
        const CREATE = 1 << 4;
        const DROP = 1 << 5;
        const RELOAD = 1 << 6;
        const SHUTDOWN = 1 << 7;
        const PROCESS = 1 << 8;
        const FILE = 1 << 9;
        const GRANT = 1 << 10;
        const REFERENCES = 1 << 11;
        const INDEX = 1 << 12;
        const ALTER = 1 << 13;
        const SHOW_DB = 1 << 14;
        const SUPER = 1 << 15;
        const CREATE_TMP_TABLE = 1 << 16;
        const LOCK_TABLES = 1 << 17;
        const EXECUTE = 1 << 18;
        const REPL_SLAVE = 1 << 19;
        const REPL_CLIENT = 1 << 20;
        const CREATE_VIEW = 1 << 21;
        const SHOW_VIEW = 1 << 22;
        const CREATE_ROUTINE = 1 << 23;
        const ALTER_ROUTINE = 1 << 24;
        const CREATE_USER = 1 << 25;
        const EVENT = 1 << 26;
        const TRIGGER = 1 << 27;
        const CREATE_TABLESPACE = 1 << 28;
    }
}

impl PrivilegeBits {
    /// Privileges expressible in `mysql.user`.
    pub const GLOBAL_MASK: Self = Self::all();

    /// Privileges expressible in `mysql.db`.
    pub const DB_MASK: Self = Self::from_bits_retain(
        Self::SELECT.bits()
            | Self::INSERT.bits()
            | Self::UPDATE.bits()
            | Self::DELETE.bits()
            | Self::CREATE.bits()
            | Self::DROP.bits()
            | Self::GRANT.bits()
            | Self::REFERENCES.bits()
            | Self::INDEX.bits()
            | Self::ALTER.bits()
            | Self::CREATE_TMP_TABLE.bits()
            | Self::LOCK_TABLES.bits()
            | Self::CREATE_VIEW.bits()
            | Self::SHOW_VIEW.bits()
            | Self::CREATE_ROUTINE.bits()
            | Self::ALTER_ROUTINE.bits()
            | Self::EXECUTE.bits()
            | Self::EVENT.bits()
            | Self::TRIGGER.bits(),
    );

    /// Privileges expressible in `mysql.tables_priv.Table_priv`.
    pub const TABLE_MASK: Self = Self::from_bits_retain(
        Self::SELECT.bits()
            | Self::INSERT.bits()
            | Self::UPDATE.bits()
            | Self::DELETE.bits()
            | Self::CREATE.bits()
            | Self::DROP.bits()
            | Self::GRANT.bits()
            | Self::REFERENCES.bits()
            | Self::INDEX.bits()
            | Self::ALTER.bits()
            | Self::CREATE_VIEW.bits()
            | Self::SHOW_VIEW.bits()
            | Self::TRIGGER.bits(),
    );

    /// Privileges expressible at column level.
    pub const COLUMN_MASK: Self = Self::from_bits_retain(
        Self::SELECT.bits() | Self::INSERT.bits() | Self::UPDATE.bits() | Self::REFERENCES.bits(),
    );
}

impl fmt::Display for PrivilegeBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Granularity of a grant, one per grant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantLevel {
    /// Global privileges from `mysql.user`.
    User,
    /// Database privileges from `mysql.db`.
    Db,
    /// Table privileges from `mysql.tables_priv`.
    TablesPriv,
    /// Column privileges from `mysql.columns_priv`.
    ColumnsPriv,
}

impl GrantLevel {
    /// Order in which a reload visits the grant tables.
    pub const LOAD_ORDER: [GrantLevel; 4] = [
        GrantLevel::User,
        GrantLevel::Db,
        GrantLevel::TablesPriv,
        GrantLevel::ColumnsPriv,
    ];

    /// The load query for this level.
    ///
    /// The ORDER BY clause is part of the contract: matching relies on
    /// records arriving sorted by host, then the level's remaining keys.
    pub fn query(self) -> &'static str {
        match self {
            GrantLevel::User => "select * from mysql.user order by host, user;",
            GrantLevel::Db => "select * from mysql.db order by host, db, user;",
            GrantLevel::TablesPriv => {
                "select * from mysql.tables_priv order by host, db, user, table_name;"
            }
            GrantLevel::ColumnsPriv => {
                "select * from mysql.columns_priv order by host, db, user, table_name, column_name;"
            }
        }
    }

    /// Resolve the level whose load query is exactly `query`.
    pub fn from_query(query: &str) -> Option<Self> {
        Self::LOAD_ORDER
            .into_iter()
            .find(|level| level.query() == query)
    }

    /// Columns named in this level's ORDER BY clause.
    pub fn order_columns(self) -> &'static [&'static str] {
        match self {
            GrantLevel::User => &["host", "user"],
            GrantLevel::Db => &["host", "db", "user"],
            GrantLevel::TablesPriv => &["host", "db", "user", "table_name"],
            GrantLevel::ColumnsPriv => &["host", "db", "user", "table_name", "column_name"],
        }
    }

    /// The privileges a record at this level may carry.
    pub fn mask(self) -> PrivilegeBits {
        match self {
            GrantLevel::User => PrivilegeBits::GLOBAL_MASK,
            GrantLevel::Db => PrivilegeBits::DB_MASK,
            GrantLevel::TablesPriv => PrivilegeBits::TABLE_MASK,
            GrantLevel::ColumnsPriv => PrivilegeBits::COLUMN_MASK,
        }
    }

    /// Fully qualified name of the backing grant table.
    pub fn table_name(self) -> &'static str {
        match self {
            GrantLevel::User => "mysql.user",
            GrantLevel::Db => "mysql.db",
            GrantLevel::TablesPriv => "mysql.tables_priv",
            GrantLevel::ColumnsPriv => "mysql.columns_priv",
        }
    }
}

impl fmt::Display for GrantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantLevel::User => write!(f, "user"),
            GrantLevel::Db => write!(f, "db"),
            GrantLevel::TablesPriv => write!(f, "tables_priv"),
            GrantLevel::ColumnsPriv => write!(f, "columns_priv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_nest() {
        assert!(PrivilegeBits::GLOBAL_MASK.contains(PrivilegeBits::DB_MASK));
        assert!(PrivilegeBits::DB_MASK.contains(PrivilegeBits::TABLE_MASK));
        assert!(PrivilegeBits::TABLE_MASK.contains(PrivilegeBits::COLUMN_MASK));
        assert_eq!(PrivilegeBits::GLOBAL_MASK.bits().count_ones(), 29);
        assert_eq!(PrivilegeBits::COLUMN_MASK.bits().count_ones(), 4);
    }

    #[test]
    fn test_level_specific_privileges() {
        assert!(!PrivilegeBits::DB_MASK.contains(PrivilegeBits::SUPER));
        assert!(!PrivilegeBits::TABLE_MASK.contains(PrivilegeBits::EXECUTE));
        assert!(!PrivilegeBits::COLUMN_MASK.contains(PrivilegeBits::DELETE));
    }

    #[test]
    fn test_display() {
        assert_eq!(PrivilegeBits::empty().to_string(), "NONE");
        assert_eq!(PrivilegeBits::SELECT.to_string(), "SELECT");
        assert_eq!(
            (PrivilegeBits::SELECT | PrivilegeBits::CREATE_VIEW).to_string(),
            "SELECT|CREATE_VIEW"
        );
    }

    #[test]
    fn test_queries_round_trip() {
        for level in GrantLevel::LOAD_ORDER {
            assert_eq!(GrantLevel::from_query(level.query()), Some(level));
        }
        assert_eq!(GrantLevel::from_query("select * from mysql.user"), None);
    }

    #[test]
    fn test_queries_order_by_level_keys() {
        for level in GrantLevel::LOAD_ORDER {
            let clause = level.order_columns().join(", ");
            assert!(level.query().ends_with(&format!("order by {};", clause)));
            assert!(level.query().contains(level.table_name()));
        }
    }

    #[test]
    fn test_level_display() {
        assert_eq!(GrantLevel::TablesPriv.to_string(), "tables_priv");
        assert_eq!(GrantLevel::User.mask(), PrivilegeBits::GLOBAL_MASK);
    }
}
