//! Static name to privilege-bit mapping for grant-table columns.

use super::PrivilegeBits;
use crate::error::{PrivilegeError, PrivilegeResult};

/// One `Y`/`N` column per privilege in `mysql.user` and `mysql.db`.
const FLAG_COLUMNS: &[(&str, PrivilegeBits)] = &[
    ("Select_priv", PrivilegeBits::SELECT),
    ("Insert_priv", PrivilegeBits::INSERT),
    ("Update_priv", PrivilegeBits::UPDATE),
    ("Delete_priv", PrivilegeBits::DELETE),
    ("Create_priv", PrivilegeBits::CREATE),
    ("Drop_priv", PrivilegeBits::DROP),
    ("Reload_priv", PrivilegeBits::RELOAD),
    ("Shutdown_priv", PrivilegeBits::SHUTDOWN),
    ("Process_priv", PrivilegeBits::PROCESS),
    ("File_priv", PrivilegeBits::FILE),
    ("Grant_priv", PrivilegeBits::GRANT),
    ("References_priv", PrivilegeBits::REFERENCES),
    ("Index_priv", PrivilegeBits::INDEX),
    ("Alter_priv", PrivilegeBits::ALTER),
    ("Show_db_priv", PrivilegeBits::SHOW_DB),
    ("Super_priv", PrivilegeBits::SUPER),
    ("Create_tmp_table_priv", PrivilegeBits::CREATE_TMP_TABLE),
    ("Lock_tables_priv", PrivilegeBits::LOCK_TABLES),
    ("Execute_priv", PrivilegeBits::EXECUTE),
    ("Repl_slave_priv", PrivilegeBits::REPL_SLAVE),
    ("Repl_client_priv", PrivilegeBits::REPL_CLIENT),
    ("Create_view_priv", PrivilegeBits::CREATE_VIEW),
    ("Show_view_priv", PrivilegeBits::SHOW_VIEW),
    ("Create_routine_priv", PrivilegeBits::CREATE_ROUTINE),
    ("Alter_routine_priv", PrivilegeBits::ALTER_ROUTINE),
    ("Create_user_priv", PrivilegeBits::CREATE_USER),
    ("Event_priv", PrivilegeBits::EVENT),
    ("Trigger_priv", PrivilegeBits::TRIGGER),
    ("Create_tablespace_priv", PrivilegeBits::CREATE_TABLESPACE),
];

/// Members of the `Table_priv` and `Column_priv` set columns.
const SET_MEMBERS: &[(&str, PrivilegeBits)] = &[
    ("Select", PrivilegeBits::SELECT),
    ("Insert", PrivilegeBits::INSERT),
    ("Update", PrivilegeBits::UPDATE),
    ("Delete", PrivilegeBits::DELETE),
    ("Create", PrivilegeBits::CREATE),
    ("Drop", PrivilegeBits::DROP),
    ("Grant", PrivilegeBits::GRANT),
    ("References", PrivilegeBits::REFERENCES),
    ("Index", PrivilegeBits::INDEX),
    ("Alter", PrivilegeBits::ALTER),
    ("Create View", PrivilegeBits::CREATE_VIEW),
    ("Show view", PrivilegeBits::SHOW_VIEW),
    ("Trigger", PrivilegeBits::TRIGGER),
];

/// Total mapping from grant-table column names and set members to privileges.
///
/// Lookups are case-insensitive. A name missing from the map is never
/// guessed: callers treat it as a hard decode failure.
pub struct PrivilegeBitMap;

impl PrivilegeBitMap {
    /// Resolve a flag column such as `Select_priv`.
    pub fn flag_column(name: &str) -> Option<PrivilegeBits> {
        lookup(FLAG_COLUMNS, name)
    }

    /// Resolve one member of a set-valued privilege column such as `Create View`.
    pub fn set_member(name: &str) -> Option<PrivilegeBits> {
        lookup(SET_MEMBERS, name)
    }

    /// All known flag columns in canonical spelling.
    pub fn flag_columns() -> impl Iterator<Item = (&'static str, PrivilegeBits)> {
        FLAG_COLUMNS.iter().copied()
    }

    /// All known set members in canonical spelling.
    pub fn set_members() -> impl Iterator<Item = (&'static str, PrivilegeBits)> {
        SET_MEMBERS.iter().copied()
    }

    /// Check the tables against the grant-table schema.
    ///
    /// Every entry must name exactly one privilege, names must be unique,
    /// flag columns must cover the global mask, and set members must cover
    /// the table mask without reaching outside it.
    pub fn verify() -> PrivilegeResult<()> {
        check_entries("flag column", FLAG_COLUMNS)?;
        check_entries("set member", SET_MEMBERS)?;

        let flags = union(FLAG_COLUMNS);
        if flags != PrivilegeBits::GLOBAL_MASK {
            return Err(PrivilegeError::IncompleteBitMap(format!(
                "no flag column for {}",
                PrivilegeBits::GLOBAL_MASK.difference(flags)
            )));
        }

        let members = union(SET_MEMBERS);
        if members != PrivilegeBits::TABLE_MASK {
            return Err(PrivilegeError::IncompleteBitMap(format!(
                "set members cover {} but the table mask is {}",
                members,
                PrivilegeBits::TABLE_MASK
            )));
        }

        Ok(())
    }
}

fn lookup(table: &[(&str, PrivilegeBits)], name: &str) -> Option<PrivilegeBits> {
    table
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, bits)| *bits)
}

fn union(table: &[(&str, PrivilegeBits)]) -> PrivilegeBits {
    table
        .iter()
        .fold(PrivilegeBits::empty(), |acc, (_, bits)| acc | *bits)
}

fn check_entries(kind: &str, table: &[(&str, PrivilegeBits)]) -> PrivilegeResult<()> {
    for (i, (name, bits)) in table.iter().enumerate() {
        if bits.bits().count_ones() != 1 {
            return Err(PrivilegeError::IncompleteBitMap(format!(
                "{} {} maps to {} privileges",
                kind,
                name,
                bits.bits().count_ones()
            )));
        }
        let duplicate = table[..i].iter().find(|(earlier, other)| {
            earlier.eq_ignore_ascii_case(name) || other == bits
        });
        if let Some((earlier, _)) = duplicate {
            return Err(PrivilegeError::IncompleteBitMap(format!(
                "{} {} collides with {}",
                kind, name, earlier
            )));
        }
    }
    Ok(())
}
