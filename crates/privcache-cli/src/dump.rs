//! Grant-table dumps read from JSON files.
//!
//! A dump holds the column list and raw text rows of each grant table:
//!
//! ```json
//! {
//!   "user": {
//!     "columns": [{"name": "Host", "kind": "string"}, {"name": "Select_priv", "kind": "enum"}],
//!     "rows": [["%", "Y"]]
//!   }
//! }
//! ```
//!
//! Cells are text or `null`; each cell is typed by its column's storage
//! kind. A table missing from the dump is missing from the executor, so the
//! reload fails at that level the same way a missing table would.

use crate::error::CliError;
use privcache_core::source::memory::{MemoryExecutor, MemoryTable};
use privcache_core::{ColumnDescriptor, Datum, GrantLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of one dumped grant table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpTable {
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}

impl DumpTable {
    fn to_memory_table(&self) -> MemoryTable {
        self.rows.iter().fold(
            MemoryTable::new(self.columns.clone()),
            |table, cells| {
                let values = cells
                    .iter()
                    .enumerate()
                    .map(|(index, cell)| {
                        // Extra cells past the declared columns are kept as text.
                        let kind = self
                            .columns
                            .get(index)
                            .map(|column| column.kind)
                            .unwrap_or(privcache_core::StorageKind::String);
                        Datum::from_text(kind, cell.as_deref())
                    })
                    .collect();
                table.with_row(values)
            },
        )
    }
}

/// A dump of the four grant tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantDump {
    #[serde(default)]
    pub user: Option<DumpTable>,
    #[serde(default)]
    pub db: Option<DumpTable>,
    #[serde(default)]
    pub tables_priv: Option<DumpTable>,
    #[serde(default)]
    pub columns_priv: Option<DumpTable>,
}

impl GrantDump {
    /// Read a dump from a JSON file.
    pub fn read(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn table(&self, level: GrantLevel) -> Option<&DumpTable> {
        match level {
            GrantLevel::User => self.user.as_ref(),
            GrantLevel::Db => self.db.as_ref(),
            GrantLevel::TablesPriv => self.tables_priv.as_ref(),
            GrantLevel::ColumnsPriv => self.columns_priv.as_ref(),
        }
    }

    /// Replace the tables served by `executor` with this dump's tables.
    pub fn install(&self, executor: &MemoryExecutor) {
        for level in GrantLevel::LOAD_ORDER {
            match self.table(level) {
                Some(table) => executor.set_table(level, table.to_memory_table()),
                None => {
                    executor.remove_table(level);
                }
            }
        }
    }

    /// A fresh executor serving this dump.
    pub fn into_executor(self) -> MemoryExecutor {
        let executor = MemoryExecutor::new();
        self.install(&executor);
        executor
    }
}
