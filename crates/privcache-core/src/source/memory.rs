//! In-memory grant tables served through the row-source contract.
//!
//! Used by tooling that loads grant dumps from files and by tests. Rows are
//! sorted by the level's ORDER BY columns before they are served, the same
//! way the engine would answer the load query.

use super::{ColumnDescriptor, Datum, QueryExecutor, Row, RowSource};
use crate::error::FetchError;
use crate::privilege::GrantLevel;
use parking_lot::RwLock;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Contents of one grant table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    /// Result columns.
    pub columns: Vec<ColumnDescriptor>,
    /// Rows in insertion order.
    pub rows: Vec<Row>,
    /// Fail with a fetch error when asked for this row ordinal.
    pub fail_at_row: Option<usize>,
}

impl MemoryTable {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            fail_at_row: None,
        }
    }

    /// Append a row.
    pub fn with_row(mut self, values: Vec<Datum>) -> Self {
        self.rows.push(Row::new(values));
        self
    }

    /// Inject a fetch failure at the given row ordinal.
    pub fn failing_at(mut self, row: usize) -> Self {
        self.fail_at_row = Some(row);
        self
    }

    fn sorted_rows(&self, level: GrantLevel) -> Vec<Row> {
        let keys: Vec<usize> = level
            .order_columns()
            .iter()
            .filter_map(|key| {
                self.columns
                    .iter()
                    .position(|column| column.name.eq_ignore_ascii_case(key))
            })
            .collect();

        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            keys.iter()
                .map(|&index| sort_key(a, index).cmp(&sort_key(b, index)))
                .find(|ordering| *ordering != CmpOrdering::Equal)
                .unwrap_or(CmpOrdering::Equal)
        });
        rows
    }
}

fn sort_key(row: &Row, index: usize) -> &str {
    row.get(index).and_then(Datum::as_str).unwrap_or("")
}

/// Query executor over in-memory grant tables.
///
/// Tables can be replaced between reloads. The executor counts opened and
/// closed cursors so callers can confirm every cursor was released.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<HashMap<GrantLevel, MemoryTable>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl MemoryExecutor {
    /// Create an executor with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table, builder style.
    pub fn with_table(self, level: GrantLevel, table: MemoryTable) -> Self {
        self.set_table(level, table);
        self
    }

    /// Add or replace a table.
    pub fn set_table(&self, level: GrantLevel, table: MemoryTable) {
        self.tables.write().insert(level, table);
    }

    /// Remove a table; later queries against it fail.
    pub fn remove_table(&self, level: GrantLevel) -> Option<MemoryTable> {
        self.tables.write().remove(&level)
    }

    /// Number of cursors handed out.
    pub fn opened_sources(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of cursors closed.
    pub fn closed_sources(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(&self, query: &str) -> Result<Box<dyn RowSource + '_>, FetchError> {
        let level = GrantLevel::from_query(query)
            .ok_or_else(|| FetchError::new(format!("unsupported query: {}", query)))?;

        let tables = self.tables.read();
        let table = tables.get(&level).ok_or_else(|| {
            FetchError::new(format!("table {} doesn't exist", level.table_name()))
        })?;

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySource {
            columns: table.columns.clone(),
            rows: table.sorted_rows(level).into_iter(),
            fail_at_row: table.fail_at_row,
            position: 0,
            closed: &self.closed,
            released: false,
        }))
    }
}

struct MemorySource<'a> {
    columns: Vec<ColumnDescriptor>,
    rows: std::vec::IntoIter<Row>,
    fail_at_row: Option<usize>,
    position: usize,
    closed: &'a AtomicUsize,
    released: bool,
}

impl RowSource for MemorySource<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, FetchError> {
        if self.released {
            return Err(FetchError::new("cursor is closed"));
        }
        if self.fail_at_row == Some(self.position) {
            return Err(FetchError::new(format!(
                "lost connection while reading row {}",
                self.position
            )));
        }
        self.position += 1;
        Ok(self.rows.next())
    }

    fn close(&mut self) {
        if !self.released {
            self.released = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
