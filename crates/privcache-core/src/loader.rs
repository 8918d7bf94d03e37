//! Loading one grant table through a row decoder.

use crate::config::TimestampPolicy;
use crate::decode::{DecodeContext, DecodeWarning, RowDecoder};
use crate::error::{LoadError, PrivilegeError, PrivilegeResult};
use crate::source::{QueryExecutor, RowSource};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::debug;

/// Settings shared by the level loads of one reload.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Handling of malformed timestamps.
    pub timestamp_policy: TimestampPolicy,
    /// Abort once this instant passes, with the configured timeout for reporting.
    pub deadline: Option<(Instant, Duration)>,
}

impl LoadOptions {
    /// Options with a deadline `timeout` after `started`.
    pub fn with_deadline(mut self, started: Instant, timeout: Duration) -> Self {
        self.deadline = Some((started + timeout, timeout));
        self
    }

    fn check_deadline(&self) -> Result<(), LoadError> {
        match self.deadline {
            Some((deadline, timeout)) if Instant::now() >= deadline => {
                Err(LoadError::DeadlineExceeded(timeout))
            }
            _ => Ok(()),
        }
    }
}

/// Records and warnings produced by one level load.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLoad<R> {
    /// Records in query order.
    pub records: Vec<R>,
    /// Non-fatal decode problems.
    pub warnings: Vec<DecodeWarning>,
}

/// Closes the wrapped row source when dropped.
struct SourceGuard<'a> {
    source: Box<dyn RowSource + 'a>,
}

impl<'a> Deref for SourceGuard<'a> {
    type Target = dyn RowSource + 'a;

    fn deref(&self) -> &Self::Target {
        self.source.as_ref()
    }
}

impl DerefMut for SourceGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.source.as_mut()
    }
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Run `D::LEVEL`'s load query and decode every row.
///
/// Records accumulate in a fresh vector that is returned only when the
/// whole result set decoded. The row source is closed on every exit path.
/// Errors carry the grant level and, when tied to a row, its ordinal.
pub fn load_table<D: RowDecoder>(
    executor: &dyn QueryExecutor,
    decoder: &D,
    options: &LoadOptions,
) -> PrivilegeResult<LevelLoad<D::Record>> {
    let level = D::LEVEL;
    let started = Instant::now();
    debug!(%level, query = level.query(), "loading grant table");

    options
        .check_deadline()
        .map_err(|e| PrivilegeError::load(level, None, e))?;

    let mut source = SourceGuard {
        source: executor
            .execute(level.query())
            .map_err(|e| PrivilegeError::load(level, None, e))?,
    };
    let columns = source.columns().to_vec();

    let mut ctx = DecodeContext::new(level, options.timestamp_policy);
    let mut records = Vec::new();
    loop {
        let ordinal = records.len();
        options
            .check_deadline()
            .map_err(|e| PrivilegeError::load(level, Some(ordinal), e))?;

        let row = match source.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => return Err(PrivilegeError::load(level, Some(ordinal), e)),
        };

        ctx.set_row(ordinal);
        let record = decoder
            .decode(&row, &columns, &mut ctx)
            .map_err(|e| PrivilegeError::load(level, Some(ordinal), e))?;
        records.push(record);
    }

    debug!(
        %level,
        rows = records.len(),
        warnings = ctx.warnings().len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "grant table loaded"
    );

    Ok(LevelLoad {
        records,
        warnings: ctx.into_warnings(),
    })
}
