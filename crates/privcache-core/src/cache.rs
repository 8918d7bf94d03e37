//! The published privilege cache and its reload protocol.
//!
//! A reload loads the four grant levels in order (user, db, tables_priv,
//! columns_priv) into fresh vectors and only then swaps the published
//! [`Snapshot`] pointer. Readers clone an `Arc` to whatever generation is
//! current and never wait on row fetching; a failed reload leaves the
//! previous generation in place.

use crate::config::{CacheConfig, ConcurrentReload};
use crate::decode::{ColumnsPrivDecoder, DbDecoder, DecodeWarning, TablesPrivDecoder, UserDecoder};
use crate::error::{PrivilegeError, PrivilegeResult};
use crate::loader::{load_table, LoadOptions};
use crate::snapshot::{RecordCounts, Snapshot};
use crate::source::QueryExecutor;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Lifecycle state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing published yet and no reload running.
    Empty,
    /// A reload is building a snapshot.
    Loading,
    /// A snapshot is published and no reload is running.
    Ready,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Empty => write!(f, "empty"),
            CacheState::Loading => write!(f, "loading"),
            CacheState::Ready => write!(f, "ready"),
        }
    }
}

/// Outcome of a successful reload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadReport {
    /// Generation of the newly published snapshot.
    pub generation: u64,
    /// Records loaded per level.
    pub counts: RecordCounts,
    /// Non-fatal decode problems, in load order.
    pub warnings: Vec<DecodeWarning>,
    /// Wall-clock time spent loading.
    pub elapsed: Duration,
}

/// In-memory cache of the grant tables.
///
/// Holds at most one published snapshot. Reloads are serialized; what a
/// second, overlapping reload does is set by [`ConcurrentReload`].
pub struct PrivilegeCache {
    config: CacheConfig,
    published: RwLock<Option<Arc<Snapshot>>>,
    reload_lock: Mutex<()>,
    loading: AtomicBool,
    generation: AtomicU64,
}

/// Clears the loading flag when a reload ends, however it ends.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PrivilegeCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            published: RwLock::new(None),
            reload_lock: Mutex::new(()),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// The cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CacheState {
        if self.loading.load(Ordering::SeqCst) {
            CacheState::Loading
        } else if self.published.read().is_some() {
            CacheState::Ready
        } else {
            CacheState::Empty
        }
    }

    /// The published snapshot, if any.
    ///
    /// The returned `Arc` stays valid after later reloads; it simply stops
    /// being the current generation.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.published.read().clone()
    }

    /// Generation of the published snapshot; 0 before the first publish.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reload every grant level and publish the result atomically.
    ///
    /// On error nothing is published and the error names the failing level.
    /// No retries happen here; retry policy belongs to the caller.
    pub fn reload(&self, executor: &dyn QueryExecutor) -> PrivilegeResult<ReloadReport> {
        let _serial = match self.config.concurrent_reload {
            ConcurrentReload::Reject => self.reload_lock.try_lock().ok_or_else(|| {
                warn!("privilege reload rejected, another reload is in progress");
                PrivilegeError::ReloadInProgress
            })?,
            ConcurrentReload::Wait => self.reload_lock.lock(),
        };
        let _loading = LoadingFlag::raise(&self.loading);

        let started = Instant::now();
        let generation = self.generation() + 1;
        info!(generation, "reloading privilege tables");

        let (snapshot, warnings) = match self.build(executor, generation, started) {
            Ok(built) => built,
            Err(e) => {
                error!(
                    error = %e,
                    level = ?e.level(),
                    kept_generation = generation - 1,
                    "privilege reload failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };

        let counts = snapshot.record_counts();
        let previous = self.publish(snapshot);
        self.generation.store(generation, Ordering::SeqCst);
        drop(previous);

        let elapsed = started.elapsed();
        info!(
            generation,
            users = counts.users,
            dbs = counts.dbs,
            tables_privs = counts.tables_privs,
            columns_privs = counts.columns_privs,
            warnings = warnings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "privilege snapshot published"
        );

        Ok(ReloadReport {
            generation,
            counts,
            warnings,
            elapsed,
        })
    }

    fn build(
        &self,
        executor: &dyn QueryExecutor,
        generation: u64,
        started: Instant,
    ) -> PrivilegeResult<(Snapshot, Vec<DecodeWarning>)> {
        let mut options = LoadOptions {
            timestamp_policy: self.config.timestamp_policy,
            deadline: None,
        };
        if let Some(timeout) = self.config.reload_timeout {
            options = options.with_deadline(started, timeout);
        }

        let users = load_table(executor, &UserDecoder, &options)?;
        let dbs = load_table(executor, &DbDecoder, &options)?;
        let tables_privs = load_table(executor, &TablesPrivDecoder, &options)?;
        let columns_privs = load_table(executor, &ColumnsPrivDecoder, &options)?;

        let mut warnings = users.warnings;
        warnings.extend(dbs.warnings);
        warnings.extend(tables_privs.warnings);
        warnings.extend(columns_privs.warnings);

        let snapshot = Snapshot::new(
            generation,
            users.records,
            dbs.records,
            tables_privs.records,
            columns_privs.records,
        );
        Ok((snapshot, warnings))
    }

    /// Swap in `snapshot`, returning the previous one so it is dropped
    /// outside the lock.
    fn publish(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let snapshot = Arc::new(snapshot);
        std::mem::replace(&mut *self.published.write(), Some(snapshot))
    }
}

impl Default for PrivilegeCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for PrivilegeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivilegeCache")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::GrantLevel;
    use crate::source::memory::{MemoryExecutor, MemoryTable};
    use crate::source::{ColumnDescriptor, Datum};

    fn executor() -> MemoryExecutor {
        let user = MemoryTable::new(vec![
            ColumnDescriptor::string("Host"),
            ColumnDescriptor::string("User"),
            ColumnDescriptor::flag("Select_priv"),
        ])
        .with_row(vec![Datum::string("%"), Datum::string("root"), Datum::flag(true)]);
        let db = MemoryTable::new(vec![
            ColumnDescriptor::string("Host"),
            ColumnDescriptor::string("Db"),
            ColumnDescriptor::string("User"),
        ]);
        let tables = MemoryTable::new(vec![ColumnDescriptor::string("Host")]);
        let columns = MemoryTable::new(vec![ColumnDescriptor::string("Host")]);

        MemoryExecutor::new()
            .with_table(GrantLevel::User, user)
            .with_table(GrantLevel::Db, db)
            .with_table(GrantLevel::TablesPriv, tables)
            .with_table(GrantLevel::ColumnsPriv, columns)
    }

    #[test]
    fn test_empty_cache() {
        let cache = PrivilegeCache::default();
        assert_eq!(cache.state(), CacheState::Empty);
        assert_eq!(cache.generation(), 0);
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_reload_publishes() {
        let cache = PrivilegeCache::default();
        let executor = executor();

        let report = cache.reload(&executor).unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.counts.users, 1);
        assert_eq!(cache.state(), CacheState::Ready);

        let snapshot = cache.snapshot().unwrap();
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.users()[0].user, "root");
        assert_eq!(executor.opened_sources(), 4);
        assert_eq!(executor.closed_sources(), 4);
    }

    #[test]
    fn test_first_reload_failure_stays_empty() {
        let cache = PrivilegeCache::default();
        let executor = executor();
        executor.remove_table(GrantLevel::ColumnsPriv);

        let err = cache.reload(&executor).unwrap_err();
        assert_eq!(err.level(), Some(GrantLevel::ColumnsPriv));
        assert_eq!(cache.state(), CacheState::Empty);
        assert_eq!(cache.generation(), 0);
    }

    #[test]
    fn test_reload_rejected_while_locked() {
        let cache = PrivilegeCache::default();
        let _held = cache.reload_lock.lock();

        let err = cache.reload(&executor()).unwrap_err();
        assert!(matches!(err, PrivilegeError::ReloadInProgress));
    }

    #[test]
    fn test_loading_state_visible_during_reload() {
        let cache = PrivilegeCache::default();
        {
            let _flag = LoadingFlag::raise(&cache.loading);
            assert_eq!(cache.state(), CacheState::Loading);
        }
        assert_eq!(cache.state(), CacheState::Empty);
    }

    #[test]
    fn test_debug_output() {
        let cache = PrivilegeCache::default();
        let text = format!("{:?}", cache);
        assert!(text.contains("Empty"));
    }
}
