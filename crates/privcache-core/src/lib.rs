//! privcache core - in-memory cache of SQL grant tables.
//!
//! This crate decodes the rows of the four grant tables (`mysql.user`,
//! `mysql.db`, `mysql.tables_priv`, `mysql.columns_priv`) into typed,
//! bit-masked privilege records and publishes them as one immutable
//! [`Snapshot`]. Authorization checks read the published snapshot while a
//! reload builds the next generation off to the side.
//!
//! # Example
//!
//! ```ignore
//! use privcache_core::{CacheConfig, PrivilegeCache};
//!
//! let cache = PrivilegeCache::new(CacheConfig::default());
//! let report = cache.reload(&executor)?;
//!
//! if let Some(snapshot) = cache.snapshot() {
//!     for user in snapshot.users() {
//!         println!("{}@{}: {}", user.user, user.host, user.privileges);
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod loader;
pub mod privilege;
pub mod record;
pub mod snapshot;
pub mod source;

pub use cache::{CacheState, PrivilegeCache, ReloadReport};
pub use config::{CacheConfig, ConcurrentReload, TimestampPolicy};
pub use decode::{
    ColumnsPrivDecoder, DbDecoder, DecodeContext, DecodeWarning, RowDecoder, TablesPrivDecoder,
    UserDecoder,
};
pub use error::{FetchError, LoadError, PrivilegeError, PrivilegeResult, TimestampError};
pub use loader::{load_table, LevelLoad, LoadOptions};
pub use privilege::{GrantLevel, PrivilegeBitMap, PrivilegeBits};
pub use record::{ColumnPrivRecord, DbRecord, TablePrivRecord, UserRecord};
pub use snapshot::{RecordCounts, Snapshot};
pub use source::{ColumnDescriptor, Datum, QueryExecutor, Row, RowSource, StorageKind};
