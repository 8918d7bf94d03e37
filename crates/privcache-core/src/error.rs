//! Error types for loading and publishing grant data.

use crate::privilege::{GrantLevel, PrivilegeBits};
use std::time::Duration;
use thiserror::Error;

/// The query collaborator failed to execute or iterate a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    /// Create a fetch error with the collaborator's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The collaborator's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A timestamp value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed timestamp `{0}`")]
pub struct TimestampError(pub String);

/// Failure while loading one grant table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Executing or iterating the query failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A granted flag column or a set member has no entry in the bit map.
    #[error("unknown privilege `{name}` in column {column}")]
    UnknownPrivilegeColumn {
        /// Column being decoded.
        column: String,
        /// The unmapped flag column or set member.
        name: String,
    },

    /// A column resolved to privileges that its grant level cannot express.
    #[error("column {column} grants {privileges}, which is not allowed at {level} level")]
    PrivilegeOutsideMask {
        /// Column being decoded.
        column: String,
        /// The offending privileges.
        privileges: PrivilegeBits,
        /// Level whose mask was violated.
        level: GrantLevel,
    },

    /// A set-valued privilege column held a value with no set encoding.
    #[error("column {column} holds `{value}`, which is not a privilege set")]
    NotASet {
        /// Column being decoded.
        column: String,
        /// The offending value.
        value: String,
    },

    /// A timestamp column failed to parse and the policy rejects it.
    #[error("column {column}: {source}")]
    MalformedTimestamp {
        /// Column being decoded.
        column: String,
        /// Parse failure.
        source: TimestampError,
    },

    /// A row carried a different number of values than there are columns.
    #[error("row has {found} values for {expected} columns")]
    ColumnMismatch {
        /// Number of column descriptors.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },

    /// The reload ran past its configured timeout.
    #[error("reload exceeded its {0:?} timeout")]
    DeadlineExceeded(Duration),
}

/// Errors returned to reload callers.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    /// Loading a grant level failed; nothing was published.
    #[error(
        "failed to load {level} grants{}: {source}",
        .row.map(|row| format!(" at row {}", row)).unwrap_or_default()
    )]
    Load {
        /// The grant level being loaded.
        level: GrantLevel,
        /// Ordinal of the failing row, if the failure was tied to one.
        row: Option<usize>,
        /// Underlying failure.
        source: LoadError,
    },

    /// Another reload is already building a snapshot.
    #[error("a privilege reload is already in progress")]
    ReloadInProgress,

    /// The static bit map does not cover the grant-table schema.
    #[error("privilege bit map is incomplete: {0}")]
    IncompleteBitMap(String),
}

impl PrivilegeError {
    /// Wrap a load failure with the level and row it happened at.
    pub fn load(level: GrantLevel, row: Option<usize>, source: impl Into<LoadError>) -> Self {
        PrivilegeError::Load {
            level,
            row,
            source: source.into(),
        }
    }

    /// The grant level that failed, for load errors.
    pub fn level(&self) -> Option<GrantLevel> {
        match self {
            PrivilegeError::Load { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// The underlying load failure, for load errors.
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            PrivilegeError::Load { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the failure was an unmapped privilege column or member.
    pub fn is_unknown_privilege(&self) -> bool {
        matches!(
            self.load_error(),
            Some(LoadError::UnknownPrivilegeColumn { .. })
        )
    }
}

/// Result type for privilege cache operations.
pub type PrivilegeResult<T> = Result<T, PrivilegeError>;
