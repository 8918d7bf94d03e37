//! CLI error types.

use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the dump failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The dump or the output could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading or publishing privileges failed.
    #[error("privilege error: {0}")]
    Privilege(#[from] privcache_core::PrivilegeError),

    /// A watch-mode reload task panicked or was cancelled.
    #[error("reload task failed: {0}")]
    Task(String),
}
