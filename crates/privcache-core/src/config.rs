//! Privilege cache configuration.

use std::time::Duration;

/// How to treat a timestamp column that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Use the zero timestamp and report a decode warning.
    #[default]
    Default,
    /// Fail the load.
    Reject,
}

/// What a reload does when another reload is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrentReload {
    /// Return [`PrivilegeError::ReloadInProgress`](crate::PrivilegeError::ReloadInProgress) immediately.
    #[default]
    Reject,
    /// Block until the running reload finishes, then reload again.
    Wait,
}

/// Privilege cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Handling of malformed timestamps.
    pub timestamp_policy: TimestampPolicy,

    /// Handling of overlapping reload requests.
    pub concurrent_reload: ConcurrentReload,

    /// Upper bound on one reload's wall-clock time. None disables the bound.
    ///
    /// Checked between rows; a single blocking fetch is not interrupted.
    pub reload_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp policy.
    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Set the concurrent reload policy.
    pub fn with_concurrent_reload(mut self, policy: ConcurrentReload) -> Self {
        self.concurrent_reload = policy;
        self
    }

    /// Set the reload timeout.
    pub fn with_reload_timeout(mut self, timeout: Duration) -> Self {
        self.reload_timeout = Some(timeout);
        self
    }

    /// Disable the reload timeout.
    pub fn without_reload_timeout(mut self) -> Self {
        self.reload_timeout = None;
        self
    }

    /// Check if a reload timeout is configured.
    pub fn has_reload_timeout(&self) -> bool {
        self.reload_timeout.is_some()
    }
}
