//! Command-line configuration.

use clap::{Parser, ValueEnum};
use privcache_core::{CacheConfig, TimestampPolicy};
use std::path::PathBuf;
use std::time::Duration;

use crate::formatter::OutputFormat;

/// Default reload timeout in seconds.
pub const DEFAULT_RELOAD_TIMEOUT_SECS: u64 = 30;

/// Timestamp policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestampArg {
    /// Replace malformed timestamps with the zero value and warn
    Default,
    /// Fail the reload on a malformed timestamp
    Reject,
}

impl From<TimestampArg> for TimestampPolicy {
    fn from(arg: TimestampArg) -> Self {
        match arg {
            TimestampArg::Default => TimestampPolicy::Default,
            TimestampArg::Reject => TimestampPolicy::Reject,
        }
    }
}

/// privcache - load grant tables and print the privilege snapshot
#[derive(Parser, Debug)]
#[command(name = "privcache")]
#[command(version, about = "Load grant-table dumps into a privilege snapshot", long_about = None)]
pub struct Args {
    /// JSON dump of the mysql grant tables
    pub grants: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Handling of malformed grant timestamps
    #[arg(long, default_value = "default", value_enum)]
    pub timestamps: TimestampArg,

    /// Reload timeout in seconds (0 = no timeout)
    #[arg(long, default_value_t = DEFAULT_RELOAD_TIMEOUT_SECS)]
    pub reload_timeout: u64,

    /// Re-read the dump and reload every N seconds until interrupted (0 = load once)
    #[arg(long, default_value_t = 0)]
    pub watch: u64,
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the grant dump.
    pub grants_path: PathBuf,
    /// Output format for snapshots.
    pub format: OutputFormat,
    /// Reload interval in watch mode. None loads once.
    pub watch_interval: Option<Duration>,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl Args {
    /// Convert command-line arguments to configuration.
    pub fn into_config(self) -> CliConfig {
        let mut cache = CacheConfig::new().with_timestamp_policy(self.timestamps.into());
        if self.reload_timeout > 0 {
            cache = cache.with_reload_timeout(Duration::from_secs(self.reload_timeout));
        }

        let watch_interval = if self.watch == 0 {
            None
        } else {
            Some(Duration::from_secs(self.watch))
        };

        CliConfig {
            grants_path: self.grants,
            format: self.format,
            watch_interval,
            cache,
        }
    }
}
