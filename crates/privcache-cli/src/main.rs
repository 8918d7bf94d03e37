//! privcache command-line tool
//!
//! Loads a JSON dump of the grant tables through the privilege cache and
//! prints the published snapshot. In watch mode the dump is re-read and
//! reloaded on an interval; a failed reload keeps serving the previous
//! snapshot.

mod config;
mod dump;
mod error;
mod formatter;

use clap::Parser;
use config::{Args, CliConfig};
use dump::GrantDump;
use error::CliError;
use formatter::{create_formatter, Formatter};
use privcache_core::source::memory::MemoryExecutor;
use privcache_core::{PrivilegeBitMap, PrivilegeCache, ReloadReport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so snapshot output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("privcache=info,privcache_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    if let Err(e) = run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: CliConfig) -> Result<(), CliError> {
    PrivilegeBitMap::verify()?;

    let formatter = create_formatter(config.format);
    let cache = Arc::new(PrivilegeCache::new(config.cache.clone()));
    let executor = Arc::new(GrantDump::read(&config.grants_path)?.into_executor());

    info!(
        path = %config.grants_path.display(),
        format = %config.format,
        timestamps = ?cache.config().timestamp_policy,
        reload_timeout = ?cache.config().reload_timeout,
        "loading grant dump"
    );
    let report = reload(&cache, &executor).await?;
    print_generation(formatter.as_ref(), &cache, &report);

    match config.watch_interval {
        Some(interval) => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "failed to listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            };
            watch(&config, formatter.as_ref(), cache, executor, interval, shutdown).await
        }
        None => Ok(()),
    }
}

/// Run a reload on the blocking pool; row fetching is synchronous.
async fn reload(
    cache: &Arc<PrivilegeCache>,
    executor: &Arc<MemoryExecutor>,
) -> Result<ReloadReport, CliError> {
    let cache = Arc::clone(cache);
    let executor = Arc::clone(executor);
    let report = tokio::task::spawn_blocking(move || cache.reload(executor.as_ref()))
        .await
        .map_err(|e| CliError::Task(e.to_string()))??;
    Ok(report)
}

/// Reload on every tick until `shutdown` completes.
async fn watch(
    config: &CliConfig,
    formatter: &dyn Formatter,
    cache: Arc<PrivilegeCache>,
    executor: Arc<MemoryExecutor>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<(), CliError> {
    info!(interval_secs = interval.as_secs(), "watching grant dump");

    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately and the initial load already ran.
    ticker.tick().await;

    // Polled across iterations: a signal that arrives mid-reload is kept.
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match refresh(config, &cache, &executor).await {
                    Ok(report) => print_generation(formatter, &cache, &report),
                    Err(e) => error!(
                        error = %e,
                        generation = cache.generation(),
                        "reload failed, still serving previous snapshot"
                    ),
                }
            }
            _ = &mut shutdown => {
                info!(generation = cache.generation(), "shutting down");
                return Ok(());
            }
        }
    }
}

async fn refresh(
    config: &CliConfig,
    cache: &Arc<PrivilegeCache>,
    executor: &Arc<MemoryExecutor>,
) -> Result<ReloadReport, CliError> {
    GrantDump::read(&config.grants_path)?.install(executor);
    reload(cache, executor).await
}

fn print_generation(formatter: &dyn Formatter, cache: &PrivilegeCache, report: &ReloadReport) {
    eprintln!("{}", formatter.format_report(report));
    if let Some(snapshot) = cache.snapshot() {
        println!("{}", formatter.format_snapshot(&snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::OutputFormat;
    use privcache_core::CacheConfig;
    use std::io::Write;
    use std::path::PathBuf;

    const DUMP: &str = r#"{
        "user": {"columns": [{"name": "Host", "kind": "string"}, {"name": "User", "kind": "string"}], "rows": [["%", "app"]]},
        "db": {"columns": [{"name": "Host", "kind": "string"}]},
        "tables_priv": {"columns": [{"name": "Host", "kind": "string"}]},
        "columns_priv": {"columns": [{"name": "Host", "kind": "string"}]}
    }"#;

    fn setup(path: PathBuf) -> (CliConfig, Arc<PrivilegeCache>, Arc<MemoryExecutor>) {
        let config = CliConfig {
            grants_path: path,
            format: OutputFormat::Json,
            watch_interval: Some(Duration::from_millis(10)),
            cache: CacheConfig::default(),
        };
        let cache = Arc::new(PrivilegeCache::new(config.cache.clone()));
        let executor = Arc::new(GrantDump::read(&config.grants_path).unwrap().into_executor());
        (config, cache, executor)
    }

    #[tokio::test]
    async fn test_watch_reloads_until_shutdown() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();
        let (config, cache, executor) = setup(file.path().to_path_buf());
        let formatter = create_formatter(config.format);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(());
        });

        let result = watch(
            &config,
            formatter.as_ref(),
            Arc::clone(&cache),
            executor,
            Duration::from_millis(10),
            async {
                let _ = rx.await;
            },
        )
        .await;

        assert!(result.is_ok());
        assert!(cache.generation() >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_signalled_before_first_tick_is_seen() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();
        let (config, cache, executor) = setup(file.path().to_path_buf());
        let formatter = create_formatter(config.format);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tx.send(()).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            watch(
                &config,
                formatter.as_ref(),
                cache,
                executor,
                Duration::from_secs(3600),
                async {
                    let _ = rx.await;
                },
            ),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_watch_keeps_snapshot_when_dump_breaks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();
        let (config, cache, executor) = setup(file.path().to_path_buf());
        reload(&cache, &executor).await.unwrap();
        std::fs::write(file.path(), "{ broken").unwrap();
        let formatter = create_formatter(config.format);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            let _ = tx.send(());
        });

        watch(
            &config,
            formatter.as_ref(),
            Arc::clone(&cache),
            executor,
            Duration::from_millis(10),
            async {
                let _ = rx.await;
            },
        )
        .await
        .unwrap();

        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.snapshot().unwrap().users()[0].user, "app");
    }
}
