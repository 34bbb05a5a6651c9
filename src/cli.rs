//! CLI surface and the async entrypoint shared by `main` and the
//! integration tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::client::BoxClient;
use crate::credentials::load_client_config;
use crate::error::ConfigError;
use crate::report::RunReport;
use crate::retry::RetryConfig;
use crate::upload::run_uploads;
use crate::walk::enumerate_tasks;

const DEFAULT_RETRIES: u32 = 6;
const DEFAULT_BACKOFF_SECS: f64 = 0.75;
const DEFAULT_CHUNK: u64 = 8 * 1024 * 1024;

fn default_workers() -> u64 {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as u64)
        .unwrap_or(4);
    (cpus * 4).min(8)
}

/// Upload a folder to Box with concurrency and retries.
#[derive(Parser, Debug)]
#[clap(
    name = "fast-load",
    version,
    about = "Bulk-upload a local folder to a Box folder with concurrency and retries"
)]
pub struct Cli {
    /// Local directory to upload.
    pub local_folder: PathBuf,

    /// Destination Box folder id.
    pub box_folder_id: String,

    /// Path to the Box app JWT JSON (or set JWT_CONFIG_BASE_64).
    #[clap(long)]
    pub jwt_config: Option<PathBuf>,

    /// Act-as user ID.
    #[clap(long)]
    pub as_user: Option<String>,

    /// Concurrent upload workers.
    #[clap(long, default_value_t = default_workers(), value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: u64,

    /// Max attempts per file, including the first one.
    #[clap(long, default_value_t = DEFAULT_RETRIES, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    /// Base backoff unit in seconds.
    #[clap(long, default_value_t = DEFAULT_BACKOFF_SECS)]
    pub backoff: f64,

    /// Chunk size in bytes passed to the storage client.
    #[clap(long, default_value_t = DEFAULT_CHUNK, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk: u64,
}

/// Extracted async CLI logic entrypoint for integration tests and main().
///
/// Configuration problems return an error before any upload is attempted;
/// per-file failures are captured inside the returned report instead.
pub async fn run(cli: Cli) -> Result<RunReport> {
    if !cli.backoff.is_finite() || cli.backoff <= 0.0 {
        return Err(ConfigError::InvalidBackoff(cli.backoff).into());
    }

    let client_config = load_client_config(cli.jwt_config.as_deref(), cli.as_user.clone())?;
    let tasks = enumerate_tasks(&cli.local_folder, &cli.box_folder_id)?;
    let total = tasks.len();
    if tasks.is_empty() {
        println!("no files to upload");
        return Ok(RunReport::new(0, Vec::new()));
    }

    let retry = RetryConfig {
        max_attempts: cli.retries,
        base_backoff: Duration::from_secs_f64(cli.backoff),
        chunk_size: cli.chunk,
    };
    let client = BoxClient::connect(&client_config)
        .await
        .context("failed to authenticate against the storage API")?;

    println!(
        "Uploading {total} files to Box folder {} with {} workers...",
        cli.box_folder_id, cli.workers
    );
    info!(
        files = total,
        folder_id = %cli.box_folder_id,
        workers = cli.workers,
        retries = cli.retries,
        "starting upload run"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight uploads");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let outcomes = run_uploads(
        Arc::new(client),
        retry,
        tasks,
        cli.workers as usize,
        shutdown,
    )
    .await;

    let report = RunReport::new(total, outcomes);
    print!("{}", report.render());
    Ok(report)
}
