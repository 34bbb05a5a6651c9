//! Concurrent upload orchestration.
//!
//! A fixed pool of workers drains a shared task queue. Each claimed task
//! is run through the retry policy around one storage client call and
//! yields exactly one outcome; a crash while handling a task is contained
//! as a failed outcome for that task alone.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::client::{ErrorKind, StorageClient, UploadError, UploadReceipt};
use crate::retry::{with_retries, RetryConfig};
use crate::walk::UploadTask;

/// Terminal state of one task.
#[derive(Debug)]
pub enum UploadStatus {
    Succeeded(UploadReceipt),
    FailedPermanently,
}

/// One outcome per claimed task. Never mutated after creation.
#[derive(Debug)]
pub struct UploadOutcome {
    pub task: UploadTask,
    pub status: UploadStatus,
    pub attempts_made: u32,
    pub last_error: Option<UploadError>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, UploadStatus::Succeeded(_))
    }
}

/// Runs `workers` concurrent workers over the task queue until it drains,
/// or until `shutdown` is flipped, in which case in-flight uploads finish
/// but no further tasks are claimed.
///
/// Returns one outcome per claimed task, in completion order.
pub async fn run_uploads<C>(
    client: Arc<C>,
    retry: RetryConfig,
    tasks: Vec<UploadTask>,
    workers: usize,
    shutdown: Arc<AtomicBool>,
) -> Vec<UploadOutcome>
where
    C: StorageClient + 'static,
{
    let workers = workers.max(1);
    let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));

    let handles: Vec<_> = (0..workers)
        .map(|worker_id| {
            let client = Arc::clone(&client);
            let queue = Arc::clone(&queue);
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(worker_loop(worker_id, client, retry, queue, shutdown))
        })
        .collect();

    let mut outcomes = Vec::new();
    for joined in join_all(handles).await {
        match joined {
            Ok(mut worker_outcomes) => outcomes.append(&mut worker_outcomes),
            // Loop-level crashes lose the worker, not the run; tasks it
            // never claimed remain accounted for by the reporter.
            Err(e) => error!(error = %e, "worker loop failed to join"),
        }
    }
    outcomes
}

async fn worker_loop<C>(
    worker_id: usize,
    client: Arc<C>,
    retry: RetryConfig,
    queue: Arc<Mutex<VecDeque<UploadTask>>>,
    shutdown: Arc<AtomicBool>,
) -> Vec<UploadOutcome>
where
    C: StorageClient + 'static,
{
    let mut outcomes = Vec::new();
    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!(worker_id, "shutdown requested, not claiming further tasks");
            break;
        }
        let claimed = queue.lock().await.pop_front();
        let Some(task) = claimed else {
            break;
        };
        outcomes.push(process_task(&client, retry, task).await);
    }
    outcomes
}

/// Runs one task to completion. The client call runs in its own spawned
/// task so a panic costs only this task's outcome and the worker moves on.
async fn process_task<C>(client: &Arc<C>, retry: RetryConfig, task: UploadTask) -> UploadOutcome
where
    C: StorageClient + 'static,
{
    info!(file = %task.local_path.display(), "uploading");

    let attempt_client = Arc::clone(client);
    let attempt_task = task.clone();
    let handle = tokio::spawn(async move {
        with_retries(&retry, || {
            let client = Arc::clone(&attempt_client);
            let task = attempt_task.clone();
            async move {
                client
                    .upload(&task.local_path, &task.destination_folder_id, retry.chunk_size)
                    .await
            }
        })
        .await
    });

    match handle.await {
        Ok(attempted) => match attempted.result {
            Ok(receipt) => {
                info!(
                    file = %task.local_path.display(),
                    file_id = %receipt.file_id,
                    attempts = attempted.attempts_made,
                    "upload succeeded"
                );
                UploadOutcome {
                    task,
                    status: UploadStatus::Succeeded(receipt),
                    attempts_made: attempted.attempts_made,
                    last_error: None,
                }
            }
            Err(e) => {
                error!(
                    file = %task.local_path.display(),
                    error = %e,
                    attempts = attempted.attempts_made,
                    "upload failed permanently"
                );
                UploadOutcome {
                    task,
                    status: UploadStatus::FailedPermanently,
                    attempts_made: attempted.attempts_made,
                    last_error: Some(e),
                }
            }
        },
        Err(join_error) => {
            error!(
                file = %task.local_path.display(),
                error = %join_error,
                "worker crashed while handling task"
            );
            UploadOutcome {
                task,
                status: UploadStatus::FailedPermanently,
                attempts_made: 0,
                last_error: Some(UploadError::new(
                    ErrorKind::Unknown,
                    format!("worker crashed: {join_error}"),
                )),
            }
        }
    }
}
