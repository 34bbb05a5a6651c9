use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fast_load::client::{ErrorKind, UploadError};
use fast_load::retry::{backoff_delay, with_retries, Attempted, RetryConfig};

fn config(max_attempts: u32, base_ms: u64) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_backoff: Duration::from_millis(base_ms),
        chunk_size: 1024,
    }
}

fn transient() -> UploadError {
    UploadError::new(ErrorKind::Transient, "connection timed out")
}

#[tokio::test(start_paused = true)]
async fn first_success_takes_one_attempt() {
    let attempted: Attempted<&str> = with_retries(&config(6, 750), || async { Ok("done") }).await;
    assert_eq!(attempted.attempts_made, 1);
    assert_eq!(attempted.result.unwrap(), "done");
}

#[tokio::test(start_paused = true)]
async fn always_transient_consumes_exactly_max_attempts() {
    let calls = AtomicU32::new(0);
    let attempted: Attempted<()> = with_retries(&config(4, 10), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(transient()) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(attempted.attempts_made, 4);
    let err = attempted.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_consumes_a_single_attempt() {
    let calls = AtomicU32::new(0);
    let attempted: Attempted<()> = with_retries(&config(6, 10), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(UploadError::new(ErrorKind::PermissionDenied, "forbidden")) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(attempted.attempts_made, 1);
    assert_eq!(attempted.result.unwrap_err().kind(), ErrorKind::PermissionDenied);
}

#[tokio::test(start_paused = true)]
async fn success_on_attempt_k_reports_k_attempts() {
    let calls = AtomicU32::new(0);
    let attempted: Attempted<u32> = with_retries(&config(5, 10), || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n < 3 {
                Err(transient())
            } else {
                Ok(n)
            }
        }
    })
    .await;

    assert_eq!(attempted.attempts_made, 3);
    assert_eq!(attempted.result.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn backoff_follows_exponential_schedule() {
    let base = Duration::from_millis(750);
    let stamps: Arc<Mutex<Vec<tokio::time::Instant>>> = Arc::new(Mutex::new(Vec::new()));

    let recorder = Arc::clone(&stamps);
    let attempted: Attempted<()> = with_retries(
        &RetryConfig {
            max_attempts: 4,
            base_backoff: base,
            chunk_size: 1024,
        },
        || {
            recorder.lock().unwrap().push(tokio::time::Instant::now());
            async { Err(transient()) }
        },
    )
    .await;
    assert_eq!(attempted.attempts_made, 4);

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 4);
    assert_eq!(stamps[1] - stamps[0], base);
    assert_eq!(stamps[2] - stamps[1], base * 2);
    assert_eq!(stamps[3] - stamps[2], base * 4);
}

#[test]
fn backoff_delay_doubles_per_failed_attempt() {
    let base = Duration::from_millis(750);
    assert_eq!(backoff_delay(base, 1), base);
    assert_eq!(backoff_delay(base, 2), base * 2);
    assert_eq!(backoff_delay(base, 3), base * 4);
    assert_eq!(backoff_delay(base, 4), base * 8);
}

#[test]
fn backoff_delay_is_capped() {
    let base = Duration::from_secs(40);
    assert_eq!(backoff_delay(base, 1), Duration::from_secs(40));
    assert_eq!(backoff_delay(base, 2), Duration::from_secs(60));
    assert_eq!(backoff_delay(base, 10), Duration::from_secs(60));
}
