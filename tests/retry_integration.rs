//! Integration tests for retry policies driving realistic operations.
//!
//! These tests exercise the public API end to end: a flaky service behind
//! blocking and async calls, cancellation from another task, and policies
//! configured from external settings.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use steadfast::prelude::*;
use steadfast::{AttemptOutcome, PolicyConfig};

// ============================================================================
// A flaky service
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ErrorKind {
    Timeout,
    Http,
    Parse,
}

#[derive(Debug, Clone, PartialEq)]
enum ServiceError {
    Timeout,
    Http(u16),
    Parse(String),
}

impl Fault for ServiceError {
    type Kind = ErrorKind;

    fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Timeout => ErrorKind::Timeout,
            ServiceError::Http(_) => ErrorKind::Http,
            ServiceError::Parse(_) => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Pending,
    Ready(String),
}

/// Replays a fixed script of responses, one per call, then repeats the last.
#[derive(Clone)]
struct Service {
    script: Arc<Vec<Result<Reply, ServiceError>>>,
    calls: Arc<AtomicU32>,
}

impl Service {
    fn new(script: Vec<Result<Reply, ServiceError>>) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn call(&self) -> Result<Reply, ServiceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        self.script[n.min(self.script.len() - 1)].clone()
    }

    async fn call_async(&self) -> Result<Reply, ServiceError> {
        tokio::task::yield_now().await;
        self.call()
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn server_errors_and_timeouts() -> RetryPolicy<ServiceError, Reply> {
    RetryPolicy::handle(ErrorKind::Timeout)
        .or_handle_if(ErrorKind::Http, |e| matches!(e, ServiceError::Http(code) if *code >= 500))
        .or_result(|reply| *reply == Reply::Pending)
}

// ============================================================================
// Blocking
// ============================================================================

#[test]
fn blocking_fetch_recovers_from_mixed_failures() {
    let service = Service::new(vec![
        Err(ServiceError::Timeout),
        Err(ServiceError::Http(503)),
        Ok(Reply::Pending),
        Ok(Reply::Ready("payload".to_string())),
    ]);
    let policy = server_errors_and_timeouts()
        .count(5)
        .interval([Duration::from_millis(2)]);

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert_eq!(service.calls(), 4);
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.result, Some(Reply::Ready("payload".to_string())));
    assert_eq!(
        report
            .attempts
            .iter()
            .map(|r| r.outcome.clone())
            .collect::<Vec<_>>(),
        vec![
            AttemptOutcome::Fault(ServiceError::Timeout),
            AttemptOutcome::Fault(ServiceError::Http(503)),
            AttemptOutcome::Rejected(Reply::Pending),
        ]
    );
}

#[test]
fn blocking_client_error_is_not_retried() {
    let service = Service::new(vec![Err(ServiceError::Http(404))]);
    let policy = server_errors_and_timeouts().count(5);

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert_eq!(service.calls(), 1);
    assert_eq!(
        report.into_result(),
        Err(Unhandled::Fault(ServiceError::Http(404)))
    );
}

#[test]
fn blocking_parse_error_is_not_retried_after_timeouts() {
    let service = Service::new(vec![
        Err(ServiceError::Timeout),
        Err(ServiceError::Parse("unexpected EOF".to_string())),
    ]);
    let policy = server_errors_and_timeouts()
        .count(5)
        .interval([Duration::from_millis(1)]);

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert_eq!(service.calls(), 2);
    assert_eq!(report.attempts.len(), 1);
    assert!(report
        .unhandled
        .as_ref()
        .and_then(Unhandled::fault)
        .is_some_and(|e| e.kind() == ErrorKind::Parse));
}

#[test]
fn blocking_waits_follow_schedule() {
    let service = Service::new(vec![Err(ServiceError::Timeout)]);
    let policy = server_errors_and_timeouts()
        .count(4)
        .interval([Duration::from_millis(10), Duration::from_millis(25)]);

    let start = Instant::now();
    let report = policy.execute(|| service.call(), &CancellationToken::new());

    // 10 + 25 + 25 + 25, one wait after each of the four attempts.
    assert!(start.elapsed() >= Duration::from_millis(85));
    assert!(report.elapsed >= Duration::from_millis(85));
    assert_eq!(report.unhandled, Some(Unhandled::Exhausted { attempts: 4 }));
}

// ============================================================================
// Async
// ============================================================================

#[tokio::test]
async fn async_fetch_recovers_after_pending_replies() {
    let service = Service::new(vec![
        Ok(Reply::Pending),
        Ok(Reply::Pending),
        Ok(Reply::Ready("done".to_string())),
    ]);
    let policy = server_errors_and_timeouts()
        .count(3)
        .interval([Duration::from_millis(1)]);

    let report = policy
        .execute_async(
            || {
                let service = service.clone();
                async move { service.call_async().await }
            },
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(service.calls(), 3);
    assert_eq!(report.result, Some(Reply::Ready("done".to_string())));
}

#[tokio::test]
async fn async_cancellation_from_another_task() {
    let service = Service::new(vec![Err(ServiceError::Timeout)]);
    let policy = server_errors_and_timeouts()
        .count(100)
        .interval([Duration::from_millis(20)]);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(70)).await;
        canceller.cancel();
    });

    let report = policy
        .execute_async(
            || {
                let service = service.clone();
                async move { service.call_async().await }
            },
            &token,
        )
        .await;

    assert_eq!(report.status, Status::Failure);
    assert_eq!(report.unhandled, Some(Unhandled::Cancelled));
    assert!(service.calls() >= 1);
    assert!(service.calls() < 100);
    assert!(report.attempts.len() as u32 <= report.max_attempts);
}

#[tokio::test]
async fn async_policy_shared_between_tasks() {
    let policy = Arc::new(
        RetryPolicy::<ServiceError>::handle(ErrorKind::Timeout)
            .count(3)
            .interval([Duration::from_millis(1)]),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let policy = policy.clone();
            tokio::spawn(async move {
                let calls = Arc::new(AtomicU32::new(0));
                let report = policy
                    .execute_async(
                        || {
                            let calls = calls.clone();
                            async move {
                                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                                    Err(ServiceError::Timeout)
                                } else {
                                    Ok(())
                                }
                            }
                        },
                        &CancellationToken::new(),
                    )
                    .await;
                report.is_success()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
}

// ============================================================================
// Configuration and hooks
// ============================================================================

#[test]
fn config_drives_attempts_and_schedule() {
    let config = PolicyConfig {
        max_attempts: 3,
        intervals: vec![Duration::from_millis(1)],
    };
    let service = Service::new(vec![Err(ServiceError::Timeout)]);
    let policy = server_errors_and_timeouts().apply(&config);

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert_eq!(service.calls(), 3);
    assert_eq!(report.max_attempts, 3);
}

#[test]
fn zero_count_config_still_makes_one_attempt() {
    let config = PolicyConfig {
        max_attempts: 0,
        intervals: Vec::new(),
    };
    let service = Service::new(vec![Err(ServiceError::Timeout)]);
    let policy = server_errors_and_timeouts().apply(&config);

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert_eq!(service.calls(), 1);
    assert_eq!(policy.backoff().delays(), &[Duration::from_secs(1)]);
    assert_eq!(report.unhandled, Some(Unhandled::Exhausted { attempts: 1 }));
}

#[test]
fn hooks_see_faults_and_rejections() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = Service::new(vec![
        Err(ServiceError::Http(502)),
        Ok(Reply::Pending),
        Ok(Reply::Ready("ok".to_string())),
    ]);
    let policy = server_errors_and_timeouts()
        .count(3)
        .interval([Duration::from_millis(1)])
        .on_retry({
            let seen = seen.clone();
            move |event| {
                let label = match &event.record.outcome {
                    AttemptOutcome::Fault(e) => format!("fault:{:?}", e.kind()),
                    AttemptOutcome::Rejected(_) => "rejected".to_string(),
                };
                seen.lock().unwrap().push((event.attempt, label));
            }
        });

    let report = policy.execute(|| service.call(), &CancellationToken::new());

    assert!(report.is_success());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, "fault:Http".to_string()), (2, "rejected".to_string())]
    );
}
