//! The attempt loop shared by every execution shape.
//!
//! Synchronous and suspendable, value-less and value-producing executions all
//! run through [`run`]. The shapes differ only in the [`Pause`] they supply and
//! in how the operation's future is produced; the loop itself is written once.

use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::classifier::Fault;
use super::delay::Pause;
use super::error::Unhandled;
use super::policy::{RetryEvent, RetryPolicy};
use super::report::{AttemptRecord, ExecutionReport};

/// Run `operation` under `policy` until it is accepted, fails for good, runs
/// out of attempts, or is cancelled.
///
/// `pause` is owned by this call and dropped on every exit path.
pub(crate) async fn run<F, T, Op, Fut, P>(
    policy: &RetryPolicy<F, T>,
    operation: Op,
    token: &CancellationToken,
    pause: P,
) -> ExecutionReport<F, T>
where
    F: Fault,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, F>>,
    P: Pause,
{
    let span = tracing::debug_span!("retry", max_attempts = policy.max_attempts());
    attempt_loop(policy, operation, token, pause)
        .instrument(span)
        .await
}

async fn attempt_loop<F, T, Op, Fut, P>(
    policy: &RetryPolicy<F, T>,
    mut operation: Op,
    token: &CancellationToken,
    mut pause: P,
) -> ExecutionReport<F, T>
where
    F: Fault,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, F>>,
    P: Pause,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts();
    let mut report = ExecutionReport::new(max_attempts);
    let mut attempt = 0u32;

    while attempt < max_attempts {
        if token.is_cancelled() {
            tracing::debug!(attempt, "cancelled before attempt");
            report.fail(Unhandled::Cancelled);
            break;
        }

        tracing::trace!(attempt, "invoking operation");
        let record = match operation().await {
            Ok(value) => {
                if !policy.results().should_retry(&value) {
                    tracing::debug!(attempts = attempt + 1, "operation succeeded");
                    report.succeed(value);
                    break;
                }
                AttemptRecord::rejected(attempt, value)
            }
            Err(fault) => {
                if !policy.faults().should_retry(&fault) {
                    tracing::debug!(attempt, kind = ?fault.kind(), "unhandled fault");
                    report.fail(Unhandled::Fault(fault));
                    break;
                }
                AttemptRecord::fault(attempt, fault)
            }
        };

        let next_delay = policy.backoff().delay(attempt);

        policy.notify(&RetryEvent {
            attempt: attempt + 1,
            record: &record,
            next_delay,
            elapsed: start.elapsed(),
        });
        tracing::debug!(
            attempt,
            rejected_value = record.as_result().is_some(),
            ?next_delay,
            "attempt absorbed"
        );

        report.attempts.push(record);
        attempt += 1;

        // Every absorbed attempt is followed by its wait, the last one included.
        if pause.pause(next_delay, token).await.is_err() {
            tracing::debug!(attempt, "cancelled during backoff");
            report.fail(Unhandled::Cancelled);
            break;
        }
    }

    if report.result.is_none() && report.unhandled.is_none() {
        let attempts = report.attempts.len() as u32;
        tracing::debug!(attempts, "maximum attempts reached");
        report.fail(Unhandled::Exhausted { attempts });
    }

    report.elapsed = start.elapsed();
    report
}
