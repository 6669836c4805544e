//! Retry Patterns Example
//!
//! Demonstrates declarative retry policies. Shows practical patterns including:
//! - Blocking retry of a value-less operation
//! - Retrying on a returned value, not just on faults
//! - Refining a fault kind with a predicate
//! - Observing absorbed attempts with hooks and tracing
//! - Cancelling an execution from another task

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use steadfast::prelude::*;
use steadfast::PolicyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Timeout,
    Http,
}

#[derive(Debug)]
enum NetError {
    Timeout,
    Http(u16),
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::Timeout => write!(f, "timed out"),
            NetError::Http(code) => write!(f, "HTTP {}", code),
        }
    }
}

impl Fault for NetError {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            NetError::Timeout => Kind::Timeout,
            NetError::Http(_) => Kind::Http,
        }
    }
}

fn describe<T: std::fmt::Debug>(report: &ExecutionReport<NetError, T>) {
    match (&report.status, &report.result, &report.unhandled) {
        (Status::Success, Some(value), _) => println!(
            "  Success after {} absorbed attempt(s) in {:?}: {:?}",
            report.attempts.len(),
            report.elapsed,
            value
        ),
        (_, _, Some(reason)) => println!(
            "  Failed after {} absorbed attempt(s): {}",
            report.attempts.len(),
            reason
        ),
        _ => println!("  Inconsistent report: {:?}", report.status),
    }
}

// ==================== Blocking Retry ====================

/// Example 1: Blocking retry of an operation that produces nothing
fn example_blocking() {
    println!("\n=== Example 1: Blocking Retry ===");

    let policy = RetryPolicy::<NetError>::handle(Kind::Timeout)
        .count(4)
        .interval([Duration::from_millis(50), Duration::from_millis(100)]);

    let mut n = 0;
    let report = policy.execute(
        || {
            n += 1;
            println!("  Attempt {}", n);
            if n < 3 {
                Err(NetError::Timeout)
            } else {
                Ok(())
            }
        },
        &CancellationToken::new(),
    );

    describe(&report);
}

// ==================== Result Triggers ====================

/// Example 2: Poll until a job reports completion
async fn example_result_trigger() {
    println!("\n=== Example 2: Retry on Result ===");

    let polls = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::<NetError, Option<String>>::result(Option::is_none)
        .or_handle(Kind::Timeout)
        .count(5)
        .interval([Duration::from_millis(20)]);

    let report = policy
        .execute_async(
            || {
                let polls = polls.clone();
                async move {
                    let n = polls.fetch_add(1, Ordering::SeqCst);
                    println!("  Poll {}", n + 1);
                    Ok((n >= 2).then(|| "job-42 complete".to_string()))
                }
            },
            &CancellationToken::new(),
        )
        .await;

    describe(&report);
}

// ==================== Refined Faults ====================

/// Example 3: Retry server errors, give up on client errors
async fn example_refined_faults() {
    println!("\n=== Example 3: Refined Fault Kinds ===");

    let policy = RetryPolicy::<NetError, String>::handle_if(Kind::Http, |e| {
        matches!(e, NetError::Http(code) if *code >= 500)
    })
    .count(3)
    .interval([Duration::from_millis(10)]);

    for codes in [[503, 200], [404, 200]] {
        println!("--- Responses {:?} ---", codes);
        let calls = Arc::new(AtomicU32::new(0));
        let report = policy
            .execute_async(
                || {
                    let calls = calls.clone();
                    async move {
                        let code = codes[calls.fetch_add(1, Ordering::SeqCst) as usize];
                        if code == 200 {
                            Ok("body".to_string())
                        } else {
                            Err(NetError::Http(code))
                        }
                    }
                },
                &CancellationToken::new(),
            )
            .await;
        describe(&report);
    }
}

// ==================== Hooks ====================

/// Example 4: Observe absorbed attempts, with settings from configuration
fn example_hooks() {
    println!("\n=== Example 4: Hooks and Config ===");

    let config = PolicyConfig {
        max_attempts: 3,
        intervals: vec![Duration::from_millis(10), Duration::from_millis(30)],
    };

    let policy = RetryPolicy::<NetError>::handle(Kind::Timeout)
        .apply(&config)
        .on_retry(|event| {
            println!(
                "  Attempt {} absorbed after {:?}, next wait {:?}",
                event.attempt, event.elapsed, event.next_delay
            );
        });

    let report = policy.execute(|| Err(NetError::Timeout), &CancellationToken::new());
    describe(&report);
}

// ==================== Cancellation ====================

/// Example 5: Cancel a long backoff from another task
async fn example_cancellation() {
    println!("\n=== Example 5: Cancellation ===");

    let policy = RetryPolicy::<NetError>::handle(Kind::Timeout)
        .count(10)
        .interval([Duration::from_secs(5)]);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("  Cancelling...");
        canceller.cancel();
    });

    let report = policy
        .execute_async(|| async { Err(NetError::Timeout) }, &token)
        .await;
    describe(&report);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_blocking();
    example_result_trigger().await;
    example_refined_faults().await;
    example_hooks();
    example_cancellation().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
