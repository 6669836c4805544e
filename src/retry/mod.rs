//! Declarative retry policies.
//!
//! A [`RetryPolicy`] describes *which* outcomes deserve another attempt and
//! *how long* to wait before making it. Executing the policy runs the
//! operation, consults the classifiers after every attempt, and returns an
//! [`ExecutionReport`] describing everything that happened.
//!
//! - **Fault classification**: faults are matched by exact [`Fault::Kind`],
//!   optionally refined by a predicate.
//! - **Result triggers**: a returned value can still trigger a retry.
//! - **Bounded attempts**: `count(n)` caps the total number of attempts.
//! - **Explicit backoff**: `interval([..])` lists the waits; the last repeats.
//! - **Cancellation**: a [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   is checked before every attempt and interrupts every wait.
//!
//! # Quick Start
//!
//! ```rust
//! use steadfast::{Fault, RetryPolicy, Unhandled};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind {
//!     Timeout,
//!     NotFound,
//! }
//!
//! #[derive(Debug, PartialEq)]
//! enum FetchError {
//!     Timeout,
//!     NotFound,
//! }
//!
//! impl Fault for FetchError {
//!     type Kind = Kind;
//!     fn kind(&self) -> Kind {
//!         match self {
//!             FetchError::Timeout => Kind::Timeout,
//!             FetchError::NotFound => Kind::NotFound,
//!         }
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::<FetchError, String>::handle(Kind::Timeout)
//!     .count(3)
//!     .interval([Duration::from_millis(1)]);
//!
//! let report = policy
//!     .execute_async(|| async { Err(FetchError::NotFound) }, &CancellationToken::new())
//!     .await;
//!
//! // NotFound is not handled, so it stops the execution at once.
//! assert_eq!(report.unhandled, Some(Unhandled::Fault(FetchError::NotFound)));
//! assert!(report.attempts.is_empty());
//! # });
//! ```
//!
//! # Outcomes
//!
//! | Situation                         | `status`  | `unhandled`                |
//! |-----------------------------------|-----------|----------------------------|
//! | value accepted                    | `Success` | `None`                     |
//! | fault of an unhandled kind        | `Failure` | `Some(Fault(f))`           |
//! | token cancelled                   | `Failure` | `Some(Cancelled)`          |
//! | every attempt absorbed            | `Failure` | `Some(Exhausted { .. })`   |

mod backoff;
mod classifier;
mod config;
mod delay;
mod engine;
mod error;
mod policy;
mod report;

pub use backoff::BackoffSchedule;
pub use classifier::{Fault, FaultClassifier, FaultPredicate, ResultClassifier, ResultPredicate};
pub use config::PolicyConfig;
#[cfg(feature = "async")]
pub use delay::TimerDelay;
pub use delay::{BlockingDelay, Pause};
pub use error::{Cancelled, Unhandled};
pub use policy::{RetryEvent, RetryPolicy};
pub use report::{AttemptOutcome, AttemptRecord, ExecutionReport, Status};
