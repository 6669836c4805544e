//! # Steadfast
//!
//! > *"Try, wait, try again, and write down what happened"*
//!
//! A Rust library for declarative retries.
//!
//! ## Philosophy
//!
//! **Steadfast** separates *deciding* from *doing*:
//! - **Policy** = pure data (which faults and values to retry, how often, how long to wait)
//! - **Execution** = the imperative shell (runs the operation, sleeps, observes cancellation)
//!
//! Every execution returns an [`ExecutionReport`]; expected failures are data,
//! not panics.
//!
//! ## Quick Example
//!
//! ```rust
//! use steadfast::{Fault, RetryPolicy, Status};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind {
//!     Busy,
//! }
//!
//! #[derive(Debug)]
//! struct Busy;
//!
//! impl Fault for Busy {
//!     type Kind = Kind;
//!     fn kind(&self) -> Kind {
//!         Kind::Busy
//!     }
//! }
//!
//! // Retry while busy, and also while the queue reports zero free slots.
//! let policy = RetryPolicy::<Busy, u32>::handle(Kind::Busy)
//!     .or_result(|free| *free == 0)
//!     .count(4)
//!     .interval([Duration::from_millis(1), Duration::from_millis(2)]);
//!
//! let mut polls = 0;
//! let report = policy.execute(
//!     || {
//!         polls += 1;
//!         match polls {
//!             1 => Err(Busy),
//!             2 => Ok(0),
//!             _ => Ok(8),
//!         }
//!     },
//!     &CancellationToken::new(),
//! );
//!
//! assert_eq!(report.status, Status::Success);
//! assert_eq!(report.result, Some(8));
//! assert_eq!(report.attempts.len(), 2);
//! ```
//!
//! For more, see `demos/retry_patterns.rs`.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;

// Re-exports
#[cfg(feature = "async")]
pub use retry::TimerDelay;
pub use retry::{
    AttemptOutcome, AttemptRecord, BackoffSchedule, BlockingDelay, Cancelled, ExecutionReport,
    Fault, FaultClassifier, Pause, PolicyConfig, ResultClassifier, RetryEvent, RetryPolicy,
    Status, Unhandled,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{ExecutionReport, Fault, RetryPolicy, Status, Unhandled};
    pub use tokio_util::sync::CancellationToken;
}
