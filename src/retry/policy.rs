//! Retry policy builder and execution entry points.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::backoff::BackoffSchedule;
use super::classifier::{Fault, FaultClassifier, ResultClassifier};
use super::config::PolicyConfig;
use super::delay::{self, BlockingDelay, Pause};
use super::engine;
use super::report::{AttemptRecord, ExecutionReport};

/// Information about an absorbed attempt, passed to hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, F, T> {
    /// Which attempt was just absorbed (1-indexed).
    pub attempt: u32,
    /// The fault or rejected value the attempt produced.
    pub record: &'a AttemptRecord<F, T>,
    /// Wait that follows this attempt.
    ///
    /// The last permitted attempt is followed by its wait too, before the
    /// execution reports exhaustion.
    pub next_delay: Duration,
    /// Time elapsed since the execution started.
    pub elapsed: Duration,
}

type Hook<F, T> = Arc<dyn Fn(&RetryEvent<'_, F, T>) + Send + Sync>;

/// A declarative retry policy.
///
/// A policy collects which faults to retry, which returned values to retry,
/// how many attempts to make and how long to wait between them. It is built
/// once with fluent calls and can then be executed any number of times.
///
/// `T` is the value the operation produces. Leave it as `()` for operations
/// that produce nothing.
///
/// | Shape                       | Call                                   |
/// |-----------------------------|----------------------------------------|
/// | blocking, value-less        | `RetryPolicy<F>::execute`              |
/// | blocking, value-producing   | `RetryPolicy<F, T>::execute`           |
/// | async, value-less           | `RetryPolicy<F>::execute_async`        |
/// | async, value-producing      | `RetryPolicy<F, T>::execute_async`     |
///
/// # Defaults
///
/// One attempt, and a one-second wait after each retried attempt.
///
/// # Examples
///
/// ```rust
/// use steadfast::{Fault, RetryPolicy, Status};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind {
///     Timeout,
/// }
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl Fault for Timeout {
///     type Kind = Kind;
///     fn kind(&self) -> Kind {
///         Kind::Timeout
///     }
/// }
///
/// let policy = RetryPolicy::<Timeout, i32>::handle(Kind::Timeout)
///     .count(3)
///     .interval([Duration::from_millis(1)]);
///
/// let mut calls = 0;
/// let report = policy.execute(
///     || {
///         calls += 1;
///         if calls < 3 { Err(Timeout) } else { Ok(42) }
///     },
///     &CancellationToken::new(),
/// );
///
/// assert_eq!(report.status, Status::Success);
/// assert_eq!(report.result, Some(42));
/// assert_eq!(report.attempts.len(), 2);
/// ```
pub struct RetryPolicy<F: Fault, T = ()> {
    faults: FaultClassifier<F>,
    results: ResultClassifier<T>,
    max_attempts: u32,
    backoff: BackoffSchedule,
    hooks: Vec<Hook<F, T>>,
}

impl<F: Fault, T> RetryPolicy<F, T> {
    fn empty() -> Self {
        Self {
            faults: FaultClassifier::new(),
            results: ResultClassifier::new(),
            max_attempts: 1,
            backoff: BackoffSchedule::default(),
            hooks: Vec::new(),
        }
    }

    /// Start a policy that retries every fault of `kind`.
    pub fn handle(kind: F::Kind) -> Self {
        Self::empty().or_handle(kind)
    }

    /// Start a policy that retries faults of `kind` accepted by `predicate`.
    pub fn handle_if<P>(kind: F::Kind, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        Self::empty().or_handle_if(kind, predicate)
    }

    /// Start a policy that retries returned values accepted by `predicate`.
    ///
    /// No fault kind is handled until one is added with
    /// [`or_handle`](Self::or_handle).
    ///
    /// Only value-producing policies take result predicates. On a value-less
    /// policy (or any zero-sized `T`) the call is rejected at compile time:
    ///
    /// ```rust,compile_fail
    /// use steadfast::{Fault, RetryPolicy};
    ///
    /// #[derive(Debug)]
    /// struct Busy;
    /// impl Fault for Busy {
    ///     type Kind = ();
    ///     fn kind(&self) {}
    /// }
    ///
    /// let policy = RetryPolicy::<Busy>::result(|_| true);
    /// # let _ = policy;
    /// ```
    pub fn result<P>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::empty().or_result(predicate)
    }

    /// Also retry every fault of `kind`.
    ///
    /// Replaces any earlier declaration for the same kind.
    pub fn or_handle(mut self, kind: F::Kind) -> Self {
        self.faults.declare(kind);
        self
    }

    /// Also retry faults of `kind` accepted by `predicate`.
    ///
    /// Replaces any earlier declaration for the same kind.
    pub fn or_handle_if<P>(mut self, kind: F::Kind, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.faults.declare_if(kind, predicate);
        self
    }

    /// Also retry returned values accepted by `predicate`.
    ///
    /// Rejected at compile time on value-less policies, which never record a
    /// returned value:
    ///
    /// ```rust,compile_fail
    /// use steadfast::{Fault, RetryPolicy};
    ///
    /// #[derive(Debug)]
    /// struct Busy;
    /// impl Fault for Busy {
    ///     type Kind = ();
    ///     fn kind(&self) {}
    /// }
    ///
    /// let policy = RetryPolicy::<Busy>::handle(()).or_result(|_| true);
    /// # let _ = policy;
    /// ```
    pub fn or_result<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        const {
            assert!(
                std::mem::size_of::<T>() != 0,
                "result predicates need a value-producing policy"
            )
        };
        self.results.declare(predicate);
        self
    }

    /// Set the maximum number of attempts, the first one included.
    ///
    /// Zero is raised to one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::{Fault, RetryPolicy};
    ///
    /// #[derive(Debug)]
    /// struct Busy;
    /// impl Fault for Busy {
    ///     type Kind = ();
    ///     fn kind(&self) {}
    /// }
    ///
    /// assert_eq!(RetryPolicy::<Busy>::handle(()).count(0).max_attempts(), 1);
    /// assert_eq!(RetryPolicy::<Busy>::handle(()).count(5).max_attempts(), 5);
    /// ```
    pub fn count(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Replace the backoff schedule.
    ///
    /// The i-th delay is waited after the i-th attempt; the last delay repeats.
    /// An empty list leaves the current schedule in place.
    pub fn interval<I>(mut self, delays: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        if let Some(schedule) = BackoffSchedule::new(delays) {
            self.backoff = schedule;
        }
        self
    }

    /// Register a hook called each time an attempt is absorbed, before the
    /// backoff wait.
    ///
    /// Hooks run synchronously on the executing thread and should not block.
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, F, T>) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Take the attempt count and backoff schedule from `config`.
    pub fn apply(self, config: &PolicyConfig) -> Self {
        self.count(config.max_attempts)
            .interval(config.intervals.iter().copied())
    }

    /// Snapshot of the attempt count and backoff schedule.
    pub fn config(&self) -> PolicyConfig {
        PolicyConfig {
            max_attempts: self.max_attempts,
            intervals: self.backoff.delays().to_vec(),
        }
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The backoff schedule.
    pub fn backoff(&self) -> &BackoffSchedule {
        &self.backoff
    }

    /// The fault classifier.
    pub fn faults(&self) -> &FaultClassifier<F> {
        &self.faults
    }

    /// The result classifier.
    pub fn results(&self) -> &ResultClassifier<T> {
        &self.results
    }

    pub(crate) fn notify(&self, event: &RetryEvent<'_, F, T>) {
        for hook in &self.hooks {
            hook(event);
        }
    }

    /// Run `operation` under this policy, blocking the calling thread.
    ///
    /// Waits after retried attempts park the thread and end early if `token`
    /// is cancelled. The report is always returned; expected failures never
    /// panic. The operation may itself run another blocking execution.
    pub fn execute<Op>(&self, mut operation: Op, token: &CancellationToken) -> ExecutionReport<F, T>
    where
        Op: FnMut() -> Result<T, F>,
    {
        delay::drive(engine::run(
            self,
            move || std::future::ready(operation()),
            token,
            BlockingDelay::new(),
        ))
    }

    /// Run an async `operation` under this policy.
    ///
    /// Waits after retried attempts suspend the task on the tokio timer and end
    /// early if `token` is cancelled. Must be polled within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```rust
    /// use steadfast::{Fault, RetryPolicy};
    /// use std::time::Duration;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// #[derive(Debug)]
    /// struct Unavailable;
    /// impl Fault for Unavailable {
    ///     type Kind = &'static str;
    ///     fn kind(&self) -> &'static str {
    ///         "unavailable"
    ///     }
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let policy = RetryPolicy::<Unavailable>::handle("unavailable")
    ///     .count(2)
    ///     .interval([Duration::from_millis(1)]);
    ///
    /// let report = policy
    ///     .execute_async(|| async { Ok(()) }, &CancellationToken::new())
    ///     .await;
    ///
    /// assert!(report.is_success());
    /// # });
    /// ```
    #[cfg(feature = "async")]
    pub async fn execute_async<Op, Fut>(
        &self,
        operation: Op,
        token: &CancellationToken,
    ) -> ExecutionReport<F, T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, F>>,
    {
        engine::run(self, operation, token, super::delay::TimerDelay).await
    }

    /// Run an async `operation`, waiting after retried attempts with `pause`.
    pub async fn execute_with<Op, Fut, P>(
        &self,
        pause: P,
        operation: Op,
        token: &CancellationToken,
    ) -> ExecutionReport<F, T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, F>>,
        P: Pause,
    {
        engine::run(self, operation, token, pause).await
    }
}

impl<F: Fault, T> Clone for RetryPolicy<F, T> {
    fn clone(&self) -> Self {
        Self {
            faults: self.faults.clone(),
            results: self.results.clone(),
            max_attempts: self.max_attempts,
            backoff: self.backoff.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<F: Fault, T> fmt::Debug for RetryPolicy<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("faults", &self.faults)
            .field("results", &self.results)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
