//! Attempt history and execution reports.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::Unhandled;

/// Final status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// The operation completed and its value was accepted.
    #[default]
    Success,
    /// The execution stopped without an accepted value.
    Failure,
}

/// What an absorbed attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<F, T> {
    /// The attempt raised a retryable fault.
    Fault(F),
    /// The attempt returned a value the result classifier rejected.
    Rejected(T),
}

/// One absorbed attempt.
///
/// Only attempts that led to a retry are recorded. The attempt that ends an
/// execution (accepted value or unhandled fault) is reported through
/// [`ExecutionReport::result`] or [`ExecutionReport::unhandled`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord<F, T> {
    /// Zero-based attempt index.
    pub index: u32,
    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,
    /// The fault or rejected value.
    pub outcome: AttemptOutcome<F, T>,
}

impl<F, T> AttemptRecord<F, T> {
    /// Record an absorbed fault.
    pub fn fault(index: u32, fault: F) -> Self {
        Self {
            index,
            timestamp: Utc::now(),
            outcome: AttemptOutcome::Fault(fault),
        }
    }

    /// Record a rejected value.
    pub fn rejected(index: u32, value: T) -> Self {
        Self {
            index,
            timestamp: Utc::now(),
            outcome: AttemptOutcome::Rejected(value),
        }
    }

    /// The fault, if this attempt raised one.
    pub fn as_fault(&self) -> Option<&F> {
        match &self.outcome {
            AttemptOutcome::Fault(f) => Some(f),
            AttemptOutcome::Rejected(_) => None,
        }
    }

    /// The rejected value, if this attempt returned one.
    pub fn as_result(&self) -> Option<&T> {
        match &self.outcome {
            AttemptOutcome::Fault(_) => None,
            AttemptOutcome::Rejected(v) => Some(v),
        }
    }
}

/// Outcome of one execution of a retry policy.
///
/// Reports are returned, never raised. Branch on [`status`](Self::status) or
/// convert with [`into_result`](Self::into_result).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport<F, T> {
    /// Absorbed attempts in the order they happened.
    pub attempts: Vec<AttemptRecord<F, T>>,
    /// Wall time from the start of the execution to its end.
    pub elapsed: Duration,
    /// The policy's attempt limit at the time of execution.
    pub max_attempts: u32,
    /// Success or failure.
    pub status: Status,
    /// The accepted value. Present exactly when `status` is `Success`.
    pub result: Option<T>,
    /// Why the execution failed. Present exactly when `status` is `Failure`.
    pub unhandled: Option<Unhandled<F>>,
}

impl<F, T> ExecutionReport<F, T> {
    pub(crate) fn new(max_attempts: u32) -> Self {
        Self {
            attempts: Vec::new(),
            elapsed: Duration::ZERO,
            max_attempts,
            status: Status::Success,
            result: None,
            unhandled: None,
        }
    }

    pub(crate) fn succeed(&mut self, value: T) {
        self.status = Status::Success;
        self.result = Some(value);
        self.unhandled = None;
    }

    pub(crate) fn fail(&mut self, reason: Unhandled<F>) {
        self.status = Status::Failure;
        self.result = None;
        self.unhandled = Some(reason);
    }

    /// Returns true if the execution succeeded.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns true if the execution failed.
    pub fn is_failure(&self) -> bool {
        self.status == Status::Failure
    }

    /// Total number of times the operation ran.
    ///
    /// Absorbed attempts plus the final one, if the execution got that far.
    pub fn invocations(&self) -> u32 {
        let absorbed = self.attempts.len() as u32;
        match &self.unhandled {
            Some(Unhandled::Cancelled) | Some(Unhandled::Exhausted { .. }) => absorbed,
            Some(Unhandled::Fault(_)) | None => absorbed + 1,
        }
    }

    /// Iterate over the absorbed faults.
    pub fn faults(&self) -> impl Iterator<Item = &F> {
        self.attempts.iter().filter_map(AttemptRecord::as_fault)
    }

    /// Convert into a `Result`, discarding the history.
    pub fn into_result(self) -> Result<T, Unhandled<F>> {
        match (self.result, self.unhandled) {
            (Some(value), None) => Ok(value),
            (_, Some(reason)) => Err(reason),
            (None, None) => Err(Unhandled::Exhausted {
                attempts: self.attempts.len() as u32,
            }),
        }
    }
}
