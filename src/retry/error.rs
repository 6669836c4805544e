//! Error types for retry executions.

use thiserror::Error;

/// Why an execution ended without success.
///
/// Only [`Unhandled::Fault`] carries the original fault. The other variants
/// describe conditions detected by the engine itself.
///
/// # Examples
///
/// ```rust
/// use steadfast::Unhandled;
///
/// let exhausted: Unhandled<String> = Unhandled::Exhausted { attempts: 3 };
/// assert!(exhausted.is_exhausted());
/// assert_eq!(exhausted.to_string(), "maximum attempts reached (3)");
///
/// let fault = Unhandled::Fault("disk full".to_string());
/// assert_eq!(fault.into_fault(), Some("disk full".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unhandled<F> {
    /// A fault the policy does not handle. Execution stopped at once.
    #[error("unhandled fault: {0}")]
    Fault(F),
    /// The cancellation token fired before or between attempts.
    #[error("execution cancelled")]
    Cancelled,
    /// Every permitted attempt was absorbed without success.
    #[error("maximum attempts reached ({attempts})")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl<F> Unhandled<F> {
    /// Returns true if an unclassified fault stopped the execution.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Returns true if the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the attempts ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Get the propagated fault, if any.
    pub fn fault(&self) -> Option<&F> {
        match self {
            Self::Fault(f) => Some(f),
            _ => None,
        }
    }

    /// Extract the propagated fault, if any.
    pub fn into_fault(self) -> Option<F> {
        match self {
            Self::Fault(f) => Some(f),
            _ => None,
        }
    }

    /// Transform the fault, keeping the other variants.
    pub fn map_fault<G>(self, f: impl FnOnce(F) -> G) -> Unhandled<G> {
        match self {
            Self::Fault(fault) => Unhandled::Fault(f(fault)),
            Self::Cancelled => Unhandled::Cancelled,
            Self::Exhausted { attempts } => Unhandled::Exhausted { attempts },
        }
    }
}

/// A wait was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait interrupted by cancellation")]
pub struct Cancelled;

impl<F> From<Cancelled> for Unhandled<F> {
    fn from(_: Cancelled) -> Self {
        Unhandled::Cancelled
    }
}
