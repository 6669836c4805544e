//! Fault and result classification.
//!
//! A [`FaultClassifier`] decides whether a fault is worth another attempt, and a
//! [`ResultClassifier`] decides whether a value that was returned successfully
//! should nonetheless be retried.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A fault that can be classified by kind.
///
/// The kind is a stable discriminator for a family of faults. Classification
/// matches kinds exactly: declaring a kind never covers any other kind, even a
/// "related" one.
///
/// # Example
///
/// ```rust
/// use steadfast::Fault;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum IoKind {
///     Timeout,
///     Refused,
/// }
///
/// #[derive(Debug)]
/// enum IoFault {
///     Timeout { after_ms: u64 },
///     Refused(String),
/// }
///
/// impl Fault for IoFault {
///     type Kind = IoKind;
///
///     fn kind(&self) -> IoKind {
///         match self {
///             IoFault::Timeout { .. } => IoKind::Timeout,
///             IoFault::Refused(_) => IoKind::Refused,
///         }
///     }
/// }
///
/// assert_eq!(IoFault::Timeout { after_ms: 10 }.kind(), IoKind::Timeout);
/// ```
pub trait Fault {
    /// Discriminator identifying the family this fault belongs to.
    type Kind: Eq + Hash + Clone + fmt::Debug;

    /// The exact kind of this fault.
    fn kind(&self) -> Self::Kind;
}

/// Refinement predicate over a fault.
pub type FaultPredicate<F> = Arc<dyn Fn(&F) -> bool + Send + Sync>;

/// Predicate over a produced value; `true` means "retry".
pub type ResultPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Registry of retryable fault kinds.
///
/// Each kind has at most one entry. Declaring a kind a second time replaces
/// the earlier entry, predicate included.
///
/// # Example
///
/// ```rust
/// use steadfast::{Fault, FaultClassifier};
///
/// #[derive(Debug)]
/// struct Status(u16);
///
/// impl Fault for Status {
///     type Kind = &'static str;
///     fn kind(&self) -> &'static str {
///         "http"
///     }
/// }
///
/// let mut faults = FaultClassifier::new();
/// faults.declare_if("http", |s: &Status| s.0 >= 500);
///
/// assert!(faults.should_retry(&Status(503)));
/// assert!(!faults.should_retry(&Status(404)));
/// ```
pub struct FaultClassifier<F: Fault> {
    entries: HashMap<F::Kind, Option<FaultPredicate<F>>>,
}

impl<F: Fault> FaultClassifier<F> {
    /// Create an empty classifier that retries nothing.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register every fault of `kind` as retryable.
    ///
    /// Overwrites any previous declaration for the same kind.
    pub fn declare(&mut self, kind: F::Kind) {
        self.entries.insert(kind, None);
    }

    /// Register faults of `kind` as retryable when `predicate` accepts them.
    ///
    /// Overwrites any previous declaration for the same kind.
    pub fn declare_if<P>(&mut self, kind: F::Kind, predicate: P)
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.entries.insert(kind, Some(Arc::new(predicate)));
    }

    /// Decide whether `fault` should be retried.
    ///
    /// Unknown kinds are never retried. A known kind without a predicate is
    /// always retried.
    pub fn should_retry(&self, fault: &F) -> bool {
        match self.entries.get(&fault.kind()) {
            None => false,
            Some(None) => true,
            Some(Some(predicate)) => predicate(fault),
        }
    }

    /// Whether an entry exists for exactly this kind.
    pub fn handles(&self, kind: &F::Kind) -> bool {
        self.entries.contains_key(kind)
    }

    /// Number of declared kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kind has been declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Fault> Default for FaultClassifier<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fault> Clone for FaultClassifier<F> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<F: Fault> fmt::Debug for FaultClassifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, predicate) in &self.entries {
            map.entry(kind, &predicate.as_ref().map(|_| "<predicate>"));
        }
        map.finish()
    }
}

/// Ordered list of result predicates.
///
/// A value is retried if any predicate accepts it. Predicates run in
/// declaration order and stop at the first match. Duplicates are kept.
pub struct ResultClassifier<T> {
    predicates: Vec<ResultPredicate<T>>,
}

impl<T> ResultClassifier<T> {
    /// Create an empty classifier that never retries a value.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Append a predicate.
    pub fn declare<P>(&mut self, predicate: P)
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
    }

    /// Returns true if any declared predicate asks for a retry.
    pub fn should_retry(&self, value: &T) -> bool {
        self.predicates.iter().any(|p| p(value))
    }

    /// Number of declared predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns true if no predicate has been declared.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<T> Default for ResultClassifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ResultClassifier<T> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
        }
    }
}

impl<T> fmt::Debug for ResultClassifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultClassifier")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}
