//! Explicit backoff schedules.

use std::time::Duration;

/// Ordered list of waits applied between attempts.
///
/// `delay(i)` is the wait before attempt `i + 1`. Once the schedule runs out
/// its last entry repeats forever. A schedule is never empty.
///
/// # Examples
///
/// ```rust
/// use steadfast::BackoffSchedule;
/// use std::time::Duration;
///
/// let schedule = BackoffSchedule::new([
///     Duration::from_millis(10),
///     Duration::from_millis(20),
/// ])
/// .unwrap();
///
/// assert_eq!(schedule.delay(0), Duration::from_millis(10));
/// assert_eq!(schedule.delay(1), Duration::from_millis(20));
/// assert_eq!(schedule.delay(7), Duration::from_millis(20)); // last repeats
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    /// Build a schedule from `delays`.
    ///
    /// Returns `None` if `delays` is empty.
    pub fn new<I>(delays: I) -> Option<Self>
    where
        I: IntoIterator<Item = Duration>,
    {
        let delays: Vec<Duration> = delays.into_iter().collect();
        if delays.is_empty() {
            None
        } else {
            Some(Self { delays })
        }
    }

    /// A schedule that always waits `delay`.
    pub fn constant(delay: Duration) -> Self {
        Self {
            delays: vec![delay],
        }
    }

    /// Wait to apply after the attempt with index `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let last = self.delays.len() - 1;
        let i = usize::try_from(attempt).map_or(last, |i| i.min(last));
        self.delays[i]
    }

    /// The configured entries, in order.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Sum of the waits that follow `attempts` absorbed attempts.
    ///
    /// This is the minimum time an execution that absorbs every attempt spends
    /// sleeping.
    pub fn total(&self, attempts: u32) -> Duration {
        (0..attempts)
            .map(|i| self.delay(i))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::constant(Duration::from_secs(1))
    }
}
