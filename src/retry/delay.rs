//! Cancelable delays between attempts.
//!
//! The engine never sleeps directly. It asks a [`Pause`] implementation to
//! wait, and the pause decides how: [`BlockingDelay`] parks the calling thread,
//! [`TimerDelay`] yields to the tokio timer. Both return early with
//! [`Cancelled`] as soon as the token fires.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use futures::task::ArcWake;
use tokio_util::sync::CancellationToken;

use super::error::Cancelled;

/// A wait capability that can be interrupted by cancellation.
#[allow(async_fn_in_trait)]
pub trait Pause {
    /// Wait for `delay`, or until `token` is cancelled, whichever comes first.
    ///
    /// Returns `Err(Cancelled)` if the token fired before the delay elapsed.
    async fn pause(&mut self, delay: Duration, token: &CancellationToken) -> Result<(), Cancelled>;
}

/// Blocks the calling thread for each wait.
///
/// The thread is parked until the deadline passes or the token is cancelled.
/// Cancellation from another thread unparks it immediately.
///
/// Use this only where blocking is acceptable; inside an async runtime prefer
/// [`TimerDelay`].
///
/// # Example
///
/// ```rust
/// use steadfast::{BlockingDelay, Pause};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let mut delay = BlockingDelay::new();
/// let waited = futures::executor::block_on(delay.pause(Duration::from_secs(60), &token));
/// assert!(waited.is_err());
/// ```
#[derive(Debug, Default)]
pub struct BlockingDelay {
    waker: Option<Waker>,
}

impl BlockingDelay {
    /// Create a delay bound to whichever thread first waits on it.
    pub fn new() -> Self {
        Self { waker: None }
    }

    fn wait(&mut self, delay: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        if delay.is_zero() {
            return Ok(());
        }

        let waker = self
            .waker
            .get_or_insert_with(|| futures::task::waker(Arc::new(Unparker(thread::current()))));
        let mut cx = Context::from_waker(waker);

        let deadline = Instant::now().checked_add(delay);
        let mut cancelled = std::pin::pin!(token.cancelled());

        loop {
            if let Poll::Ready(()) = cancelled.as_mut().poll(&mut cx) {
                return Err(Cancelled);
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    thread::park_timeout(deadline - now);
                }
                // Too far in the future to represent; wait for cancellation.
                None => thread::park(),
            }
        }
    }
}

impl Pause for BlockingDelay {
    async fn pause(&mut self, delay: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
        self.wait(delay, token)
    }
}

/// Drive `future` to completion on the calling thread.
///
/// The thread is parked whenever the future is pending and unparked by its
/// waker. No executor guard is taken, so a blocking execution can run inside
/// another one, or inside any other executor's `block_on`.
pub(crate) fn drive<Fut: Future>(future: Fut) -> Fut::Output {
    let waker = futures::task::waker(Arc::new(Unparker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
        thread::park();
    }
}

struct Unparker(Thread);

impl ArcWake for Unparker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

/// Suspends the calling task on the tokio timer for each wait.
///
/// No worker thread is held while waiting.
#[cfg(feature = "async")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerDelay;

#[cfg(feature = "async")]
impl Pause for TimerDelay {
    async fn pause(&mut self, delay: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            () = token.cancelled() => Err(Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod delay_tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_blocking_delay_waits_full_duration() {
        let token = CancellationToken::new();
        let mut delay = BlockingDelay::new();

        let start = Instant::now();
        let result = block_on(delay.pause(Duration::from_millis(20), &token));

        assert_eq!(result, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_blocking_delay_returns_at_once_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let mut delay = BlockingDelay::new();

        let start = Instant::now();
        let result = block_on(delay.pause(Duration::from_secs(10), &token));

        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_blocking_delay_interrupted_from_another_thread() {
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                token.cancel();
            })
        };

        let mut delay = BlockingDelay::new();
        let start = Instant::now();
        let result = block_on(delay.pause(Duration::from_secs(10), &token));

        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();
    }

    #[test]
    fn test_drive_runs_inside_another_executor() {
        let token = CancellationToken::new();

        let result = block_on(async {
            drive(async {
                let mut delay = BlockingDelay::new();
                delay.pause(Duration::from_millis(1), &token).await
            })
        });

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_drive_waits_for_wakeup_from_another_thread() {
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                token.cancel();
            })
        };

        drive(token.cancelled());

        assert!(token.is_cancelled());
        canceller.join().unwrap();
    }

    #[test]
    fn test_blocking_delay_zero_does_not_park() {
        let token = CancellationToken::new();
        let mut delay = BlockingDelay::new();
        assert_eq!(block_on(delay.pause(Duration::ZERO, &token)), Ok(()));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timer_delay_waits_full_duration() {
        let token = CancellationToken::new();
        let start = Instant::now();

        let result = TimerDelay.pause(Duration::from_millis(20), &token).await;

        assert_eq!(result, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timer_delay_interrupted_by_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = TimerDelay.pause(Duration::from_secs(10), &token).await;

        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
