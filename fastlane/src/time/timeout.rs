use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Error returned by [`timeout`] when the deadline passes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline has elapsed")]
pub struct Elapsed(());

/// Requires `future` to complete within `duration`.
///
/// The inner future is polled first on every wake-up, so a future that
/// becomes ready at the same moment as the deadline still wins.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use fastlane::time::{sleep, timeout};
///
/// let runtime = fastlane::RuntimeBuilder::new().build();
/// let result = runtime.block_on(timeout(
///     Duration::from_millis(5),
///     sleep(Duration::from_secs(5)),
/// ));
///
/// assert!(result.is_err());
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout::new(duration, future)
}

/// Future returned by [`timeout`].
#[derive(Debug)]
pub struct Timeout<F> {
    future: Pin<Box<F>>,
    sleep: Sleep,
}

impl<F> Timeout<F> {
    pub(crate) fn new(duration: Duration, future: F) -> Self {
        Timeout {
            future: Box::pin(future),
            sleep: sleep(duration),
        }
    }
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Poll::Ready(val) = this.future.as_mut().poll(cx) {
            return Poll::Ready(Ok(val));
        }

        if let Poll::Ready(()) = Pin::new(&mut this.sleep).poll(cx) {
            return Poll::Ready(Err(Elapsed(())));
        }

        Poll::Pending
    }
}
