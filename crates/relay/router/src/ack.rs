//! Acknowledgements for submitted operations.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use relay_types::{Reply, RouterError};
use tokio::sync::oneshot;

/// Outcome of a submitted operation, resolved once the consumer loop has
/// handled its envelope.
///
/// Awaiting is optional: dropping an `Ack` turns the submission into
/// fire-and-forget and the handler's result is discarded.
#[must_use = "dropping an Ack discards the operation's outcome"]
#[derive(Debug)]
pub struct Ack<T> {
    rx: oneshot::Receiver<Result<T, RouterError>>,
}

impl<T> Ack<T> {
    pub(crate) fn channel() -> (Reply<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Block the current thread until the outcome is known.
    ///
    /// For producers running on plain threads. Panics when called from
    /// within an async execution context.
    pub fn blocking_wait(self) -> Result<T, RouterError> {
        self.rx.blocking_recv().unwrap_or(Err(RouterError::AckDropped))
    }

    /// The outcome if the handler has already run.
    pub fn try_result(&mut self) -> Option<Result<T, RouterError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RouterError::AckDropped)),
        }
    }
}

impl<T> Future for Ack<T> {
    type Output = Result<T, RouterError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RouterError::AckDropped)))
    }
}
