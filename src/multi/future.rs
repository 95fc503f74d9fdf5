use crate::base::error::Error;
use crate::http::Response;
use crate::transfer::TransferId;
use futures::future::FusedFuture;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// What a transfer resolves to.
pub type Outcome = Result<Response, Error>;

/// Single-resolution completion slot for one transfer.
pub(crate) enum Promise {
    Channel(oneshot::Sender<Outcome>),
    Callback(Box<dyn FnOnce(Outcome)>),
}

impl Promise {
    /// Resolves the promise. Returns `false` if nobody was listening.
    pub(crate) fn resolve(self, outcome: Outcome) -> bool {
        match self {
            Promise::Channel(tx) => tx.send(outcome).is_ok(),
            Promise::Callback(f) => {
                f(outcome);
                true
            }
        }
    }
}

/// Resolves once with the transfer's response or error.
///
/// If the coordinator goes away without resolving it, the future yields
/// [`Error::Cancelled`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct ResponseFuture {
    id: TransferId,
    rx: oneshot::Receiver<Outcome>,
    done: bool,
}

impl ResponseFuture {
    pub(crate) fn new(id: TransferId, rx: oneshot::Receiver<Outcome>) -> Self {
        Self { id, rx, done: false }
    }

    /// The transfer this future belongs to.
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Takes the outcome without waiting, if it is already available.
    pub fn try_take(&mut self) -> Option<Outcome> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.done = true;
                Some(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.done = true;
                Some(Err(Error::Cancelled))
            }
        }
    }
}

impl Future for ResponseFuture {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                this.done = true;
                Poll::Ready(result.unwrap_or(Err(Error::Cancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedFuture for ResponseFuture {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
