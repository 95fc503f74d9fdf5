use crate::http::accumulator::SharedAccumulator;
use crate::multi::future::Promise;
use crate::reactor::Socket;
use std::fmt;

/// Per-transfer attachments held while a transfer is registered: the socket
/// watch the engine asked for, the completion promise and the response
/// accumulator.
///
/// Each slot has exactly one owner. Completion and removal take the slots
/// out; after either, [`SideTable::is_empty`] holds.
#[derive(Default)]
pub struct SideTable {
    poll: Option<Socket>,
    promise: Option<Promise>,
    response: Option<SharedAccumulator>,
}

/// Slots taken out of a [`SideTable`] in one move.
pub(crate) struct Attachments {
    pub(crate) promise: Option<Promise>,
    pub(crate) response: Option<SharedAccumulator>,
}

impl SideTable {
    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.poll.is_none() && self.promise.is_none() && self.response.is_none()
    }

    /// Socket the engine last asked to watch for this transfer.
    pub fn poll(&self) -> Option<Socket> {
        self.poll
    }

    /// Whether a pending promise is attached.
    pub fn has_promise(&self) -> bool {
        self.promise.is_some()
    }

    /// Whether a response accumulator is attached.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub(crate) fn store_poll(&mut self, socket: Socket) {
        self.poll = Some(socket);
    }

    /// Drops the poll slot if it refers to `socket`.
    pub(crate) fn release_poll(&mut self, socket: Socket) {
        if self.poll == Some(socket) {
            self.poll = None;
        }
    }

    pub(crate) fn store_promise(&mut self, promise: Promise) {
        self.promise = Some(promise);
    }

    pub(crate) fn store_response(&mut self, response: SharedAccumulator) {
        self.response = Some(response);
    }

    pub(crate) fn take(&mut self) -> Attachments {
        self.poll = None;
        Attachments {
            promise: self.promise.take(),
            response: self.response.take(),
        }
    }
}

impl fmt::Debug for SideTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideTable")
            .field("poll", &self.poll)
            .field("promise", &self.promise.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}
