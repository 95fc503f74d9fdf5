//! Event-loop primitives the coordinator is driven by.
//!
//! A [`Reactor`] watches sockets for readiness and runs one-shot timers.
//! Everything is single-threaded: callbacks run on the loop thread and may
//! freely call back into the reactor, including to unwatch the socket
//! currently being dispatched.

pub mod adapter;
pub mod manual;
#[cfg(unix)]
pub mod runtime;

pub use adapter::{DeadlineTimer, PollHandle};
pub use manual::ManualReactor;
#[cfg(unix)]
pub use runtime::TokioReactor;

use std::io;
use std::rc::Rc;
use std::time::Duration;

/// Native socket descriptor.
#[cfg(unix)]
pub type Socket = std::os::unix::io::RawFd;
/// Native socket descriptor.
#[cfg(windows)]
pub type Socket = std::os::windows::io::RawSocket;

/// Readiness a watch waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Wait until readable.
    Readable,
    /// Wait until writable.
    Writable,
    /// Wait for either direction.
    Both,
}

impl Interest {
    /// Whether readability is watched.
    pub fn is_readable(&self) -> bool {
        matches!(self, Interest::Readable | Interest::Both)
    }

    /// Whether writability is watched.
    pub fn is_writable(&self) -> bool {
        matches!(self, Interest::Writable | Interest::Both)
    }
}

/// Readiness reported for a watched socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    /// Data can be read.
    pub readable: bool,
    /// Data can be written.
    pub writable: bool,
    /// An error or hang-up was reported.
    pub error: bool,
}

impl Readiness {
    /// Only readable.
    pub const READABLE: Readiness = Readiness {
        readable: true,
        writable: false,
        error: false,
    };
    /// Only writable.
    pub const WRITABLE: Readiness = Readiness {
        readable: false,
        writable: true,
        error: false,
    };
    /// Only the error bit.
    pub const ERROR: Readiness = Readiness {
        readable: false,
        writable: false,
        error: true,
    };
}

/// Called on the loop thread each time a watched socket is ready.
pub type ReadyCallback = Rc<dyn Fn(Readiness)>;
/// Called once when a timer fires.
pub type TimerCallback = Rc<dyn Fn()>;

/// Identifies a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey(pub(crate) u64);

/// Socket readiness and one-shot timers for a single-threaded loop.
pub trait Reactor {
    /// Starts watching `socket`, or changes the interest of an existing
    /// watch. The new callback replaces the previous one.
    fn watch(&self, socket: Socket, interest: Interest, on_ready: ReadyCallback) -> io::Result<()>;

    /// Stops watching `socket`. Unknown sockets are ignored.
    fn unwatch(&self, socket: Socket) -> io::Result<()>;

    /// Runs `on_fire` once after `delay`.
    fn start_timer(&self, delay: Duration, on_fire: TimerCallback) -> io::Result<TimerKey>;

    /// Cancels a timer. Fired or unknown keys are ignored.
    fn stop_timer(&self, key: TimerKey);
}

impl<R: Reactor + ?Sized> Reactor for Rc<R> {
    fn watch(&self, socket: Socket, interest: Interest, on_ready: ReadyCallback) -> io::Result<()> {
        (**self).watch(socket, interest, on_ready)
    }

    fn unwatch(&self, socket: Socket) -> io::Result<()> {
        (**self).unwatch(socket)
    }

    fn start_timer(&self, delay: Duration, on_fire: TimerCallback) -> io::Result<TimerKey> {
        (**self).start_timer(delay, on_fire)
    }

    fn stop_timer(&self, key: TimerKey) {
        (**self).stop_timer(key)
    }
}
