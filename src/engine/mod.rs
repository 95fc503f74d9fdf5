//! The transfer-engine contract.
//!
//! An engine owns the protocol work for many concurrent transfers and is
//! driven from outside: it reports which sockets it wants watched and when
//! it next wants to be woken, and the caller steps it when a socket becomes
//! ready or the deadline passes. Finished transfers are reported as
//! completion messages.

#[cfg(all(feature = "curl", unix))]
pub mod curl;
pub mod io;

pub use io::TransferIo;

use crate::base::error::Error;
use crate::base::neterror::NetError;
use crate::reactor::{Interest, Readiness, Socket};
use crate::transfer::{OptionCode, OptionValue, TransferId, TransferInfo};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::BitOr;
use std::rc::Rc;

/// Socket interest change requested by the engine. Raw codes follow the
/// engine's poll constants (`IN=1`, `OUT=2`, `INOUT=3`, `REMOVE=4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketAction {
    /// Watch for readability.
    In,
    /// Watch for writability.
    Out,
    /// Watch for both directions.
    InOut,
    /// Stop watching the socket.
    Remove,
}

impl SocketAction {
    /// Parses a raw poll code. Unknown codes are an integration error.
    pub fn from_raw(code: i32) -> Result<Self, Error> {
        match code {
            1 => Ok(SocketAction::In),
            2 => Ok(SocketAction::Out),
            3 => Ok(SocketAction::InOut),
            4 => Ok(SocketAction::Remove),
            other => Err(Error::UnknownSocketAction(other)),
        }
    }

    /// The raw poll code.
    pub fn as_raw(&self) -> i32 {
        match self {
            SocketAction::In => 1,
            SocketAction::Out => 2,
            SocketAction::InOut => 3,
            SocketAction::Remove => 4,
        }
    }

    /// Reactor interest for watch actions; `None` for [`SocketAction::Remove`].
    pub fn interest(&self) -> Option<Interest> {
        match self {
            SocketAction::In => Some(Interest::Readable),
            SocketAction::Out => Some(Interest::Writable),
            SocketAction::InOut => Some(Interest::Both),
            SocketAction::Remove => None,
        }
    }
}

/// Readiness bits passed to a step (`IN=1`, `OUT=2`, `ERR=4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct EventFlags(u8);

impl EventFlags {
    /// The socket is readable.
    pub const IN: EventFlags = EventFlags(1);
    /// The socket is writable.
    pub const OUT: EventFlags = EventFlags(2);
    /// The socket reported an error, or the timer could not be started.
    pub const ERR: EventFlags = EventFlags(4);

    /// No readiness bits; used for plain timeout steps.
    pub const fn empty() -> Self {
        EventFlags(0)
    }

    /// Whether every bit of `other` is set.
    pub fn contains(&self, other: EventFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Raw bit value.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for EventFlags {
    type Output = EventFlags;

    fn bitor(self, rhs: EventFlags) -> EventFlags {
        EventFlags(self.0 | rhs.0)
    }
}

impl From<Readiness> for EventFlags {
    fn from(ready: Readiness) -> Self {
        let mut flags = EventFlags::empty();
        if ready.readable {
            flags = flags | EventFlags::IN;
        }
        if ready.writable {
            flags = flags | EventFlags::OUT;
        }
        if ready.error {
            flags = flags | EventFlags::ERR;
        }
        flags
    }
}

/// What a step is about: activity on one socket, or the engine's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Socket(Socket),
    Timeout,
}

/// Deadline change requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Wake after this many milliseconds; `<= 0` means as soon as possible.
    After(i64),
    Clear,
}

#[derive(Debug)]
pub(crate) enum EngineEvent {
    Socket {
        socket: Socket,
        action: SocketAction,
        owner: Option<TransferId>,
    },
    Timer(TimerRequest),
    Fault(Error),
}

/// Sink for the engine's socket-interest and timer-deadline callbacks.
///
/// Requests are queued, not acted upon, while the engine is inside one of
/// its own calls; the coordinator applies them once the call returns.
#[derive(Clone, Default)]
pub struct EngineNotifier {
    queue: Rc<RefCell<VecDeque<EngineEvent>>>,
}

impl EngineNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Socket-interest callback. `action` is the engine's raw poll code;
    /// `owner` is the transfer the socket belongs to, when known.
    ///
    /// Returns `0` on success and `-1` for an unrecognized action, which
    /// the engine treats as a callback failure. The fault itself is
    /// reported to the coordinator's caller as well.
    pub fn socket_changed(&self, socket: Socket, action: i32, owner: Option<TransferId>) -> i32 {
        let event = match SocketAction::from_raw(action) {
            Ok(action) => EngineEvent::Socket {
                socket,
                action,
                owner,
            },
            Err(err) => {
                tracing::error!(socket, action, "engine requested unknown socket action");
                self.queue.borrow_mut().push_back(EngineEvent::Fault(err));
                return -1;
            }
        };
        self.queue.borrow_mut().push_back(event);
        0
    }

    /// Timer-deadline callback.
    pub fn set_timer(&self, timeout_ms: i64) {
        self.queue
            .borrow_mut()
            .push_back(EngineEvent::Timer(TimerRequest::After(timeout_ms)));
    }

    /// Timer-deadline callback asking to remove the pending deadline.
    pub fn clear_timer(&self) {
        self.queue
            .borrow_mut()
            .push_back(EngineEvent::Timer(TimerRequest::Clear));
    }

    pub(crate) fn pop(&self) -> Option<EngineEvent> {
        self.queue.borrow_mut().pop_front()
    }

    /// Number of requests not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// A transfer the engine has finished with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionMessage {
    pub id: TransferId,
    pub result: Result<(), NetError>,
}

/// Everything an engine needs to start a transfer.
#[derive(Debug)]
pub struct EasyRequest {
    pub options: Vec<(OptionCode, OptionValue)>,
    pub io: TransferIo,
}

/// What an engine hands back when a transfer is detached from it.
#[derive(Debug, Clone, Default)]
pub struct Detached {
    pub info: TransferInfo,
    /// Contents of the engine's error buffer; empty when none was written.
    pub error_description: String,
}

/// A multi-transfer engine driven by socket readiness and a single deadline.
///
/// Implementations must not call back into the coordinator; they report
/// interest and deadline changes through the [`EngineNotifier`] handed to
/// [`TransferEngine::install_callbacks`].
pub trait TransferEngine {
    /// Binds the engine's socket-interest and timer-deadline callbacks.
    /// Called once, before any transfer is added.
    fn install_callbacks(&mut self, notifier: EngineNotifier) -> Result<(), Error>;

    fn add(&mut self, id: TransferId, request: EasyRequest) -> Result<(), Error>;

    fn remove(&mut self, id: TransferId) -> Result<Detached, Error>;

    /// Advances the engine for `target`. Returns the number of transfers
    /// still running.
    fn socket_action(&mut self, target: ActionTarget, flags: EventFlags) -> Result<usize, Error>;

    /// Pops the next queued completion message.
    fn next_message(&mut self) -> Option<CompletionMessage>;

    fn version(&self) -> String {
        String::from("unknown")
    }
}
