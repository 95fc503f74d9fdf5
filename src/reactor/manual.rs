//! A reactor driven by hand.
//!
//! Nothing happens on its own: the owner decides when sockets become ready
//! and when timers fire. Useful for deterministic tests and for embedding
//! the coordinator in a foreign event loop.

use crate::reactor::{Interest, Reactor, Readiness, ReadyCallback, Socket, TimerCallback, TimerKey};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::time::Duration;

/// Reactor whose sockets and timers are driven by the caller.
#[derive(Default)]
pub struct ManualReactor {
    state: RefCell<ManualState>,
}

#[derive(Default)]
struct ManualState {
    watches: HashMap<Socket, (Interest, ReadyCallback)>,
    timers: BTreeMap<TimerKey, (Duration, TimerCallback)>,
    next_key: u64,
    fail_timers: bool,
    fail_watches: bool,
}

impl ManualReactor {
    /// Creates a reactor with nothing watched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interest registered for `socket`.
    pub fn interest(&self, socket: Socket) -> Option<Interest> {
        self.state.borrow().watches.get(&socket).map(|(i, _)| *i)
    }

    /// Watched sockets in ascending order.
    pub fn watched_sockets(&self) -> Vec<Socket> {
        let mut sockets: Vec<_> = self.state.borrow().watches.keys().copied().collect();
        sockets.sort_unstable();
        sockets
    }

    /// Delays of the timers that have not fired yet, oldest first.
    pub fn pending_timers(&self) -> Vec<Duration> {
        self.state.borrow().timers.values().map(|(d, _)| *d).collect()
    }

    /// Makes `start_timer` fail until turned off again.
    pub fn fail_timers(&self, fail: bool) {
        self.state.borrow_mut().fail_timers = fail;
    }

    /// Makes `watch` fail until turned off again.
    pub fn fail_watches(&self, fail: bool) {
        self.state.borrow_mut().fail_watches = fail;
    }

    /// Delivers `readiness` to the watcher of `socket`. Returns whether a
    /// watcher was registered.
    pub fn ready(&self, socket: Socket, readiness: Readiness) -> bool {
        let callback = self
            .state
            .borrow()
            .watches
            .get(&socket)
            .map(|(_, cb)| cb.clone());
        match callback {
            Some(callback) => {
                callback(readiness);
                true
            }
            None => false,
        }
    }

    /// Fires every pending timer in start order. Timers started by the
    /// callbacks stay pending for the next call. Returns how many fired.
    pub fn fire_timers(&self) -> usize {
        let due = std::mem::take(&mut self.state.borrow_mut().timers);
        let count = due.len();
        for (_, (_, callback)) in due {
            callback();
        }
        count
    }
}

impl Reactor for ManualReactor {
    fn watch(&self, socket: Socket, interest: Interest, on_ready: ReadyCallback) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_watches {
            return Err(io::Error::new(io::ErrorKind::Other, "watch refused"));
        }
        state.watches.insert(socket, (interest, on_ready));
        Ok(())
    }

    fn unwatch(&self, socket: Socket) -> io::Result<()> {
        self.state.borrow_mut().watches.remove(&socket);
        Ok(())
    }

    fn start_timer(&self, delay: Duration, on_fire: TimerCallback) -> io::Result<TimerKey> {
        let mut state = self.state.borrow_mut();
        if state.fail_timers {
            return Err(io::Error::new(io::ErrorKind::Other, "timer refused"));
        }
        state.next_key += 1;
        let key = TimerKey(state.next_key);
        state.timers.insert(key, (delay, on_fire));
        Ok(key)
    }

    fn stop_timer(&self, key: TimerKey) {
        self.state.borrow_mut().timers.remove(&key);
    }
}
