//! Glue between engine requests and reactor registrations.

use crate::base::context::ReactorResultExt;
use crate::base::error::Error;
use crate::reactor::{Interest, Reactor, ReadyCallback, Socket, TimerCallback, TimerKey};
use std::time::Duration;

/// Reactor watch for one engine socket.
#[derive(Debug)]
pub struct PollHandle {
    socket: Socket,
    interest: Option<Interest>,
}

impl PollHandle {
    /// A handle for `socket` that is not watched yet.
    pub fn new(socket: Socket) -> Self {
        Self {
            socket,
            interest: None,
        }
    }

    /// The watched socket.
    pub fn socket(&self) -> Socket {
        self.socket
    }

    /// Interest currently registered, if any.
    pub fn interest(&self) -> Option<Interest> {
        self.interest
    }

    /// Watches for `interest`; re-registering with the interest already in
    /// effect is a no-op.
    pub fn start<R: Reactor + ?Sized>(
        &mut self,
        reactor: &R,
        interest: Interest,
        on_ready: ReadyCallback,
    ) -> Result<(), Error> {
        if self.interest == Some(interest) {
            return Ok(());
        }
        reactor
            .watch(self.socket, interest, on_ready)
            .reactor_context("watch socket")?;
        self.interest = Some(interest);
        Ok(())
    }

    /// Unwatches the socket if it is watched.
    pub fn stop<R: Reactor + ?Sized>(&mut self, reactor: &R) -> Result<(), Error> {
        if self.interest.take().is_some() {
            reactor.unwatch(self.socket).reactor_context("unwatch socket")?;
        }
        Ok(())
    }
}

/// The coordinator's single engine deadline. Scheduling always replaces the
/// running timer.
#[derive(Debug)]
pub struct DeadlineTimer {
    key: Option<TimerKey>,
    floor: Duration,
}

impl DeadlineTimer {
    /// A disarmed timer that raises non-positive deadlines to `floor`.
    pub fn new(floor: Duration) -> Self {
        Self { key: None, floor }
    }

    /// Whether a timer is running.
    pub fn is_armed(&self) -> bool {
        self.key.is_some()
    }

    /// Delay actually used for an engine request of `timeout_ms`.
    /// Non-positive requests are raised to the floor so the timeout step
    /// never runs from inside the call that asked for it.
    pub fn delay_for(&self, timeout_ms: i64) -> Duration {
        match u64::try_from(timeout_ms) {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => self.floor,
        }
    }

    /// Replaces the running timer with one for `timeout_ms` and returns the delay used.
    pub fn schedule<R: Reactor + ?Sized>(
        &mut self,
        reactor: &R,
        timeout_ms: i64,
        on_fire: TimerCallback,
    ) -> Result<Duration, Error> {
        self.stop(reactor);
        let delay = self.delay_for(timeout_ms);
        let key = reactor
            .start_timer(delay, on_fire)
            .reactor_context("start timer")?;
        self.key = Some(key);
        Ok(delay)
    }

    /// Cancels the running timer, if any.
    pub fn stop<R: Reactor + ?Sized>(&mut self, reactor: &R) {
        if let Some(key) = self.key.take() {
            reactor.stop_timer(key);
        }
    }

    /// Forgets the running timer after it has fired.
    pub fn fired(&mut self) {
        self.key = None;
    }
}
