//! Reactor backed by the tokio runtime.
//!
//! Socket watches and timers are local tasks, so a [`TokioReactor`] must be
//! used from inside a [`tokio::task::LocalSet`] on a runtime with IO and time
//! drivers enabled.

use crate::reactor::{Interest, Reactor, Readiness, ReadyCallback, Socket, TimerCallback, TimerKey};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::poll_fn;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::task::JoinHandle;

/// Borrowed descriptor. The engine owns the socket; dropping this only
/// deregisters it from the runtime.
struct SocketFd(RawFd);

impl AsRawFd for SocketFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

struct Watch {
    fd: AsyncFd<SocketFd>,
    interest: Interest,
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct RuntimeState {
    watches: HashMap<Socket, Watch>,
    timers: HashMap<TimerKey, JoinHandle<()>>,
    next_generation: u64,
    next_timer: u64,
}

impl Drop for RuntimeState {
    fn drop(&mut self) {
        for (_, watch) in self.watches.drain() {
            watch.task.abort();
        }
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

/// Reactor on the current tokio runtime.
///
/// Must be used inside a [`LocalSet`](tokio::task::LocalSet). Watching
/// outside a runtime fails.
#[derive(Clone, Default)]
pub struct TokioReactor {
    state: Rc<RefCell<RuntimeState>>,
}

impl TokioReactor {
    /// Creates a reactor with nothing watched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of watched sockets.
    pub fn watched_sockets(&self) -> usize {
        self.state.borrow().watches.len()
    }

    /// Number of timers that have not fired.
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }
}

impl Reactor for TokioReactor {
    fn watch(&self, socket: Socket, interest: Interest, on_ready: ReadyCallback) -> io::Result<()> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut state = self.state.borrow_mut();
        state.next_generation += 1;
        let generation = state.next_generation;

        // Keep the runtime registration when only the interest changes;
        // registering the same descriptor twice is refused by epoll.
        let fd = match state.watches.remove(&socket) {
            Some(previous) => {
                previous.task.abort();
                previous.fd
            }
            None => AsyncFd::with_interest(
                SocketFd(socket),
                tokio::io::Interest::READABLE | tokio::io::Interest::WRITABLE,
            )?,
        };

        let task = tokio::task::spawn_local(dispatch(
            Rc::downgrade(&self.state),
            socket,
            generation,
            on_ready,
        ));
        state.watches.insert(
            socket,
            Watch {
                fd,
                interest,
                generation,
                task,
            },
        );
        tracing::trace!(socket, ?interest, "watching socket");
        Ok(())
    }

    fn unwatch(&self, socket: Socket) -> io::Result<()> {
        let removed = self.state.borrow_mut().watches.remove(&socket);
        if let Some(watch) = removed {
            watch.task.abort();
            tracing::trace!(socket, "unwatched socket");
        }
        Ok(())
    }

    fn start_timer(&self, delay: Duration, on_fire: TimerCallback) -> io::Result<TimerKey> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let key = {
            let mut state = self.state.borrow_mut();
            state.next_timer += 1;
            TimerKey(state.next_timer)
        };
        let weak = Rc::downgrade(&self.state);
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().timers.remove(&key);
            }
            on_fire();
        });
        self.state.borrow_mut().timers.insert(key, task);
        Ok(key)
    }

    fn stop_timer(&self, key: TimerKey) {
        let removed = self.state.borrow_mut().timers.remove(&key);
        if let Some(task) = removed {
            task.abort();
        }
    }
}

/// Delivers readiness for one watch generation until it is replaced or
/// removed.
///
/// The runtime reports readiness edges; the engine expects a socket that
/// is still ready after a step to be reported again. After each delivery
/// the socket is probed and re-delivered while it stays ready.
async fn dispatch(
    state: Weak<RefCell<RuntimeState>>,
    socket: Socket,
    generation: u64,
    on_ready: ReadyCallback,
) {
    loop {
        let Some(ready) = poll_fn(|cx| poll_watch(&state, socket, generation, cx)).await else {
            return;
        };
        on_ready(ready);

        loop {
            tokio::task::yield_now().await;
            let Some(interest) = current_interest(&state, socket, generation) else {
                return;
            };
            let ready = probe(socket, interest);
            if ready == Readiness::default() {
                break;
            }
            on_ready(ready);
        }
    }
}

fn current_interest(state: &Weak<RefCell<RuntimeState>>, socket: Socket, generation: u64) -> Option<Interest> {
    let state = state.upgrade()?;
    let state = state.borrow();
    state
        .watches
        .get(&socket)
        .filter(|w| w.generation == generation)
        .map(|w| w.interest)
}

/// `Ready(None)` once this generation is gone.
fn poll_watch(
    state: &Weak<RefCell<RuntimeState>>,
    socket: Socket,
    generation: u64,
    cx: &mut Context<'_>,
) -> Poll<Option<Readiness>> {
    let Some(state) = state.upgrade() else {
        return Poll::Ready(None);
    };
    let state = state.borrow();
    let Some(watch) = state.watches.get(&socket).filter(|w| w.generation == generation) else {
        return Poll::Ready(None);
    };

    let mut ready = Readiness::default();
    if watch.interest.is_readable() {
        match watch.fd.poll_read_ready(cx) {
            Poll::Ready(Ok(mut guard)) => {
                guard.clear_ready();
                ready.readable = true;
            }
            Poll::Ready(Err(_)) => ready.error = true,
            Poll::Pending => {}
        }
    }
    if watch.interest.is_writable() {
        match watch.fd.poll_write_ready(cx) {
            Poll::Ready(Ok(mut guard)) => {
                guard.clear_ready();
                ready.writable = true;
            }
            Poll::Ready(Err(_)) => ready.error = true,
            Poll::Pending => {}
        }
    }

    if ready == Readiness::default() {
        Poll::Pending
    } else {
        Poll::Ready(Some(ready))
    }
}

/// Non-blocking readiness check.
fn probe(fd: RawFd, interest: Interest) -> Readiness {
    let mut events = 0;
    if interest.is_readable() {
        events |= libc::POLLIN;
    }
    if interest.is_writable() {
        events |= libc::POLLOUT;
    }
    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    // SAFETY: `pfd` is a valid pollfd for the duration of the call and the
    // count matches. A zero timeout never blocks.
    let n = unsafe { libc::poll(&mut pfd, 1, 0) };
    if n <= 0 {
        return Readiness::default();
    }
    Readiness {
        readable: interest.is_readable() && pfd.revents & (libc::POLLIN | libc::POLLHUP) != 0,
        writable: interest.is_writable() && pfd.revents & libc::POLLOUT != 0,
        error: pfd.revents & (libc::POLLERR | libc::POLLNVAL) != 0,
    }
}
