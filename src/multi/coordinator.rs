//! Binds a [`TransferEngine`] to a [`Reactor`] and turns completed transfers
//! into resolved futures.

use crate::base::error::Error;
use crate::engine::{
    ActionTarget, CompletionMessage, EngineEvent, EngineNotifier, EventFlags, SocketAction,
    TimerRequest, TransferEngine,
};
use crate::http::accumulator::ResponseAccumulator;
use crate::http::Response;
use crate::multi::future::{Outcome, Promise, ResponseFuture};
use crate::reactor::{
    DeadlineTimer, PollHandle, Reactor, Readiness, ReadyCallback, Socket, TimerCallback,
};
use crate::transfer::{TransferHandle, TransferId};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;

/// Default lower bound for engine deadlines of zero or less.
pub const DEFAULT_TIMER_FLOOR: Duration = Duration::from_millis(1);

/// Builder for a [`Coordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorBuilder {
    timer_floor: Duration,
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self {
            timer_floor: DEFAULT_TIMER_FLOOR,
        }
    }
}

impl CoordinatorBuilder {
    /// Creates a builder with [`DEFAULT_TIMER_FLOOR`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay used when the engine asks to be woken immediately.
    pub fn timer_floor(mut self, floor: Duration) -> Self {
        self.timer_floor = floor.max(Duration::from_micros(1));
        self
    }

    /// Installs the engine callbacks and creates the coordinator.
    ///
    /// Fails if the engine refuses the callback installation.
    pub fn build<E, R>(self, mut engine: E, reactor: R) -> Result<Coordinator<E, R>, Error>
    where
        E: TransferEngine + 'static,
        R: Reactor + 'static,
    {
        let notifier = EngineNotifier::new();
        engine.install_callbacks(notifier.clone())?;
        tracing::debug!(engine = %engine.version(), floor = ?self.timer_floor, "coordinator created");

        Ok(Coordinator {
            inner: Rc::new(Inner {
                state: RefCell::new(State {
                    engine,
                    transfers: HashMap::new(),
                    polls: HashMap::new(),
                    timer: DeadlineTimer::new(self.timer_floor),
                }),
                reactor,
                notifier,
            }),
        })
    }
}

/// Drives many concurrent transfers on a single-threaded event loop.
///
/// Cloning is cheap and yields another reference to the same coordinator.
/// All methods must be called on the loop thread. Dropping the last
/// reference abandons every outstanding transfer: pending futures resolve
/// with [`Error::Cancelled`], completion callbacks are dropped uncalled.
pub struct Coordinator<E: TransferEngine + 'static, R: Reactor + 'static> {
    inner: Rc<Inner<E, R>>,
}

struct Inner<E: TransferEngine + 'static, R: Reactor + 'static> {
    state: RefCell<State<E>>,
    reactor: R,
    notifier: EngineNotifier,
}

struct State<E> {
    engine: E,
    transfers: HashMap<TransferId, TransferHandle>,
    polls: HashMap<Socket, PollHandle>,
    timer: DeadlineTimer,
}

/// A promise ready to be resolved once no state borrow is held.
type Delivery = (TransferId, Promise, Outcome);

impl<E: TransferEngine + 'static, R: Reactor + 'static> Clone for Coordinator<E, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> Coordinator<E, R> {
    /// Creates a coordinator with default settings.
    pub fn new(engine: E, reactor: R) -> Result<Self, Error> {
        CoordinatorBuilder::new().build(engine, reactor)
    }

    /// Returns a builder for custom settings.
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// The reactor this coordinator registers sockets and timers with.
    pub fn reactor(&self) -> &R {
        &self.inner.reactor
    }

    /// Registers a configured handle and returns a future for its outcome.
    pub fn add(&self, handle: TransferHandle) -> Result<ResponseFuture, Error> {
        let (tx, rx) = oneshot::channel();
        let id = self.register(handle, Promise::Channel(tx))?;
        Ok(ResponseFuture::new(id, rx))
    }

    /// Like [`Coordinator::add`], but resolves by calling `on_complete` on
    /// the loop thread. The callback may call back into the coordinator.
    pub fn add_with_callback(
        &self,
        handle: TransferHandle,
        on_complete: impl FnOnce(Outcome) + 'static,
    ) -> Result<TransferId, Error> {
        self.register(handle, Promise::Callback(Box::new(on_complete)))
    }

    fn register(&self, mut handle: TransferHandle, promise: Promise) -> Result<TransferId, Error> {
        let id = handle.id();
        let (deliveries, result) = {
            let mut state = self.inner.state.try_borrow_mut().map_err(|_| Error::Reentrant)?;
            if state.transfers.contains_key(&id) || !handle.side_table().is_empty() {
                return Err(Error::AlreadyRegistered(id));
            }

            let response = Rc::new(RefCell::new(ResponseAccumulator::new()));
            handle.side_table_mut().store_promise(promise);
            handle.side_table_mut().store_response(response.clone());
            let request = handle.begin_transfer(response);

            if let Err(err) = state.engine.add(id, request) {
                handle.abandon_transfer();
                let _ = self.apply_engine_events(&mut state);
                tracing::warn!(transfer = %id, error = %err, "engine rejected transfer");
                return Err(err);
            }
            state.transfers.insert(id, handle);
            tracing::debug!(transfer = %id, active = state.transfers.len(), "transfer added");

            match self.apply_engine_events(&mut state) {
                Ok(()) => {
                    // The transfer is live from here on; stray completions
                    // for other ids must not fail this registration.
                    let (deliveries, settled) = self.settle(&mut state);
                    if let Err(err) = settled {
                        tracing::error!(transfer = %id, error = %err, "engine state inconsistent after add");
                    }
                    (deliveries, Ok(()))
                }
                Err(err) => {
                    // Undo the registration; the caller only sees the error.
                    if let Some(mut handle) = state.transfers.remove(&id) {
                        if let Err(e) = state.engine.remove(id) {
                            tracing::warn!(transfer = %id, error = %e, "engine refused removal");
                        }
                        handle.abandon_transfer();
                    }
                    let _ = self.apply_engine_events(&mut state);
                    (Vec::new(), Err(err))
                }
            }
        };
        Self::deliver(deliveries);
        result.map(|()| id)
    }

    /// Cancels a registered transfer. Its future resolves with
    /// [`Error::Cancelled`] and the handle is returned with its side-table
    /// cleared. Unknown ids yield `Ok(None)`.
    pub fn remove(&self, id: TransferId) -> Result<Option<TransferHandle>, Error> {
        let (handle, deliveries, result) = {
            let mut state = self.inner.state.try_borrow_mut().map_err(|_| Error::Reentrant)?;
            let Some(mut handle) = state.transfers.remove(&id) else {
                return Ok(None);
            };

            let detached = state.engine.remove(id);
            let attachments = handle.side_table_mut().take();
            match detached {
                Ok(detached) => handle.finish_transfer(detached.info, &detached.error_description),
                Err(err) => tracing::warn!(transfer = %id, error = %err, "engine refused removal"),
            }

            let mut deliveries = Vec::new();
            if let Some(promise) = attachments.promise {
                deliveries.push((id, promise, Err(Error::Cancelled)));
            }
            tracing::debug!(transfer = %id, "transfer removed");

            let applied = self.apply_engine_events(&mut state);
            let (more, settled) = self.settle(&mut state);
            deliveries.extend(more);
            (handle, deliveries, applied.and(settled))
        };
        Self::deliver(deliveries);
        result.map(|()| Some(handle))
    }

    /// Steps the engine for activity on `socket`. Called by the reactor.
    pub fn on_socket_ready(&self, socket: Socket, readiness: Readiness) -> Result<(), Error> {
        self.step(ActionTarget::Socket(socket), EventFlags::from(readiness))
    }

    /// Steps the engine for its deadline. Called by the reactor.
    pub fn on_timeout(&self) -> Result<(), Error> {
        if let Ok(mut state) = self.inner.state.try_borrow_mut() {
            state.timer.fired();
        }
        self.step(ActionTarget::Timeout, EventFlags::empty())
    }

    fn step(&self, target: ActionTarget, flags: EventFlags) -> Result<(), Error> {
        let (deliveries, result) = {
            let mut state = self.inner.state.try_borrow_mut().map_err(|_| Error::Reentrant)?;
            let stepped = state.engine.socket_action(target, flags);
            if let Ok(running) = &stepped {
                tracing::trace!(?target, flags = flags.bits(), running, "engine stepped");
            }
            let applied = self.apply_engine_events(&mut state);
            let (deliveries, settled) = self.settle(&mut state);
            (deliveries, stepped.map(drop).and(applied).and(settled))
        };
        Self::deliver(deliveries);
        result
    }

    /// Drains completion messages, then applies the requests the engine
    /// queued while detaching them.
    fn settle(&self, state: &mut State<E>) -> (Vec<Delivery>, Result<(), Error>) {
        let mut deliveries = Vec::new();
        let mut first_err = None;

        while let Some(message) = state.engine.next_message() {
            match self.complete(state, message) {
                Ok(delivery) => deliveries.push(delivery),
                Err(err) => {
                    tracing::error!(error = %err, "completion rejected");
                    first_err.get_or_insert(err);
                }
            }
        }
        // Detaching finished transfers releases their sockets.
        if let Err(err) = self.apply_engine_events(state) {
            first_err.get_or_insert(err);
        }
        (deliveries, first_err.map_or(Ok(()), Err))
    }

    fn complete(&self, state: &mut State<E>, message: CompletionMessage) -> Result<Delivery, Error> {
        let id = message.id;
        let mut handle = state
            .transfers
            .remove(&id)
            .ok_or(Error::UnknownTransfer(id))?;
        let attachments = handle.side_table_mut().take();
        let detached = state.engine.remove(id).unwrap_or_else(|err| {
            tracing::warn!(transfer = %id, error = %err, "engine refused removal");
            Default::default()
        });
        handle.finish_transfer(detached.info, &detached.error_description);

        let promise = attachments.promise.ok_or(Error::MissingAttachment {
            id,
            what: "pending promise",
        })?;
        let response = attachments.response.ok_or(Error::MissingAttachment {
            id,
            what: "response accumulator",
        })?;

        let outcome = match message.result {
            Ok(()) => {
                let parts = response.borrow_mut().finish();
                tracing::debug!(transfer = %id, status = ?parts.status, bytes = parts.body.len(), "transfer completed");
                Ok(Response::new(parts, handle))
            }
            Err(code) => {
                let description = handle.error_description().unwrap_or_default().to_owned();
                tracing::debug!(transfer = %id, %code, %description, "transfer failed");
                Err(Error::transfer(code, description))
            }
        };
        Ok((id, promise, outcome))
    }

    /// Applies queued engine requests. At most one error-flagged timeout
    /// step runs per pass, so a reactor that keeps refusing timers cannot
    /// spin the engine.
    fn apply_engine_events(&self, state: &mut State<E>) -> Result<(), Error> {
        let mut first_err = None;
        let mut error_stepped = false;
        while let Some(event) = self.inner.notifier.pop() {
            let result = match event {
                EngineEvent::Socket {
                    socket,
                    action,
                    owner,
                } => self.apply_socket(state, socket, action, owner),
                EngineEvent::Timer(request) => {
                    self.apply_timer(state, request, &mut error_stepped)
                }
                EngineEvent::Fault(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::error!(error = %err, "failed to apply engine request");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn apply_socket(
        &self,
        state: &mut State<E>,
        socket: Socket,
        action: SocketAction,
        owner: Option<TransferId>,
    ) -> Result<(), Error> {
        match action.interest() {
            None => {
                if let Some(mut poll) = state.polls.remove(&socket) {
                    poll.stop(&self.inner.reactor)?;
                }
                for handle in state.transfers.values_mut() {
                    handle.side_table_mut().release_poll(socket);
                }
                tracing::trace!(socket, "socket released");
            }
            Some(interest) => {
                let on_ready = self.ready_callback(socket);
                let poll = state
                    .polls
                    .entry(socket)
                    .or_insert_with(|| PollHandle::new(socket));
                poll.start(&self.inner.reactor, interest, on_ready)?;
                if let Some(handle) = owner.and_then(|id| state.transfers.get_mut(&id)) {
                    handle.side_table_mut().store_poll(socket);
                }
                tracing::trace!(socket, ?interest, "socket watched");
            }
        }
        Ok(())
    }

    fn apply_timer(
        &self,
        state: &mut State<E>,
        request: TimerRequest,
        error_stepped: &mut bool,
    ) -> Result<(), Error> {
        let timeout_ms = match request {
            TimerRequest::Clear => {
                state.timer.stop(&self.inner.reactor);
                return Ok(());
            }
            TimerRequest::After(ms) => ms,
        };

        match state
            .timer
            .schedule(&self.inner.reactor, timeout_ms, self.timeout_callback())
        {
            Ok(delay) => {
                tracing::trace!(timeout_ms, ?delay, "deadline scheduled");
                Ok(())
            }
            Err(err) if *error_stepped => Err(err),
            Err(err) => {
                // Without a timer nothing would ever wake the engine again.
                *error_stepped = true;
                tracing::error!(error = %err, "deadline timer failed, stepping engine with error flag");
                state
                    .engine
                    .socket_action(ActionTarget::Timeout, EventFlags::ERR)
                    .map(drop)
            }
        }
    }

    fn ready_callback(&self, socket: Socket) -> ReadyCallback {
        let weak: Weak<Inner<E, R>> = Rc::downgrade(&self.inner);
        Rc::new(move |readiness| {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = (Coordinator { inner }).on_socket_ready(socket, readiness) {
                    tracing::error!(socket, error = %err, "socket step failed");
                }
            }
        })
    }

    fn timeout_callback(&self) -> TimerCallback {
        let weak: Weak<Inner<E, R>> = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = (Coordinator { inner }).on_timeout() {
                    tracing::error!(error = %err, "timeout step failed");
                }
            }
        })
    }

    fn deliver(deliveries: Vec<Delivery>) {
        for (id, promise, outcome) in deliveries {
            if !promise.resolve(outcome) {
                tracing::debug!(transfer = %id, "outcome dropped, future no longer awaited");
            }
        }
    }

    fn state(&self) -> Result<Ref<'_, State<E>>, Error> {
        self.inner.state.try_borrow().map_err(|_| Error::Reentrant)
    }

    /// Whether `id` is registered and not yet completed.
    pub fn is_registered(&self, id: TransferId) -> Result<bool, Error> {
        Ok(self.state()?.transfers.contains_key(&id))
    }

    /// Number of registered transfers.
    pub fn active_transfers(&self) -> Result<usize, Error> {
        Ok(self.state()?.transfers.len())
    }

    /// Number of sockets the engine currently wants watched.
    pub fn watched_sockets(&self) -> Result<usize, Error> {
        Ok(self.state()?.polls.len())
    }

    /// Whether an engine deadline is pending on the reactor.
    pub fn timer_armed(&self) -> Result<bool, Error> {
        Ok(self.state()?.timer.is_armed())
    }

    /// Runs `f` against a registered handle.
    pub fn with_transfer<T>(
        &self,
        id: TransferId,
        f: impl FnOnce(&TransferHandle) -> T,
    ) -> Result<Option<T>, Error> {
        Ok(self.state()?.transfers.get(&id).map(f))
    }

    /// Version string reported by the engine.
    pub fn engine_version(&self) -> Result<String, Error> {
        Ok(self.state()?.engine.version())
    }

    /// Removes every registered transfer, cancelling their futures.
    pub fn shutdown(&self) -> Result<Vec<TransferHandle>, Error> {
        let ids: Vec<_> = self.state()?.transfers.keys().copied().collect();
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            handles.extend(self.remove(id)?);
        }
        Ok(handles)
    }
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> Drop for Inner<E, R> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (_, mut poll) in state.polls.drain() {
            let _ = poll.stop(&self.reactor);
        }
        state.timer.stop(&self.reactor);
    }
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> fmt::Debug for Coordinator<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Coordinator")
                .field("transfers", &state.transfers.len())
                .field("sockets", &state.polls.len())
                .field("timer_armed", &state.timer.is_armed())
                .finish(),
            Err(_) => f.debug_struct("Coordinator").finish_non_exhaustive(),
        }
    }
}
