//! Blocking bridge over asynchronous GPU requests.
//!
//! Adapter and device acquisition complete through a callback (a future, under
//! wgpu). Startup code wants straight-line calls, so each request gets a
//! [`Completion`] slot plus a [`CompletionHandler`] that the callback fills in,
//! and [`Completion::wait`] services a [`Pump`] until the slot is complete.
//!
//! The pump decides how events are dispatched: polling a future while the
//! driver services its callbacks, or (in tests) replaying a script. Drivers
//! that complete synchronously never pump at all.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Status reported by a request's completion callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RequestStatus {
    Success,
    /// No adapter/device satisfies the request.
    Unavailable,
    Error,
    Unknown,
}

/// Why a bridged request produced no handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("request ended with status {status:?}: {message}")]
    Failed { status: RequestStatus, message: String },

    #[error("request reported success without a handle")]
    EmptyHandle,

    #[error("request did not complete after {waited:?} ({pumps} pump iterations)")]
    Timeout { waited: Duration, pumps: u64 },

    #[error("completion handler dropped before the request finished")]
    Abandoned,
}

/// Bounds for [`Completion::wait`].
///
/// `None` disables a bound. With both bounds disabled the wait loop spins until
/// the request completes or its handler is dropped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaitPolicy {
    pub timeout: Option<Duration>,
    pub max_pumps: Option<u64>,
}

impl WaitPolicy {
    pub const fn unbounded() -> Self {
        Self { timeout: None, max_pumps: None }
    }

    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout), max_pumps: None }
    }

    fn expired(&self, started: Instant, pumps: u64) -> bool {
        self.timeout.is_some_and(|t| started.elapsed() >= t)
            || self.max_pumps.is_some_and(|max| pumps >= max)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }
}

/// One step of event dispatch for the wait loop.
pub trait Pump {
    fn pump(&mut self);
}

impl<F: FnMut()> Pump for F {
    fn pump(&mut self) {
        self()
    }
}

/// Pumps by polling a future with a no-op waker.
///
/// Before every poll but the first, `dispatch` services the driver's callback
/// queue (`Instance::poll_all`, `Device::poll`, ...) so a future waiting on it
/// can make progress. The future is dropped as soon as it resolves; further
/// pumps only yield the thread.
pub struct FuturePump<F, D> {
    future: Option<Pin<Box<F>>>,
    dispatch: D,
    polled: bool,
}

impl<F: Future<Output = ()>, D: Pump> FuturePump<F, D> {
    pub fn new(future: F, dispatch: D) -> Self {
        Self {
            future: Some(Box::pin(future)),
            dispatch,
            polled: false,
        }
    }
}

impl<F: Future<Output = ()>, D: Pump> Pump for FuturePump<F, D> {
    fn pump(&mut self) {
        let Some(future) = self.future.as_mut() else {
            std::thread::yield_now();
            return;
        };

        if self.polled {
            self.dispatch.pump();
        }
        self.polled = true;

        let mut cx = Context::from_waker(Waker::noop());
        if let Poll::Ready(()) = future.as_mut().poll(&mut cx) {
            self.future = None;
        }
    }
}

struct Outcome<T> {
    status: RequestStatus,
    value: Option<T>,
    message: Option<String>,
}

type Slot<T> = Rc<RefCell<Option<Outcome<T>>>>;

/// Receiving side of a single request.
pub struct Completion<T> {
    slot: Slot<T>,
}

/// Sending side handed to the asynchronous callback. Completes at most once.
pub struct CompletionHandler<T> {
    slot: Slot<T>,
}

impl<T> CompletionHandler<T> {
    /// Stores `{status, handle, message}` and marks the request complete.
    pub fn complete(self, status: RequestStatus, value: Option<T>, message: Option<String>) {
        *self.slot.borrow_mut() = Some(Outcome { status, value, message });
    }

    pub fn succeed(self, value: T) {
        self.complete(RequestStatus::Success, Some(value), None);
    }

    pub fn fail(self, status: RequestStatus, message: impl Into<String>) {
        self.complete(status, None, Some(message.into()));
    }
}

impl<T> Completion<T> {
    pub fn new() -> Self {
        Self { slot: Rc::new(RefCell::new(None)) }
    }

    /// Returns the handler for the asynchronous side.
    pub fn handler(&self) -> CompletionHandler<T> {
        CompletionHandler { slot: Rc::clone(&self.slot) }
    }

    pub fn is_complete(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Blocks until the request completes, servicing `pump` between checks.
    ///
    /// `what` names the request in diagnostics ("adapter", "device", ...).
    /// Failures are logged here so every caller reports them the same way.
    pub fn wait<P: Pump>(
        self,
        what: &'static str,
        mut pump: P,
        policy: &WaitPolicy,
    ) -> Result<T, BridgeError> {
        let started = Instant::now();
        let mut pumps: u64 = 0;

        let outcome = loop {
            if let Some(outcome) = self.slot.borrow_mut().take() {
                break outcome;
            }

            // Only this side still holds the slot: nobody can complete it.
            if Rc::strong_count(&self.slot) == 1 {
                log::error!("{what} request abandoned before completion");
                return Err(BridgeError::Abandoned);
            }

            if policy.expired(started, pumps) {
                let err = BridgeError::Timeout { waited: started.elapsed(), pumps };
                log::error!("{what} request timed out: {err}");
                return Err(err);
            }

            pump.pump();
            pumps += 1;
        };

        log::trace!("{what} request completed after {pumps} pump iterations");

        match outcome {
            Outcome { status: RequestStatus::Success, value: Some(value), .. } => Ok(value),
            Outcome { status: RequestStatus::Success, value: None, .. } => {
                log::error!("couldn't get {what}: request succeeded without a handle");
                Err(BridgeError::EmptyHandle)
            }
            Outcome { status, message, .. } => {
                let message = message.unwrap_or_else(|| "no message".to_string());
                log::error!("couldn't get {what}: {message} ({status:?})");
                Err(BridgeError::Failed { status, message })
            }
        }
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues `request` and blocks until it resolves, running `dispatch` between
/// polls.
///
/// `Err(message)` from the request maps to [`RequestStatus::Error`].
pub fn request_sync<T, Fut, D>(
    what: &'static str,
    request: Fut,
    dispatch: D,
    policy: &WaitPolicy,
) -> Result<T, BridgeError>
where
    Fut: Future<Output = Result<T, String>>,
    D: Pump,
{
    let completion = Completion::new();
    let handler = completion.handler();

    let task = async move {
        match request.await {
            Ok(value) => handler.succeed(value),
            Err(message) => handler.fail(RequestStatus::Error, message),
        }
    };

    completion.wait(what, FuturePump::new(task, dispatch), policy)
}

/// Blocks on an infallible GPU future (compilation info, error scopes, ...).
pub fn resolve_sync<T, Fut, D>(
    what: &'static str,
    future: Fut,
    dispatch: D,
    policy: &WaitPolicy,
) -> Result<T, BridgeError>
where
    Fut: Future<Output = T>,
    D: Pump,
{
    request_sync(what, async move { Ok(future.await) }, dispatch, policy)
}
