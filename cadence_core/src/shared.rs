// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A cloneable single-threaded handle to a [`Dispatcher`].
//!
//! Components that come and go during a frame (an effect that removes
//! itself when finished, a spawner that registers children) need to reach
//! the dispatcher from inside a callback. [`SharedDispatcher`] allows that:
//! a mutation requested while a frame is executing is queued and applied
//! once the frame returns to idle, so it only affects later frames.
//!
//! The handle is `!Send`; it is meant for hosts that run animation on one
//! thread, such as a browser main loop.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::dispatch::{DispatchConfig, DispatchPhase, Dispatcher, FrameReport};
use crate::error::CallbackError;
use crate::frame::FrameState;
use crate::metrics::Metrics;
use crate::registry::{Callback, Priority, Registration};
use crate::trace::Tracer;

/// Filled in once a queued registration has been applied.
type Ticket = Rc<RefCell<Option<Registration>>>;

enum PendingOp {
    Register {
        id: String,
        priority: Priority,
        target_rate: Option<f64>,
        callback: Callback,
        ticket: Ticket,
    },
    Unregister(Ticket),
    UnregisterId(String),
    SetEnabled(String, bool),
}

struct Inner {
    dispatcher: RefCell<Dispatcher>,
    pending: RefCell<Vec<PendingOp>>,
    last_metrics: Cell<Metrics>,
}

impl Inner {
    /// Applies `op` now, or queues it if a frame is executing.
    fn submit(&self, op: PendingOp) {
        match self.dispatcher.try_borrow_mut() {
            Ok(mut dispatcher) => {
                apply(&mut dispatcher, op);
                self.last_metrics.set(dispatcher.metrics());
            }
            Err(_) => self.pending.borrow_mut().push(op),
        }
    }

    fn drain_pending(&self) {
        loop {
            let ops = core::mem::take(&mut *self.pending.borrow_mut());
            if ops.is_empty() {
                break;
            }
            let mut dispatcher = self.dispatcher.borrow_mut();
            for op in ops {
                apply(&mut dispatcher, op);
            }
        }
    }
}

fn apply(dispatcher: &mut Dispatcher, op: PendingOp) {
    match op {
        PendingOp::Register {
            id,
            priority,
            target_rate,
            callback,
            ticket,
        } => {
            let registration = dispatcher.register_boxed(id, priority, target_rate, callback);
            *ticket.borrow_mut() = Some(registration);
        }
        PendingOp::Unregister(ticket) => {
            if let Some(registration) = ticket.borrow().as_ref() {
                dispatcher.unregister(registration);
            }
        }
        PendingOp::UnregisterId(id) => {
            dispatcher.unregister_id(&id);
        }
        PendingOp::SetEnabled(id, enabled) => {
            dispatcher.set_enabled(&id, enabled);
        }
    }
}

/// Cloneable handle to a [`Dispatcher`] that tolerates mutation from inside
/// callbacks.
#[derive(Clone)]
pub struct SharedDispatcher {
    inner: Rc<Inner>,
}

impl fmt::Debug for SharedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDispatcher")
            .field("metrics", &self.metrics())
            .field("pending", &self.inner.pending.borrow().len())
            .finish_non_exhaustive()
    }
}

impl SharedDispatcher {
    /// Creates a handle around a fresh dispatcher.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self::from(Dispatcher::new(config))
    }

    /// Registers `callback` under `id` and returns its removal handle.
    ///
    /// Called from inside a callback, the registration takes effect after
    /// the current frame.
    pub fn register<F>(
        &self,
        id: impl Into<String>,
        priority: Priority,
        target_rate: Option<f64>,
        callback: F,
    ) -> Unregister
    where
        F: FnMut(&FrameState, f64) -> Result<(), CallbackError> + 'static,
    {
        let ticket = Ticket::default();
        self.inner.submit(PendingOp::Register {
            id: id.into(),
            priority,
            target_rate,
            callback: Box::new(callback),
            ticket: Rc::clone(&ticket),
        });
        Unregister {
            inner: Rc::downgrade(&self.inner),
            ticket,
            done: Cell::new(false),
        }
    }

    /// Removes whatever is registered under `id`.
    pub fn unregister_id(&self, id: &str) {
        self.inner.submit(PendingOp::UnregisterId(String::from(id)));
    }

    /// Pauses or resumes `id`. Unknown ids are ignored.
    pub fn set_enabled(&self, id: &str, enabled: bool) {
        self.inner.submit(PendingOp::SetEnabled(String::from(id), enabled));
    }

    /// Returns the current metrics.
    ///
    /// During a frame this is the snapshot taken after the previous one.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        match self.inner.dispatcher.try_borrow() {
            Ok(dispatcher) => dispatcher.metrics(),
            Err(_) => self.inner.last_metrics.get(),
        }
    }

    /// Returns `true` while a frame is executing.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatcher.try_borrow_mut().is_err()
    }

    /// Calls `f` with the dispatcher, or returns `None` during a frame.
    pub fn with<R>(&self, f: impl FnOnce(&Dispatcher) -> R) -> Option<R> {
        self.inner.dispatcher.try_borrow().ok().map(|d| f(&d))
    }

    /// Runs one frame, then applies mutations queued by its callbacks.
    ///
    /// Returns `None` when called re-entrantly from a callback.
    pub fn update(&self, state: &FrameState, delta_seconds: f64) -> Option<FrameReport> {
        self.update_traced(state, delta_seconds, &mut Tracer::none())
    }

    /// Like [`update`](Self::update), emitting trace events to `tracer`.
    pub fn update_traced(
        &self,
        state: &FrameState,
        delta_seconds: f64,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameReport> {
        let report = {
            let Ok(mut dispatcher) = self.inner.dispatcher.try_borrow_mut() else {
                log::warn!("nested update at frame {} ignored", state.frame_count);
                return None;
            };
            self.inner.last_metrics.set(dispatcher.metrics());
            let report = dispatcher.update_traced(state, delta_seconds, tracer);
            debug_assert_eq!(dispatcher.phase(), DispatchPhase::Idle, "frame left idle");
            report
        };
        self.inner.drain_pending();
        if let Ok(dispatcher) = self.inner.dispatcher.try_borrow() {
            self.inner.last_metrics.set(dispatcher.metrics());
        }
        Some(report)
    }
}

impl From<Dispatcher> for SharedDispatcher {
    fn from(dispatcher: Dispatcher) -> Self {
        let metrics = dispatcher.metrics();
        Self {
            inner: Rc::new(Inner {
                dispatcher: RefCell::new(dispatcher),
                pending: RefCell::new(Vec::new()),
                last_metrics: Cell::new(metrics),
            }),
        }
    }
}

impl Default for SharedDispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

/// Removal handle returned by [`SharedDispatcher::register`].
///
/// Holds only a weak reference, so it never keeps the dispatcher alive.
/// Dropping the handle leaves the callback registered.
pub struct Unregister {
    inner: Weak<Inner>,
    ticket: Ticket,
    done: Cell<bool>,
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unregister")
            .field("registration", &self.ticket.borrow())
            .field("done", &self.done.get())
            .finish_non_exhaustive()
    }
}

impl Unregister {
    /// Removes the callback this handle was issued for.
    ///
    /// Only the first call has an effect. A later registration under the
    /// same id is never removed by this handle.
    pub fn unregister(&self) {
        if self.done.replace(true) {
            return;
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        inner.submit(PendingOp::Unregister(Rc::clone(&self.ticket)));
    }

    /// Returns `true` once [`unregister`](Self::unregister) has been called.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;

    fn frames(n: usize) -> impl Iterator<Item = FrameState> {
        let mut state = FrameState::default();
        (0..n).map(move |_| {
            state = state.advance(Duration::from_millis(16));
            state
        })
    }

    fn counting(
        hits: &Rc<Cell<u32>>,
    ) -> impl FnMut(&FrameState, f64) -> Result<(), CallbackError> + use<> {
        let hits = Rc::clone(hits);
        move |_: &FrameState, _: f64| {
            hits.set(hits.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn unregister_is_idempotent() {
        let shared = SharedDispatcher::default();
        let handle = shared.register("a", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
        shared.register("b", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
        assert_eq!(shared.metrics().registered_count, 2);

        handle.unregister();
        handle.unregister();
        assert!(handle.is_done());
        assert_eq!(shared.metrics().registered_count, 1);
    }

    #[test]
    fn stale_handle_does_not_remove_replacement() {
        let shared = SharedDispatcher::default();
        let old = shared.register("a", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
        shared.register("a", Priority::High, None, |_: &FrameState, _: f64| Ok(()));
        old.unregister();
        assert_eq!(shared.metrics().registered_count, 1);
    }

    #[test]
    fn handle_outliving_dispatcher_is_harmless() {
        let shared = SharedDispatcher::default();
        let handle = shared.register("a", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
        drop(shared);
        handle.unregister();
        assert!(handle.is_done());
    }

    #[test]
    fn self_removal_takes_effect_next_frame() {
        let shared = SharedDispatcher::default();
        let hits = Rc::new(Cell::new(0_u32));
        let slot: Rc<RefCell<Option<Unregister>>> = Rc::default();

        let (h, s) = (Rc::clone(&hits), Rc::clone(&slot));
        let handle = shared.register("once", Priority::High, None, move |_: &FrameState, _: f64| {
            h.set(h.get() + 1);
            if let Some(handle) = s.borrow().as_ref() {
                handle.unregister();
            }
            Ok(())
        });
        *slot.borrow_mut() = Some(handle);

        for state in frames(3) {
            shared.update(&state, 0.016);
        }
        assert_eq!(hits.get(), 1);
        assert_eq!(shared.metrics().registered_count, 0);
    }

    #[test]
    fn registration_during_frame_is_deferred() {
        let shared = SharedDispatcher::default();
        let child_hits = Rc::new(Cell::new(0_u32));
        let spawned = Rc::new(Cell::new(false));

        let (sh, ch, sp) = (shared.clone(), Rc::clone(&child_hits), Rc::clone(&spawned));
        shared.register("spawner", Priority::High, None, move |_: &FrameState, _: f64| {
            if !sp.replace(true) {
                assert!(sh.is_dispatching(), "callbacks run inside a frame");
                sh.register("child", Priority::High, None, counting(&ch));
                assert_eq!(sh.metrics().registered_count, 1, "not applied yet");
            }
            Ok(())
        });

        let mut frames = frames(2);
        let first = frames.next().unwrap();
        let report = shared.update(&first, 0.016).unwrap();
        assert_eq!(report.executed, 1, "child did not run in the frame it was added");
        assert_eq!(child_hits.get(), 0);
        assert_eq!(shared.metrics().registered_count, 2);

        let second = frames.next().unwrap();
        shared.update(&second, 0.016);
        assert_eq!(child_hits.get(), 1);
    }

    #[test]
    fn disable_during_frame_applies_after() {
        let shared = SharedDispatcher::default();
        let hits = Rc::new(Cell::new(0_u32));
        shared.register("target", Priority::Low, None, counting(&hits));
        let sh = shared.clone();
        shared.register("switch", Priority::Critical, None, move |_: &FrameState, _: f64| {
            sh.set_enabled("target", false);
            Ok(())
        });

        for state in frames(3) {
            shared.update(&state, 0.016);
        }
        assert_eq!(hits.get(), 1, "ran in the first frame only");
        assert_eq!(shared.metrics().enabled_count, 1);
    }

    #[test]
    fn nested_update_is_refused() {
        let shared = SharedDispatcher::default();
        let nested = Rc::new(Cell::new(None));
        let (sh, n) = (shared.clone(), Rc::clone(&nested));
        shared.register("nest", Priority::High, None, move |state: &FrameState, _: f64| {
            n.set(Some(sh.update(state, 0.016).is_none()));
            Ok(())
        });
        let state = frames(1).next().unwrap();
        assert!(shared.update(&state, 0.016).is_some());
        assert_eq!(nested.get(), Some(true));
    }
}
