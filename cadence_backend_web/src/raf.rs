// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` host loop.
//!
//! [`RafDriver`] drives a [`SharedDispatcher`] using the browser's
//! `requestAnimationFrame` API. Each callback receives a
//! [`DOMHighResTimeStamp`][mdn] (milliseconds from `performance.now()`),
//! which is converted to microsecond [`HostTime`] ticks and a frame delta.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use cadence_core::dispatch::FrameReport;
use cadence_core::frame::FrameState;
use cadence_core::shared::SharedDispatcher;
use cadence_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window/Performance objects are fetched on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// Converts a `DOMHighResTimeStamp` in milliseconds to [`HostTime`].
pub(crate) fn host_time_from_millis(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "rAF timestamp is a small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Turns successive frame timestamps into [`FrameState`]s and deltas.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameTimer {
    last: Option<HostTime>,
    frame_count: u64,
}

impl FrameTimer {
    /// The first frame has delta zero, which leaves the sampler's previous
    /// FPS in place.
    pub(crate) fn advance(&mut self, now: HostTime) -> (FrameState, f64) {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        self.frame_count += 1;
        (FrameState::new(now, self.frame_count), delta)
    }

    /// Forgets the previous timestamp so a restart does not report the
    /// paused interval as one long frame.
    pub(crate) fn pause(&mut self) {
        self.last = None;
    }
}

type RafClosure = Closure<dyn FnMut(f64)>;
type ReportObserver = Box<dyn FnMut(&FrameState, &FrameReport)>;

/// A `requestAnimationFrame` loop that calls
/// [`SharedDispatcher::update`] once per browser frame.
///
/// Create with [`RafDriver::new`], then call [`start`](Self::start). The loop
/// re-registers itself each frame until [`stop`](Self::stop) is called or the
/// `RafDriver` is dropped.
pub struct RafDriver {
    inner: Rc<RafInner>,
}

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Set once in `start()` and referenced from inside itself.
    closure: RefCell<Option<RafClosure>>,

    dispatcher: SharedDispatcher,

    /// Optional per-frame hook, e.g. for a HUD.
    observer: RefCell<Option<ReportObserver>>,

    timer: Cell<FrameTimer>,

    running: Cell<bool>,

    /// The ID returned by the most recent `requestAnimationFrame` call,
    /// used by [`cancel_animation_frame`] when stopping.
    raf_id: Cell<i32>,
}

impl RafDriver {
    /// Creates a driver for `dispatcher` that is **not yet running**.
    pub fn new(dispatcher: SharedDispatcher) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                dispatcher,
                observer: RefCell::new(None),
                timer: Cell::new(FrameTimer::default()),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Calls `observer` with each frame's report after dispatch.
    pub fn set_observer(&self, observer: impl FnMut(&FrameState, &FrameReport) + 'static) {
        *self.inner.observer.borrow_mut() = Some(Box::new(observer));
    }

    /// The dispatcher this driver feeds.
    #[must_use]
    pub fn dispatcher(&self) -> &SharedDispatcher {
        &self.inner.dispatcher
    }

    /// Starts the loop.
    ///
    /// If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
                if !inner.running.get() {
                    return;
                }
                inner.frame(host_time_from_millis(timestamp_ms));

                // Re-register for the next frame if still running.
                if inner.running.get()
                    && let Some(ref closure) = *inner.closure.borrow()
                {
                    let id = request_animation_frame(closure.as_ref().unchecked_ref());
                    inner.raf_id.set(id);
                }
            }) as Box<dyn FnMut(f64)>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        // Register the first frame.
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
    }

    /// Stops the loop.
    ///
    /// The pending `requestAnimationFrame` callback is cancelled. Can be
    /// restarted by calling [`start`](Self::start) again; the first frame
    /// after a restart has delta zero.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
        let mut timer = self.inner.timer.get();
        timer.pause();
        self.inner.timer.set(timer);
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl RafInner {
    fn frame(&self, now: HostTime) {
        let mut timer = self.timer.get();
        let (state, delta) = timer.advance(now);
        self.timer.set(timer);

        let Some(report) = self.dispatcher.update(&state, delta) else {
            return;
        };
        if let Some(observer) = self.observer.borrow_mut().as_mut() {
            observer(&state, &report);
        }
    }
}

impl Drop for RafDriver {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafDriver")
            .field("running", &self.inner.running.get())
            .field("timer", &self.inner.timer.get())
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}
