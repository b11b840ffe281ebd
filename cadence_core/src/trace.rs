// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the dispatch loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the [`Dispatcher`](crate::dispatch::Dispatcher) calls at each stage of a
//! frame. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-candidate
//!   [`CallbackRunEvent`] and [`CallbackSkippedEvent`] events plus the
//!   corresponding `TraceSink` methods.

use crate::error::CallbackError;
use crate::quality::QualityLevel;
use crate::registry::Priority;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame enters the dispatch loop, after sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBeginEvent {
    /// Host frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// Frame delta as reported by the host.
    pub delta: Duration,
    /// Instantaneous FPS after sampling this frame.
    pub instantaneous_fps: f64,
}

/// Emitted when the classified quality level differs from the previous
/// frame's.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityChangeEvent {
    /// Host frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// Level before this frame.
    pub from: QualityLevel,
    /// Level from this frame on.
    pub to: QualityLevel,
    /// Rolling average that produced `to`.
    pub rolling_average_fps: f64,
}

/// Emitted after admission filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionEvent {
    /// Host frame counter.
    pub frame_index: u64,
    /// Quality level driving the cap.
    pub quality: QualityLevel,
    /// Cap for this frame, `None` when unbounded.
    pub cap: Option<u32>,
    /// Enabled callbacks considered.
    pub enabled: u32,
    /// Callbacks admitted.
    pub admitted: u32,
}

/// Emitted when a callback fails.
#[derive(Clone, Copy, Debug)]
pub struct CallbackFailedEvent<'a> {
    /// Host frame counter.
    pub frame_index: u64,
    /// Id of the failing callback.
    pub id: &'a str,
    /// Its priority tier.
    pub priority: Priority,
    /// What went wrong.
    pub error: &'a CallbackError,
}

/// Emitted for each callback that ran successfully (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct CallbackRunEvent<'a> {
    /// Host frame counter.
    pub frame_index: u64,
    /// Id of the callback.
    pub id: &'a str,
    /// Its priority tier.
    pub priority: Priority,
}

/// Why an enabled callback did not run this frame.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Admission cap exhausted before reaching it.
    OverCap,
    /// Admitted, but its target interval had not elapsed.
    RateLimited,
}

/// Emitted for each enabled callback that was skipped (requires
/// `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct CallbackSkippedEvent<'a> {
    /// Host frame counter.
    pub frame_index: u64,
    /// Id of the callback.
    pub id: &'a str,
    /// Its priority tier.
    pub priority: Priority,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Per-frame summary emitted as the loop returns to idle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Host frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// Instantaneous FPS.
    pub instantaneous_fps: f64,
    /// Rolling average FPS.
    pub rolling_average_fps: f64,
    /// Quality level used for admission.
    pub quality: QualityLevel,
    /// Registered callbacks.
    pub registered: u32,
    /// Enabled callbacks.
    pub enabled: u32,
    /// Callbacks admitted.
    pub admitted: u32,
    /// Callbacks that ran successfully.
    pub executed: u32,
    /// Admitted callbacks skipped by their rate limit.
    pub rate_limited: u32,
    /// Callbacks that failed.
    pub failed: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the dispatch loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts dispatching.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called when the quality level changes.
    fn on_quality_change(&mut self, e: &QualityChangeEvent) {
        _ = e;
    }

    /// Called after admission filtering.
    fn on_admission(&mut self, e: &AdmissionEvent) {
        _ = e;
    }

    /// Called when a callback fails.
    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        _ = e;
    }

    /// Called with the per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called when a callback ran (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_callback_run(&mut self, e: &CallbackRunEvent<'_>) {
        _ = e;
    }

    /// Called when a callback was skipped (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`QualityChangeEvent`].
    #[inline]
    pub fn quality_change(&mut self, e: &QualityChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_quality_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AdmissionEvent`].
    #[inline]
    pub fn admission(&mut self, e: &AdmissionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_admission(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CallbackFailedEvent`].
    #[inline]
    pub fn callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_callback_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`CallbackRunEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn callback_run(&mut self, e: &CallbackRunEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_callback_run(e);
        }
    }

    /// Emits a [`CallbackSkippedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_callback_skipped(e);
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
