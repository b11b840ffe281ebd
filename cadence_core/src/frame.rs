// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame state handed to every callback.

use crate::time::{Duration, HostTime};

/// The state of the frame being dispatched.
///
/// Hosts build one of these per rendered frame and pass it to
/// [`Dispatcher::update`](crate::dispatch::Dispatcher::update). `elapsed` is
/// the host's monotonic clock for the frame and is also the `now` the rate
/// limiter compares against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameState {
    /// Host time at which this frame started.
    pub elapsed: HostTime,
    /// Number of frames the host has produced, including this one.
    pub frame_count: u64,
}

impl FrameState {
    /// Creates a frame state.
    #[must_use]
    pub const fn new(elapsed: HostTime, frame_count: u64) -> Self {
        Self {
            elapsed,
            frame_count,
        }
    }

    /// Returns [`elapsed`](Self::elapsed) as fractional seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Returns the state of the following frame, `delta` later.
    #[must_use]
    pub fn advance(self, delta: Duration) -> Self {
        Self {
            elapsed: self.elapsed + delta,
            frame_count: self.frame_count + 1,
        }
    }
}
