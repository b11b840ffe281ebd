// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host for cadence.
//!
//! This crate connects a [`SharedDispatcher`](cadence_core::shared::SharedDispatcher)
//! to the browser's frame loop:
//!
//! - [`RafDriver`]: `requestAnimationFrame` loop that dispatches once per
//!   browser frame
//! - [`now`] and [`timebase`]: `performance.now()` as [`HostTime`]

#![no_std]

extern crate alloc;

mod raf;

pub use raf::RafDriver;

use cadence_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    raf::host_time_from_millis(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}
