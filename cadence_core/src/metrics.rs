// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-in-time snapshot of the dispatcher's state.

use crate::quality::QualityLevel;

/// Snapshot returned by [`Dispatcher::metrics`](crate::dispatch::Dispatcher::metrics).
///
/// Reading metrics never re-samples or re-classifies; `quality_level` is the
/// level computed during the most recent frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    /// FPS of the most recent frame.
    pub instantaneous_fps: f64,
    /// Mean of the recent per-window frame counts.
    pub rolling_average_fps: f64,
    /// Current quality level.
    pub quality_level: QualityLevel,
    /// Registered callbacks, enabled or not.
    pub registered_count: usize,
    /// Registered callbacks that are enabled.
    pub enabled_count: usize,
}
