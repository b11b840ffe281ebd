// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instantaneous and rolling frames-per-second measurement.
//!
//! The [`Sampler`] derives two numbers from successive frame deltas:
//!
//! - the **instantaneous** rate, `1 / delta`, for the most recent frame;
//! - the **rolling average**, the mean of the last `history_len` per-window
//!   frame counts. A window closes once the accumulated frame time reaches
//!   [`SamplerConfig::window`]; the number of frames seen in it becomes one
//!   sample.
//!
//! Frame time is accumulated in integer ticks so that, for example, twenty
//! 50 ms frames close a one-second window exactly.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::time::Duration;

/// Configuration for the [`Sampler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Instantaneous FPS reported before the first valid delta.
    pub initial_fps: f64,
    /// Length of one averaging window.
    pub window: Duration,
    /// Number of per-window samples kept for the rolling average.
    pub history_len: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            initial_fps: 60.0,
            window: Duration::SECOND,
            history_len: 10,
        }
    }
}

/// Tracks instantaneous and rolling-average frames per second.
#[derive(Clone, Debug)]
pub struct Sampler {
    config: SamplerConfig,
    instantaneous: f64,
    window_elapsed: Duration,
    window_frames: u32,
    history: VecDeque<u32>,
    windows_closed: u64,
}

impl Sampler {
    /// Creates a sampler with an empty history.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            instantaneous: config.initial_fps,
            window_elapsed: Duration::ZERO,
            window_frames: 0,
            history: VecDeque::with_capacity(config.history_len),
            windows_closed: 0,
            config,
        }
    }

    /// Records one frame and returns its instantaneous FPS.
    ///
    /// A zero, negative or non-finite delta leaves the instantaneous value
    /// unchanged. The frame still counts toward the current window.
    pub fn sample(&mut self, delta_seconds: f64) -> f64 {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.instantaneous = 1.0 / delta_seconds;
        }

        self.window_frames = self.window_frames.saturating_add(1);
        self.window_elapsed = self
            .window_elapsed
            .saturating_add(Duration::from_secs_f64(delta_seconds));

        if self.window_elapsed >= self.config.window {
            self.close_window();
        }

        self.instantaneous
    }

    fn close_window(&mut self) {
        if self.config.history_len > 0 {
            if self.history.len() == self.config.history_len {
                self.history.pop_front();
            }
            self.history.push_back(self.window_frames);
        }
        self.windows_closed += 1;
        self.window_frames = 0;
        self.window_elapsed = Duration::ZERO;
    }

    /// FPS of the most recent frame.
    #[must_use]
    pub fn instantaneous(&self) -> f64 {
        self.instantaneous
    }

    /// Mean of the recorded per-window samples, or the instantaneous FPS if
    /// no window has closed yet.
    #[must_use]
    pub fn rolling_average(&self) -> f64 {
        if self.history.is_empty() {
            return self.instantaneous;
        }
        let sum: u64 = self.history.iter().map(|&n| u64::from(n)).sum();
        sum as f64 / self.history.len() as f64
    }

    /// Per-window samples, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<u32> {
        self.history.iter().copied().collect()
    }

    /// Number of windows closed since creation.
    #[must_use]
    pub fn windows_closed(&self) -> u64 {
        self.windows_closed
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(SamplerConfig::default())
    }
}
