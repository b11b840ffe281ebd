// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulated host clock.

use alloc::vec::Vec;

use cadence_core::dispatch::{Dispatcher, FrameReport};
use cadence_core::error::CallbackFailure;
use cadence_core::frame::FrameState;
use cadence_core::quality::QualityLevel;
use cadence_core::shared::SharedDispatcher;
use cadence_core::time::{Duration, HostTime};

/// How long each simulated frame takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaProfile {
    /// Every frame has the same delta.
    Steady(Duration),
    /// Frames take `before` until the clock reaches `at`, then `after`.
    Stepped {
        /// Delta before the step.
        before: Duration,
        /// Delta from the step on.
        after: Duration,
        /// Host time at which the step happens.
        at: HostTime,
    },
}

impl DeltaProfile {
    /// A steady profile at `fps` frames per second.
    ///
    /// Returns `None` unless `fps` is finite and positive, and for rates so
    /// high that a frame would round to zero ticks.
    #[must_use]
    pub fn fps(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        let delta = Duration::from_secs_f64(1.0 / fps);
        (delta > Duration::ZERO).then_some(Self::Steady(delta))
    }

    /// Delta of the frame that starts at `now`.
    #[must_use]
    pub fn delta_at(&self, now: HostTime) -> Duration {
        match *self {
            Self::Steady(d) => d,
            Self::Stepped { before, after, at } => {
                if now < at {
                    before
                } else {
                    after
                }
            }
        }
    }
}

/// Aggregate of the frames run by [`FrameClock::run_for`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames dispatched.
    pub frames: u64,
    /// Successful callback runs.
    pub executed: usize,
    /// Admitted callbacks skipped by their rate limit.
    pub rate_limited: usize,
    /// Enabled callbacks shed by admission.
    pub shed: usize,
    /// Every failure, in order.
    pub failures: Vec<CallbackFailure>,
    /// Quality level after the last frame.
    pub final_quality: Option<QualityLevel>,
    /// Lowest quality level seen.
    pub lowest_quality: Option<QualityLevel>,
}

impl RunSummary {
    /// Folds one frame's report into the totals.
    pub fn absorb(&mut self, report: FrameReport) {
        self.frames += 1;
        self.executed += report.executed;
        self.rate_limited += report.rate_limited;
        self.shed += report.shed();
        self.final_quality = Some(report.quality);
        self.lowest_quality = Some(match self.lowest_quality {
            Some(q) => q.min(report.quality),
            None => report.quality,
        });
        self.failures.extend(report.failures);
    }
}

/// Produces `(FrameState, delta_seconds)` pairs from a [`DeltaProfile`].
///
/// The first frame starts one delta after zero, so `elapsed` always equals
/// the sum of the deltas handed out.
#[derive(Clone, Debug)]
pub struct FrameClock {
    state: FrameState,
    profile: DeltaProfile,
}

impl FrameClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new(profile: DeltaProfile) -> Self {
        Self {
            state: FrameState::default(),
            profile,
        }
    }

    /// The state of the most recent frame.
    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Replaces the profile; the clock keeps its current time.
    pub fn set_profile(&mut self, profile: DeltaProfile) {
        self.profile = profile;
    }

    /// Advances one frame.
    pub fn tick(&mut self) -> (FrameState, f64) {
        let delta = self.profile.delta_at(self.state.elapsed);
        self.state = self.state.advance(delta);
        (self.state, delta.as_secs_f64())
    }

    /// Advances one frame and dispatches it.
    pub fn step(&mut self, dispatcher: &mut Dispatcher) -> FrameReport {
        let (state, delta) = self.tick();
        dispatcher.update(&state, delta)
    }

    /// Advances one frame and dispatches it through a shared handle.
    pub fn step_shared(&mut self, dispatcher: &SharedDispatcher) -> Option<FrameReport> {
        let (state, delta) = self.tick();
        dispatcher.update(&state, delta)
    }

    /// Returns `true` while frames started before `end` would move the clock.
    fn advances_before(&self, end: HostTime) -> bool {
        self.state.elapsed < end && self.profile.delta_at(self.state.elapsed) > Duration::ZERO
    }

    /// Dispatches frames until `seconds` of simulated time have passed.
    ///
    /// Stops early if the profile yields a zero delta, since the clock would
    /// never reach the end.
    pub fn run_for(&mut self, dispatcher: &mut Dispatcher, seconds: f64) -> RunSummary {
        let end = self.state.elapsed.saturating_add(Duration::from_secs_f64(seconds));
        let mut summary = RunSummary::default();
        while self.advances_before(end) {
            summary.absorb(self.step(dispatcher));
        }
        summary
    }

    /// Like [`run_for`](Self::run_for), through a shared handle.
    pub fn run_shared_for(&mut self, dispatcher: &SharedDispatcher, seconds: f64) -> RunSummary {
        let end = self.state.elapsed.saturating_add(Duration::from_secs_f64(seconds));
        let mut summary = RunSummary::default();
        while self.advances_before(end) {
            if let Some(report) = self.step_shared(dispatcher) {
                summary.absorb(report);
            }
        }
        summary
    }
}
