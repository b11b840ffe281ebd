// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rolling pacing metrics and letter grading.

use alloc::string::String;

use cadence_core::dispatch::FrameReport;
use cadence_core::quality::QualityLevel;

/// Per-frame sample fed into [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingSample {
    /// Quality level the frame was dispatched at.
    pub quality: QualityLevel,
    /// Frame delta in milliseconds.
    pub frame_delta_ms: f64,
    /// Enabled callbacks this frame.
    pub enabled: usize,
    /// Enabled callbacks shed by admission.
    pub shed: usize,
    /// Callbacks that failed.
    pub failed: usize,
}

impl PacingSample {
    /// Builds a sample from a dispatched frame.
    #[must_use]
    pub fn from_report(report: &FrameReport, frame_delta_ms: f64) -> Self {
        Self {
            quality: report.quality,
            frame_delta_ms,
            enabled: report.enabled,
            shed: report.shed(),
            failed: report.failures.len(),
        }
    }
}

/// Letter grade for how well the dispatcher is keeping up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PacingGrade {
    /// Full quality, nothing shed.
    A,
    /// Minor shedding.
    B,
    /// Degraded but usable.
    C,
    /// Struggling.
    D,
}

impl PacingGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Shed or failed callbacks per 1000 enabled callback-frames.
    pub miss_rate_per_1000: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total enabled callback-frames observed.
    pub total_enabled: u64,
    /// Total shed or failed callback-frames.
    pub total_missed: u64,
}

/// Rolling pacing tracker with fixed-size frame-delta history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    deltas_ms: [f64; N],
    cursor: usize,
    total_frames: u64,
    total_enabled: u64,
    total_missed: u64,
}

impl<const N: usize> Default for PacingTracker<N> {
    fn default() -> Self {
        Self::new(16.67)
    }
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(seed_delta_ms: f64) -> Self {
        Self {
            deltas_ms: [seed_delta_ms; N],
            cursor: 0,
            total_frames: 0,
            total_enabled: 0,
            total_missed: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    pub fn observe(&mut self, sample: PacingSample) -> PacingReport {
        self.total_frames = self.total_frames.saturating_add(1);
        if N > 0 {
            self.deltas_ms[self.cursor] = sample.frame_delta_ms;
            self.cursor = (self.cursor + 1) % N;
        }

        self.total_enabled = self.total_enabled.saturating_add(sample.enabled as u64);
        let missed = sample.shed.saturating_add(sample.failed);
        self.total_missed = self.total_missed.saturating_add(missed as u64);

        let miss_rate = if self.total_enabled == 0 {
            0.0
        } else {
            self.total_missed as f64 * 1000.0 / self.total_enabled as f64
        };

        PacingReport {
            grade: grade_for(sample.quality, miss_rate),
            miss_rate_per_1000: miss_rate,
            total_frames: self.total_frames,
            total_enabled: self.total_enabled,
            total_missed: self.total_missed,
        }
    }

    /// Returns ring-buffer frame deltas oldest→newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.deltas_ms[(self.cursor + i) % N];
        }
        out
    }

    /// Returns an ASCII sparkline over `frame_deltas()`.
    ///
    /// The bounds may be given in either order. An empty or NaN range draws
    /// every sample at the lowest level.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        let span = hi - lo;
        let mut out = String::with_capacity(N);
        for v in self.frame_deltas() {
            let t = if span > 0.0 {
                ((v - lo) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level.min(LEVELS.len() - 1)] as char);
        }
        out
    }
}

fn grade_for(quality: QualityLevel, miss_rate_per_1000: f64) -> PacingGrade {
    // Upper miss-rate bounds for A, B and C at each level.
    let (a_miss, b_miss, c_miss) = match quality {
        QualityLevel::High => (1.0, 50.0, 150.0),
        QualityLevel::Medium => (0.0, 100.0, 300.0),
        QualityLevel::Low => (0.0, 0.0, 500.0),
        QualityLevel::Minimal => (0.0, 0.0, 0.0),
    };

    if miss_rate_per_1000 < a_miss {
        PacingGrade::A
    } else if miss_rate_per_1000 < b_miss {
        PacingGrade::B
    } else if miss_rate_per_1000 < c_miss {
        PacingGrade::C
    } else {
        PacingGrade::D
    }
}
