// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rolling FPS to discrete quality level.
//!
//! [`QualityThresholds::classify`] is a total step function with no
//! hysteresis: a rolling average hovering around a boundary can flip the
//! level on consecutive frames.

use core::fmt;

/// Discrete classification of recent rendering performance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityLevel {
    /// Rendering is struggling; shed as much optional work as possible.
    Minimal = 0,
    /// Below target.
    Low = 1,
    /// Slightly below target.
    Medium = 2,
    /// At or near target frame rate; nothing is shed.
    High = 3,
}

impl QualityLevel {
    /// Returns the numeric level (0 to 3).
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`as_u8`](Self::as_u8); values above 3 map to `High`.
    #[must_use]
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Minimal,
            1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// FPS boundaries between quality levels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityThresholds {
    /// Strictly above this is [`QualityLevel::High`].
    pub high: f64,
    /// At or above this (and not high) is [`QualityLevel::Medium`].
    pub medium: f64,
    /// At or above this (and not medium) is [`QualityLevel::Low`].
    pub low: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            high: 55.0,
            medium: 40.0,
            low: 25.0,
        }
    }
}

impl QualityThresholds {
    /// Maps a rolling-average FPS to a quality level.
    ///
    /// NaN classifies as [`QualityLevel::Minimal`].
    #[must_use]
    pub fn classify(&self, fps: f64) -> QualityLevel {
        if fps > self.high {
            QualityLevel::High
        } else if fps >= self.medium {
            QualityLevel::Medium
        } else if fps >= self.low {
            QualityLevel::Low
        } else {
            QualityLevel::Minimal
        }
    }
}

/// Classifies `fps` with the default thresholds.
#[must_use]
pub fn classify(fps: f64) -> QualityLevel {
    QualityThresholds::default().classify(fps)
}
