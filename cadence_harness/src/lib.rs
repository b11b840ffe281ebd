// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulation and pacing metrics for dispatcher scenarios.
//!
//! [`FrameClock`] stands in for a host render loop: it hands out
//! [`FrameState`](cadence_core::frame::FrameState)s from a [`DeltaProfile`]
//! and drives a dispatcher frame by frame, so scenarios like "two seconds at
//! 20 FPS" run instantly and reproducibly. [`PacingTracker`] grades the
//! resulting frames for HUDs and demo output.

#![no_std]

extern crate alloc;

mod clock;
mod pacing;

pub use clock::{DeltaProfile, FrameClock, RunSummary};
pub use pacing::{PacingGrade, PacingReport, PacingSample, PacingTracker};
