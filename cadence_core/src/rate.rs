// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-callback rate limiting.
//!
//! A callback with a [`TargetRate`] runs at most once per
//! `1000 / rate` milliseconds, measured from its last successful run. The
//! check happens after admission, so an admitted callback may still be
//! skipped.

use crate::registry::TargetRate;
use crate::time::HostTime;

/// Returns `true` if a callback that last succeeded at `last_run` may run at
/// `now`.
#[must_use]
pub fn should_run(
    target_rate: Option<TargetRate>,
    last_run: Option<HostTime>,
    now: HostTime,
) -> bool {
    let (Some(rate), Some(last)) = (target_rate, last_run) else {
        return true;
    };
    now.saturating_duration_since(last).as_millis_f64() >= rate.interval_millis()
}
