// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority-based admission under a per-frame cap.
//!
//! Each quality level maps to a cap on how many callbacks may run in one
//! frame. [`admit`] walks the enabled callbacks in priority order and admits
//! `Critical` and `High` unconditionally; `Medium` and `Low` are admitted only
//! while the running total is below the cap.

use alloc::vec::Vec;

use crate::quality::QualityLevel;
use crate::registry::Priority;

/// Per-frame callback caps for the degraded quality levels.
///
/// [`QualityLevel::High`] is always unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionCaps {
    /// Cap at [`QualityLevel::Medium`].
    pub medium: usize,
    /// Cap at [`QualityLevel::Low`].
    pub low: usize,
    /// Cap at [`QualityLevel::Minimal`].
    pub minimal: usize,
}

impl Default for AdmissionCaps {
    fn default() -> Self {
        Self {
            medium: 15,
            low: 8,
            minimal: 4,
        }
    }
}

impl AdmissionCaps {
    /// Returns the cap for `level`, or `None` for no cap.
    #[must_use]
    pub const fn max_runnable(&self, level: QualityLevel) -> Option<usize> {
        match level {
            QualityLevel::High => None,
            QualityLevel::Medium => Some(self.medium),
            QualityLevel::Low => Some(self.low),
            QualityLevel::Minimal => Some(self.minimal),
        }
    }
}

/// Selects this frame's candidates.
///
/// `enabled` must be in registration order; the result is stably sorted by
/// priority, so equal priorities keep registration order.
pub fn admit<T: Copy>(
    enabled: impl IntoIterator<Item = (T, Priority)>,
    cap: Option<usize>,
) -> Vec<T> {
    let mut ordered: Vec<(T, Priority)> = enabled.into_iter().collect();
    ordered.sort_by_key(|&(_, priority)| priority);

    let mut admitted = Vec::with_capacity(ordered.len());
    for (item, priority) in ordered {
        let under_cap = cap.is_none_or(|cap| admitted.len() < cap);
        if priority.is_always_admitted() || under_cap {
            admitted.push(item);
        }
    }
    admitted
}
