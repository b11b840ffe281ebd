// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registered per-frame callbacks keyed by a stable string id.
//!
//! The [`Registry`] exclusively owns every [`CallbackRecord`]. Callers hold a
//! [`Registration`] token, which is only needed to unregister. Re-registering
//! an id replaces its record in place: the replacement keeps the slot (and
//! therefore the tie-breaking position) the id was first registered with,
//! but gets a new generation so stale tokens can no longer remove it.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;

use crate::error::CallbackError;
use crate::frame::FrameState;
use crate::time::HostTime;

/// A per-frame callback: receives the frame state and the frame delta in
/// seconds.
pub type Callback = Box<dyn FnMut(&FrameState, f64) -> Result<(), CallbackError>>;

/// Priority tier of a callback. Lower numerals run first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Always admitted, runs first.
    Critical = 0,
    /// Always admitted.
    High = 1,
    /// Admitted while the frame's cap allows.
    Medium = 2,
    /// Admitted while the frame's cap allows, after `Medium`.
    Low = 3,
}

impl Priority {
    /// All tiers in dispatch order.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Returns `true` for tiers that bypass the admission cap.
    #[inline]
    #[must_use]
    pub const fn is_always_admitted(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }

    /// Returns the numeric tier (0 for `Critical` through 3 for `Low`).
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A desired invocation rate in calls per second.
///
/// Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct TargetRate(f64);

impl TargetRate {
    /// Returns `None` unless `per_second` is finite and positive.
    #[must_use]
    pub fn new(per_second: f64) -> Option<Self> {
        (per_second.is_finite() && per_second > 0.0).then_some(Self(per_second))
    }

    /// Returns the rate in calls per second.
    #[inline]
    #[must_use]
    pub const fn per_second(self) -> f64 {
        self.0
    }

    /// Returns the minimum spacing between calls, in milliseconds.
    #[inline]
    #[must_use]
    pub fn interval_millis(self) -> f64 {
        1000.0 / self.0
    }
}

/// One registered per-frame task.
pub struct CallbackRecord {
    id: String,
    priority: Priority,
    target_rate: Option<TargetRate>,
    enabled: bool,
    last_run: Option<HostTime>,
    generation: u64,
    callback: Callback,
}

impl CallbackRecord {
    /// The id this record is registered under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The priority tier.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The optional rate cap.
    #[must_use]
    pub fn target_rate(&self) -> Option<TargetRate> {
        self.target_rate
    }

    /// Whether the record is eligible for admission.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Host time of the last successful run, if any.
    #[must_use]
    pub fn last_run(&self) -> Option<HostTime> {
        self.last_run
    }

    pub(crate) fn set_last_run(&mut self, t: HostTime) {
        self.last_run = Some(t);
    }

    pub(crate) fn invoke(
        &mut self,
        state: &FrameState,
        delta_seconds: f64,
    ) -> Result<(), CallbackError> {
        (self.callback)(state, delta_seconds)
    }
}

impl fmt::Debug for CallbackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRecord")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("target_rate", &self.target_rate)
            .field("enabled", &self.enabled)
            .field("last_run", &self.last_run)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Token returned by [`Registry::register`].
///
/// Unregistering with a token removes exactly the record it was issued for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Registration {
    id: String,
    generation: u64,
}

impl Registration {
    /// The id the token was issued for.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Slot index; slots are handed out in first-registration order.
pub(crate) type Slot = u64;

/// Mapping from id to [`CallbackRecord`], iterated in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    records: BTreeMap<Slot, CallbackRecord>,
    index: HashMap<String, Slot>,
    next_slot: Slot,
    next_generation: u64,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `id`.
    ///
    /// A replacement starts enabled with no previous run.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        priority: Priority,
        target_rate: Option<TargetRate>,
        callback: Callback,
    ) -> Registration {
        let id = id.into();
        let generation = self.next_generation;
        self.next_generation += 1;

        let slot = match self.slot_of(&id) {
            Some(slot) => slot,
            None => {
                let slot = self.next_slot;
                self.next_slot += 1;
                self.index.insert(id.clone(), slot);
                slot
            }
        };

        self.records.insert(
            slot,
            CallbackRecord {
                id: id.clone(),
                priority,
                target_rate,
                enabled: true,
                last_run: None,
                generation,
                callback,
            },
        );

        Registration { id, generation }
    }

    /// Removes the record `registration` was issued for.
    ///
    /// Returns `false` if it was already removed or has since been replaced.
    pub fn unregister(&mut self, registration: &Registration) -> bool {
        let Some(slot) = self.slot_of(&registration.id) else {
            return false;
        };
        if self.records.get(&slot).map(|r| r.generation) != Some(registration.generation) {
            return false;
        }
        self.remove_slot(&registration.id, slot);
        true
    }

    /// Removes whatever record is registered under `id`.
    pub fn unregister_id(&mut self, id: &str) -> bool {
        let Some(slot) = self.slot_of(id) else {
            return false;
        };
        self.remove_slot(id, slot);
        true
    }

    fn remove_slot(&mut self, id: &str, slot: Slot) {
        self.index.remove(id);
        self.records.remove(&slot);
    }

    /// Pauses or resumes `id` without removing it.
    ///
    /// Returns `false` (and does nothing) if `id` is not registered.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.slot_of(id).and_then(|slot| self.records.get_mut(&slot)) {
            Some(record) => {
                record.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns the record registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CallbackRecord> {
        self.slot_of(id).and_then(|slot| self.records.get(&slot))
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of enabled records.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.records.values().filter(|r| r.enabled).count()
    }

    /// Iterates records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CallbackRecord> {
        self.records.values()
    }

    /// Enabled records as `(slot, priority)` in registration order.
    pub(crate) fn enabled_slots(&self) -> impl Iterator<Item = (Slot, Priority)> + '_ {
        self.records
            .iter()
            .filter(|(_, r)| r.enabled)
            .map(|(&slot, r)| (slot, r.priority))
    }

    #[cfg(feature = "trace-rich")]
    pub(crate) fn record(&self, slot: Slot) -> Option<&CallbackRecord> {
        self.records.get(&slot)
    }

    pub(crate) fn record_mut(&mut self, slot: Slot) -> Option<&mut CallbackRecord> {
        self.records.get_mut(&slot)
    }

    fn slot_of(&self, id: &str) -> Option<Slot> {
        self.index.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn noop() -> Callback {
        Box::new(|_, _| Ok(()))
    }

    #[test]
    fn register_replaces_same_id() {
        let mut reg = Registry::new();
        reg.register("a", Priority::Low, None, noop());
        reg.register("b", Priority::Low, None, noop());
        reg.register("a", Priority::Critical, TargetRate::new(30.0), noop());

        assert_eq!(reg.len(), 2, "at most one record per id");
        let a = reg.get("a").unwrap();
        assert_eq!(a.priority(), Priority::Critical);
        assert_eq!(a.target_rate(), TargetRate::new(30.0));

        // Replacement keeps first-registration order.
        let ids: Vec<_> = reg.iter().map(CallbackRecord::id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut reg = Registry::new();
        let token = reg.register("a", Priority::Medium, None, noop());
        reg.register("b", Priority::Medium, None, noop());

        assert!(reg.unregister(&token));
        assert_eq!(reg.len(), 1);
        assert!(!reg.unregister(&token));
        assert_eq!(reg.len(), 1, "second call changes nothing");
    }

    #[test]
    fn stale_token_does_not_remove_replacement() {
        let mut reg = Registry::new();
        let old = reg.register("a", Priority::Medium, None, noop());
        let new = reg.register("a", Priority::High, None, noop());

        assert!(!reg.unregister(&old));
        assert!(reg.contains("a"));
        assert!(reg.unregister(&new));
        assert!(!reg.contains("a"));
    }

    #[test]
    fn set_enabled_toggles_and_ignores_unknown() {
        let mut reg = Registry::new();
        reg.register("a", Priority::Low, None, noop());

        assert!(reg.set_enabled("a", false));
        assert_eq!(reg.enabled_count(), 0);
        assert_eq!(reg.len(), 1, "disabling keeps the record");
        assert!(reg.set_enabled("a", true));
        assert_eq!(reg.enabled_count(), 1);

        assert!(!reg.set_enabled("missing", false));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn replacement_resets_enabled_and_last_run() {
        let mut reg = Registry::new();
        reg.register("a", Priority::Low, None, noop());
        reg.set_enabled("a", false);
        reg.record_mut(0).unwrap().set_last_run(HostTime(5));

        reg.register("a", Priority::Low, None, noop());
        let a = reg.get("a").unwrap();
        assert!(a.is_enabled());
        assert_eq!(a.last_run(), None);
    }

    #[test]
    fn target_rate_rejects_non_positive() {
        assert!(TargetRate::new(0.0).is_none());
        assert!(TargetRate::new(-5.0).is_none());
        assert!(TargetRate::new(f64::NAN).is_none());
        assert!(TargetRate::new(f64::INFINITY).is_none());
        let r = TargetRate::new(10.0).unwrap();
        assert!((r.interval_millis() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn priority_order() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert!(Priority::High.is_always_admitted());
        assert!(!Priority::Medium.is_always_admitted());
    }
}
