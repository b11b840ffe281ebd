// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame dispatch loop.
//!
//! A [`Dispatcher`] owns the callback [`Registry`], the [`Sampler`] and the
//! current [`QualityLevel`]. The host calls [`Dispatcher::update`] once per
//! rendered frame; each call walks the phases below and returns to
//! [`DispatchPhase::Idle`]:
//!
//! ```text
//!   Idle ─► Sampling ─► Classifying ─► Filtering ─► Executing ─► Idle
//!           (fps)       (quality)      (admission)  (rate limit, invoke)
//! ```
//!
//! A failing callback is isolated: its error is logged, reported to the
//! trace sink and collected in the [`FrameReport`], and the remaining
//! candidates still run.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::admission::{AdmissionCaps, admit};
use crate::error::{CallbackError, CallbackFailure};
use crate::frame::FrameState;
use crate::metrics::Metrics;
use crate::quality::{QualityLevel, QualityThresholds};
use crate::rate::should_run;
use crate::registry::{
    Callback, CallbackRecord, Priority, Registration, Registry, Slot, TargetRate,
};
use crate::sampler::{Sampler, SamplerConfig};
use crate::time::Duration;
use crate::trace::{
    AdmissionEvent, CallbackFailedEvent, FrameBeginEvent, FrameSummary, QualityChangeEvent,
    Tracer,
};

/// Configuration for a [`Dispatcher`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DispatchConfig {
    /// FPS sampling parameters.
    pub sampler: SamplerConfig,
    /// FPS boundaries between quality levels.
    pub thresholds: QualityThresholds,
    /// Per-frame caps for the degraded quality levels.
    pub caps: AdmissionCaps,
}

impl DispatchConfig {
    /// Configuration for a browser host driven by `requestAnimationFrame`.
    #[must_use]
    pub fn web() -> Self {
        Self {
            sampler: SamplerConfig {
                initial_fps: 60.0,
                window: Duration::SECOND,
                history_len: 10,
            },
            thresholds: QualityThresholds {
                high: 55.0,
                medium: 40.0,
                low: 25.0,
            },
            caps: AdmissionCaps {
                medium: 15,
                low: 8,
                minimal: 4,
            },
        }
    }
}

/// Where the dispatcher is within a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
    /// Between frames.
    #[default]
    Idle,
    /// Updating the FPS sampler.
    Sampling,
    /// Recomputing the quality level.
    Classifying,
    /// Selecting this frame's candidates.
    Filtering,
    /// Running admitted callbacks.
    Executing,
}

/// What happened to one admitted callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The callback ran and succeeded.
    Ran,
    /// Its target interval had not elapsed.
    RateLimited,
    /// The callback ran and failed.
    Failed(CallbackError),
}

/// The result of one [`Dispatcher::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// The host frame counter passed in.
    pub frame_count: u64,
    /// Quality level used for admission.
    pub quality: QualityLevel,
    /// Enabled callbacks considered for admission.
    pub enabled: usize,
    /// Callbacks that passed admission.
    pub admitted: usize,
    /// Callbacks that ran successfully.
    pub executed: usize,
    /// Admitted callbacks skipped by their rate limit.
    pub rate_limited: usize,
    /// Callbacks that failed, in execution order.
    pub failures: Vec<CallbackFailure>,
}

impl FrameReport {
    fn new(frame_count: u64, quality: QualityLevel, enabled: usize, admitted: usize) -> Self {
        Self {
            frame_count,
            quality,
            enabled,
            admitted,
            executed: 0,
            rate_limited: 0,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, id: &str, outcome: CallbackOutcome) {
        match outcome {
            CallbackOutcome::Ran => self.executed += 1,
            CallbackOutcome::RateLimited => self.rate_limited += 1,
            CallbackOutcome::Failed(error) => self.failures.push(CallbackFailure {
                id: id.to_string(),
                error,
            }),
        }
    }

    /// Enabled callbacks shed by the admission cap.
    #[must_use]
    pub fn shed(&self) -> usize {
        self.enabled.saturating_sub(self.admitted)
    }

    /// Returns `true` if no callback failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Adaptive per-frame callback dispatcher.
///
/// Instances are independent; nothing is global.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
    registry: Registry,
    sampler: Sampler,
    quality: QualityLevel,
    phase: DispatchPhase,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        let sampler = Sampler::new(config.sampler);
        let quality = config.thresholds.classify(sampler.rolling_average());
        Self {
            config,
            registry: Registry::new(),
            sampler,
            quality,
            phase: DispatchPhase::Idle,
        }
    }

    /// Registers `callback` under `id`, replacing any existing record.
    ///
    /// A `target_rate` that is not finite and positive is ignored with a
    /// warning; the callback then runs every admitted frame.
    pub fn register<F>(
        &mut self,
        id: impl Into<String>,
        priority: Priority,
        target_rate: Option<f64>,
        callback: F,
    ) -> Registration
    where
        F: FnMut(&FrameState, f64) -> Result<(), CallbackError> + 'static,
    {
        self.register_boxed(id.into(), priority, target_rate, Box::new(callback))
    }

    pub(crate) fn register_boxed(
        &mut self,
        id: String,
        priority: Priority,
        target_rate: Option<f64>,
        callback: Callback,
    ) -> Registration {
        let rate = target_rate.and_then(|raw| {
            let rate = TargetRate::new(raw);
            if rate.is_none() {
                log::warn!("callback `{id}`: ignoring invalid target rate {raw}");
            }
            rate
        });
        if self.registry.contains(&id) {
            log::debug!("replacing callback `{id}` ({priority:?})");
        } else {
            log::debug!("registering callback `{id}` ({priority:?})");
        }
        self.registry.register(id, priority, rate, callback)
    }

    /// Removes the record `registration` was issued for.
    ///
    /// Idempotent; returns `false` if nothing was removed.
    pub fn unregister(&mut self, registration: &Registration) -> bool {
        let removed = self.registry.unregister(registration);
        if removed {
            log::debug!("unregistered callback `{}`", registration.id());
        }
        removed
    }

    /// Removes whatever is registered under `id`.
    pub fn unregister_id(&mut self, id: &str) -> bool {
        let removed = self.registry.unregister_id(id);
        if removed {
            log::debug!("unregistered callback `{id}`");
        }
        removed
    }

    /// Pauses or resumes `id`. Returns `false` if `id` is not registered.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        self.registry.set_enabled(id, enabled)
    }

    /// Returns a snapshot of the current measurements and counts.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        Metrics {
            instantaneous_fps: self.sampler.instantaneous(),
            rolling_average_fps: self.sampler.rolling_average(),
            quality_level: self.quality,
            registered_count: self.registry.len(),
            enabled_count: self.registry.enabled_count(),
        }
    }

    /// Quality level computed during the most recent frame.
    #[must_use]
    pub fn quality(&self) -> QualityLevel {
        self.quality
    }

    /// Current phase; `Idle` whenever control is outside [`update`](Self::update).
    #[must_use]
    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    /// Read access to the registered callbacks.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration this dispatcher was created with.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Runs one frame.
    pub fn update(&mut self, state: &FrameState, delta_seconds: f64) -> FrameReport {
        self.update_traced(state, delta_seconds, &mut Tracer::none())
    }

    /// Runs one frame, emitting trace events to `tracer`.
    pub fn update_traced(
        &mut self,
        state: &FrameState,
        delta_seconds: f64,
        tracer: &mut Tracer<'_>,
    ) -> FrameReport {
        let frame_index = state.frame_count;
        let now = state.elapsed;

        self.phase = DispatchPhase::Sampling;
        let instantaneous_fps = self.sampler.sample(delta_seconds);
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            now,
            delta: Duration::from_secs_f64(delta_seconds),
            instantaneous_fps,
        });

        self.phase = DispatchPhase::Classifying;
        let rolling_average_fps = self.sampler.rolling_average();
        let quality = self.config.thresholds.classify(rolling_average_fps);
        if quality != self.quality {
            log::debug!(
                "quality {} -> {} at {rolling_average_fps:.1} fps",
                self.quality,
                quality
            );
            tracer.quality_change(&QualityChangeEvent {
                frame_index,
                now,
                from: self.quality,
                to: quality,
                rolling_average_fps,
            });
            self.quality = quality;
        }

        self.phase = DispatchPhase::Filtering;
        let cap = self.config.caps.max_runnable(quality);
        let enabled: Vec<(Slot, Priority)> = self.registry.enabled_slots().collect();
        let admitted = admit(enabled.iter().copied(), cap);
        log::trace!(
            "frame {frame_index}: admitted {} of {} at quality {quality}",
            admitted.len(),
            enabled.len()
        );
        tracer.admission(&AdmissionEvent {
            frame_index,
            quality,
            cap: cap.map(count32),
            enabled: count32(enabled.len()),
            admitted: count32(admitted.len()),
        });
        #[cfg(feature = "trace-rich")]
        if tracer.is_active() {
            self.trace_over_cap(frame_index, &enabled, &admitted, tracer);
        }

        self.phase = DispatchPhase::Executing;
        let mut report = FrameReport::new(frame_index, quality, enabled.len(), admitted.len());
        for slot in admitted {
            let Some(record) = self.registry.record_mut(slot) else {
                continue;
            };
            let outcome = if should_run(record.target_rate(), record.last_run(), now) {
                match invoke_guarded(record, state, delta_seconds) {
                    Ok(()) => {
                        record.set_last_run(now);
                        CallbackOutcome::Ran
                    }
                    Err(error) => {
                        log::warn!("callback `{}` failed: {error}", record.id());
                        tracer.callback_failed(&CallbackFailedEvent {
                            frame_index,
                            id: record.id(),
                            priority: record.priority(),
                            error: &error,
                        });
                        CallbackOutcome::Failed(error)
                    }
                }
            } else {
                CallbackOutcome::RateLimited
            };
            #[cfg(feature = "trace-rich")]
            trace_outcome(frame_index, record, &outcome, tracer);
            report.record(record.id(), outcome);
        }

        self.phase = DispatchPhase::Idle;
        tracer.frame_summary(&FrameSummary {
            frame_index,
            now,
            instantaneous_fps,
            rolling_average_fps,
            quality,
            registered: count32(self.registry.len()),
            enabled: count32(enabled.len()),
            admitted: count32(report.admitted),
            executed: count32(report.executed),
            rate_limited: count32(report.rate_limited),
            failed: count32(report.failures.len()),
        });
        report
    }

    #[cfg(feature = "trace-rich")]
    fn trace_over_cap(
        &self,
        frame_index: u64,
        enabled: &[(Slot, Priority)],
        admitted: &[Slot],
        tracer: &mut Tracer<'_>,
    ) {
        use crate::trace::{CallbackSkippedEvent, SkipReason};

        if enabled.len() == admitted.len() {
            return;
        }
        let admitted: hashbrown::HashSet<Slot> = admitted.iter().copied().collect();
        for &(slot, priority) in enabled {
            if admitted.contains(&slot) {
                continue;
            }
            if let Some(record) = self.registry.record(slot) {
                tracer.callback_skipped(&CallbackSkippedEvent {
                    frame_index,
                    id: record.id(),
                    priority,
                    reason: SkipReason::OverCap,
                });
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

#[cfg(feature = "trace-rich")]
fn trace_outcome(
    frame_index: u64,
    record: &CallbackRecord,
    outcome: &CallbackOutcome,
    tracer: &mut Tracer<'_>,
) {
    use crate::trace::{CallbackRunEvent, CallbackSkippedEvent, SkipReason};

    match outcome {
        CallbackOutcome::Ran => tracer.callback_run(&CallbackRunEvent {
            frame_index,
            id: record.id(),
            priority: record.priority(),
        }),
        CallbackOutcome::RateLimited => tracer.callback_skipped(&CallbackSkippedEvent {
            frame_index,
            id: record.id(),
            priority: record.priority(),
            reason: SkipReason::RateLimited,
        }),
        CallbackOutcome::Failed(_) => {}
    }
}

/// Invokes the callback, turning a panic into [`CallbackError::Panicked`]
/// when unwinding can be caught.
fn invoke_guarded(
    record: &mut CallbackRecord,
    state: &FrameState,
    delta_seconds: f64,
) -> Result<(), CallbackError> {
    #[cfg(feature = "std")]
    {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            record.invoke(state, delta_seconds)
        }))
        .unwrap_or(Err(CallbackError::Panicked))
    }
    #[cfg(not(feature = "std"))]
    {
        record.invoke(state, delta_seconds)
    }
}

fn count32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::{Cell, RefCell};

    fn frames(delta_ms: u64) -> impl Iterator<Item = (FrameState, f64)> {
        frames_of(Duration::from_millis(delta_ms))
    }

    fn frames_of(delta: Duration) -> impl Iterator<Item = (FrameState, f64)> {
        let mut state = FrameState::default();
        core::iter::from_fn(move || {
            state = state.advance(delta);
            Some((state, delta.as_secs_f64()))
        })
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&FrameState, f64) -> Result<(), CallbackError>) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move |_: &FrameState, _: f64| {
            c.set(c.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn starts_idle_at_high_quality() {
        let d = Dispatcher::default();
        assert_eq!(d.phase(), DispatchPhase::Idle);
        assert_eq!(d.quality(), QualityLevel::High);
        let m = d.metrics();
        assert_eq!(m.registered_count, 0);
        assert!((m.instantaneous_fps - 60.0).abs() < 1e-9);
    }

    #[test]
    fn web_preset_matches_defaults() {
        assert_eq!(DispatchConfig::web(), DispatchConfig::default());
    }

    #[test]
    fn unthrottled_callback_runs_every_frame() {
        let mut d = Dispatcher::default();
        let (count, cb) = counter();
        d.register("spin", Priority::Medium, None, cb);
        for (state, delta) in frames(16).take(5) {
            let report = d.update(&state, delta);
            assert_eq!(report.executed, 1);
            assert_eq!(d.phase(), DispatchPhase::Idle);
        }
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn ten_hz_callback_at_sixty_fps() {
        let mut d = Dispatcher::default();
        let (count, cb) = counter();
        d.register("pulse", Priority::Medium, Some(10.0), cb);
        for (state, delta) in frames_of(Duration::from_secs_f64(1.0 / 60.0)).take(120) {
            d.update(&state, delta);
        }
        let runs = count.get();
        assert!((19..=21).contains(&runs), "expected about 20 runs, got {runs}");
    }

    #[test]
    fn rate_limited_runs_never_come_closer_than_the_interval() {
        let mut d = Dispatcher::default();
        let runs = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&runs);
        d.register("fx", Priority::Medium, Some(30.0), move |state: &FrameState, _: f64| {
            r.borrow_mut().push(state.elapsed);
            Ok(())
        });
        for (state, delta) in frames(16).take(20) {
            d.update(&state, delta);
        }

        let runs = runs.borrow();
        assert!(runs.len() >= 2, "expected several runs, got {}", runs.len());
        let interval_ms = TargetRate::new(30.0).unwrap().interval_millis();
        for pair in runs.windows(2) {
            let gap = pair[1].saturating_duration_since(pair[0]).as_millis_f64();
            assert!(gap >= interval_ms, "runs {gap} ms apart, interval {interval_ms} ms");
        }
        let last = d.registry().get("fx").unwrap().last_run();
        assert_eq!(last, runs.last().copied(), "last_run is the time of the last run");
    }

    #[test]
    fn callbacks_run_in_priority_then_registration_order() {
        let mut d = Dispatcher::default();
        let order = Rc::new(RefCell::new(Vec::<&'static str>::new()));
        for (id, priority) in [
            ("low", Priority::Low),
            ("med-a", Priority::Medium),
            ("crit", Priority::Critical),
            ("med-b", Priority::Medium),
            ("high", Priority::High),
        ] {
            let order = Rc::clone(&order);
            d.register(id, priority, None, move |_: &FrameState, _: f64| {
                order.borrow_mut().push(id);
                Ok(())
            });
        }
        let (state, delta) = frames(16).next().unwrap();
        d.update(&state, delta);
        assert_eq!(*order.borrow(), ["crit", "high", "med-a", "med-b", "low"]);
    }

    #[test]
    fn failure_is_isolated_and_reported() {
        let mut d = Dispatcher::default();
        let (before, cb_before) = counter();
        let (after, cb_after) = counter();
        d.register("before", Priority::High, None, cb_before);
        d.register("broken", Priority::High, None, |_: &FrameState, _: f64| {
            Err(CallbackError::failed("no mesh"))
        });
        d.register("after", Priority::High, None, cb_after);

        let (state, delta) = frames(16).next().unwrap();
        let report = d.update(&state, delta);

        assert_eq!(before.get(), 1);
        assert_eq!(after.get(), 1, "later callbacks still run");
        assert_eq!(report.executed, 2);
        assert_eq!(
            report.failures,
            vec![CallbackFailure {
                id: String::from("broken"),
                error: CallbackError::failed("no mesh"),
            }]
        );
        assert!(d.registry().contains("broken"), "failures do not unregister");
        assert_eq!(d.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn failed_run_does_not_advance_rate_anchor() {
        let mut d = Dispatcher::default();
        let attempts = Rc::new(Cell::new(0_u32));
        let a = Rc::clone(&attempts);
        d.register("flaky", Priority::High, Some(1.0), move |_: &FrameState, _: f64| {
            a.set(a.get() + 1);
            Err(CallbackError::failed("again"))
        });
        for (state, delta) in frames(16).take(3) {
            d.update(&state, delta);
        }
        assert_eq!(attempts.get(), 3, "retried next frame, not rate limited");
        assert_eq!(d.registry().get("flaky").unwrap().last_run(), None);
    }

    #[test]
    fn invalid_target_rate_means_unthrottled() {
        let mut d = Dispatcher::default();
        let (count, cb) = counter();
        d.register("bad", Priority::Low, Some(-5.0), cb);
        assert_eq!(d.registry().get("bad").unwrap().target_rate(), None);
        for (state, delta) in frames(16).take(4) {
            d.update(&state, delta);
        }
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn disabled_callbacks_are_skipped_but_counted() {
        let mut d = Dispatcher::default();
        let (count, cb) = counter();
        d.register("a", Priority::Critical, None, cb);
        assert!(d.set_enabled("a", false));
        let (state, delta) = frames(16).next().unwrap();
        let report = d.update(&state, delta);
        assert_eq!(report.admitted, 0);
        assert_eq!(count.get(), 0);
        let m = d.metrics();
        assert_eq!((m.registered_count, m.enabled_count), (1, 0));
    }

    #[test]
    fn slow_frames_degrade_quality_and_cap_admission() {
        let mut d = Dispatcher::default();
        for i in 0..10 {
            d.register(alloc::format!("fx{i}"), Priority::Low, None, |_: &FrameState, _: f64| {
                Ok(())
            });
        }
        let mut last = None;
        // Two seconds at 20 FPS.
        for (state, delta) in frames(50).take(40) {
            last = Some(d.update(&state, delta));
        }
        let report = last.unwrap();
        assert_eq!(d.quality(), QualityLevel::Minimal);
        assert_eq!(report.admitted, 4, "minimal cap");
        assert!((d.metrics().rolling_average_fps - 20.0).abs() < 1e-9);
    }

    #[test]
    fn independent_dispatchers_do_not_share_state() {
        let mut a = Dispatcher::default();
        let b = Dispatcher::default();
        a.register("x", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
        assert_eq!(a.metrics().registered_count, 1);
        assert_eq!(b.metrics().registered_count, 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_callback_is_contained() {
        let mut d = Dispatcher::default();
        let (count, cb) = counter();
        d.register("boom", Priority::High, None, |_: &FrameState, _: f64| {
            panic!("boom");
        });
        d.register("fine", Priority::High, None, cb);
        let (state, delta) = frames(16).next().unwrap();
        let report = d.update(&state, delta);
        assert_eq!(count.get(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error, CallbackError::Panicked);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn traced_update_reports_quality_change_and_summary() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Sink {
            changes: Vec<(QualityLevel, QualityLevel)>,
            summaries: u32,
            failed: Vec<String>,
        }
        impl TraceSink for Sink {
            fn on_quality_change(&mut self, e: &QualityChangeEvent) {
                self.changes.push((e.from, e.to));
            }
            fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
                self.failed.push(e.id.to_string());
            }
            fn on_frame_summary(&mut self, _: &FrameSummary) {
                self.summaries += 1;
            }
        }

        let mut d = Dispatcher::default();
        d.register("oops", Priority::Low, None, |_: &FrameState, _: f64| {
            Err(CallbackError::failed("x"))
        });
        let mut sink = Sink::default();
        let mut tracer = Tracer::new(&mut sink);
        for (state, delta) in frames(50).take(20) {
            d.update_traced(&state, delta, &mut tracer);
        }
        drop(tracer);

        assert_eq!(sink.summaries, 20);
        assert_eq!(sink.failed.len(), 20);
        assert_eq!(sink.changes, [(QualityLevel::High, QualityLevel::Minimal)]);
    }

    #[cfg(feature = "trace-rich")]
    #[test]
    fn over_cap_skips_name_each_shed_callback_once() {
        use crate::trace::{CallbackSkippedEvent, SkipReason, TraceSink};

        #[derive(Default)]
        struct Skips(Vec<String>);
        impl TraceSink for Skips {
            fn on_callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
                if e.reason == SkipReason::OverCap {
                    self.0.push(e.id.to_string());
                }
            }
        }

        // Thresholds above any real rate pin the dispatcher at Minimal.
        let config = DispatchConfig {
            thresholds: QualityThresholds {
                high: 1000.0,
                medium: 900.0,
                low: 800.0,
            },
            ..DispatchConfig::default()
        };
        let mut d = Dispatcher::new(config);
        for i in 0..7 {
            d.register(alloc::format!("fx{i}"), Priority::Low, None, |_: &FrameState, _: f64| {
                Ok(())
            });
        }

        let mut sink = Skips::default();
        let mut tracer = Tracer::new(&mut sink);
        let (state, delta) = frames(16).next().unwrap();
        let report = d.update_traced(&state, delta, &mut tracer);
        drop(tracer);

        assert_eq!(report.admitted, 4);
        assert_eq!(sink.0, ["fx4", "fx5", "fx6"]);
    }
}
