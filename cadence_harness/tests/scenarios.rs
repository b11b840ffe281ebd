// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end dispatch scenarios on a simulated clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cadence_core::dispatch::{DispatchConfig, Dispatcher};
use cadence_core::error::CallbackError;
use cadence_core::frame::FrameState;
use cadence_core::quality::QualityLevel;
use cadence_core::registry::Priority;
use cadence_core::shared::{SharedDispatcher, Unregister};
use cadence_core::time::{Duration, HostTime};
use cadence_harness::{DeltaProfile, FrameClock, PacingGrade, PacingSample, PacingTracker};

type Effect = Box<dyn FnMut(&FrameState, f64) -> Result<(), CallbackError>>;

fn counting(hits: &Rc<Cell<u32>>) -> Effect {
    let hits = Rc::clone(hits);
    Box::new(move |_: &FrameState, _: f64| {
        hits.set(hits.get() + 1);
        Ok(())
    })
}

#[test]
fn ten_hz_effect_runs_about_twenty_times_in_two_seconds() {
    let mut dispatcher = Dispatcher::new(DispatchConfig::web());
    let hits = Rc::new(Cell::new(0));
    dispatcher.register("shimmer", Priority::Medium, Some(10.0), counting(&hits));

    let mut clock = FrameClock::new(DeltaProfile::fps(60.0).unwrap());
    let summary = clock.run_for(&mut dispatcher, 2.0);

    let runs = hits.get();
    assert_eq!(summary.frames, 120);
    assert!((19..=21).contains(&runs), "expected 20 +/- 1 runs, got {runs}");
    assert_eq!(summary.executed, runs as usize);
    assert_eq!(summary.final_quality, Some(QualityLevel::High));
}

#[test]
fn twenty_fps_degrades_to_minimal() {
    let mut dispatcher = Dispatcher::default();
    let mut clock = FrameClock::new(DeltaProfile::fps(20.0).unwrap());
    clock.run_for(&mut dispatcher, 2.0);

    let metrics = dispatcher.metrics();
    assert!(
        (metrics.rolling_average_fps - 20.0).abs() < 1e-9,
        "rolling average was {}",
        metrics.rolling_average_fps
    );
    assert_eq!(metrics.quality_level, QualityLevel::Minimal);
    assert_eq!(metrics.quality_level.as_u8(), 0);
}

#[test]
fn admission_under_load_keeps_critical_and_high() {
    let mut dispatcher = Dispatcher::default();
    let tiers = [
        (Priority::Critical, 3),
        (Priority::High, 2),
        (Priority::Medium, 10),
        (Priority::Low, 5),
    ];
    let mut counters = Vec::new();
    for (priority, n) in tiers {
        for i in 0..n {
            let hits = Rc::new(Cell::new(0));
            dispatcher.register(format!("{priority:?}-{i}"), priority, None, counting(&hits));
            counters.push((priority, hits));
        }
    }

    // 30 FPS is Low quality: cap 8.
    let mut clock = FrameClock::new(DeltaProfile::fps(30.0).unwrap());
    let summary = clock.run_for(&mut dispatcher, 1.0);
    assert_eq!(dispatcher.quality(), QualityLevel::Low);

    let frames = u32::try_from(summary.frames).unwrap();
    for (priority, hits) in &counters {
        if priority.is_always_admitted() {
            assert_eq!(hits.get(), frames, "{priority:?} callbacks run every frame");
        }
    }
    // The first three Medium callbacks fill the remaining cap; Low never runs.
    let medium: Vec<u32> = counters
        .iter()
        .filter(|(p, _)| *p == Priority::Medium)
        .map(|(_, h)| h.get())
        .collect();
    assert_eq!(&medium[..3], &[frames; 3]);
    assert!(medium[3..].iter().all(|&h| h == 0));
    assert!(
        counters
            .iter()
            .filter(|(p, _)| *p == Priority::Low)
            .all(|(_, h)| h.get() == 0)
    );
    assert_eq!(summary.shed, 12 * usize::try_from(summary.frames).unwrap());
}

#[test]
fn failing_effect_does_not_stop_the_frame() {
    let mut dispatcher = Dispatcher::default();
    let before = Rc::new(Cell::new(0));
    let after = Rc::new(Cell::new(0));
    dispatcher.register("before", Priority::High, None, counting(&before));
    dispatcher.register("flaky", Priority::High, None, |state: &FrameState, _: f64| {
        if state.frame_count % 2 == 0 {
            Err(CallbackError::failed("even frame"))
        } else {
            Ok(())
        }
    });
    dispatcher.register("panicky", Priority::Medium, None, |_: &FrameState, _: f64| {
        panic!("effect bug")
    });
    dispatcher.register("after", Priority::Low, None, counting(&after));

    let mut clock = FrameClock::new(DeltaProfile::fps(60.0).unwrap());
    let mut failures = 0;
    for _ in 0..10 {
        let report = clock.step(&mut dispatcher);
        failures += report.failures.len();
        assert!(report.failures.iter().any(|f| f.id == "panicky"));
    }
    assert_eq!(before.get(), 10);
    assert_eq!(after.get(), 10);
    assert_eq!(failures, 10 + 5);
    assert_eq!(dispatcher.metrics().registered_count, 4, "nothing auto-removed");
}

#[test]
fn shared_handle_defers_mutation_to_next_frame() {
    let shared = SharedDispatcher::new(DispatchConfig::default());
    let child_hits = Rc::new(Cell::new(0));
    let log = Rc::new(RefCell::new(Vec::new()));

    let (sh, ch, lg) = (shared.clone(), Rc::clone(&child_hits), Rc::clone(&log));
    let parent: Rc<RefCell<Option<Unregister>>> = Rc::new(RefCell::new(None));
    let parent_slot = Rc::clone(&parent);
    let handle = shared.register("parent", Priority::High, None, move |state: &FrameState, _| {
        lg.borrow_mut().push(state.frame_count);
        sh.register("child", Priority::High, None, counting(&ch));
        if let Some(handle) = parent_slot.borrow().as_ref() {
            handle.unregister();
        }
        Ok(())
    });
    *parent.borrow_mut() = Some(handle);

    let mut clock = FrameClock::new(DeltaProfile::fps(60.0).unwrap());
    clock.step_shared(&shared);
    assert_eq!(child_hits.get(), 0, "child added during frame 1 waits");
    assert_eq!(*log.borrow(), [1]);

    clock.step_shared(&shared);
    clock.step_shared(&shared);
    assert_eq!(*log.borrow(), [1], "parent removed itself after frame 1");
    assert_eq!(child_hits.get(), 2);
    assert_eq!(shared.metrics().registered_count, 1);
}

#[test]
fn unregister_twice_removes_once() {
    let shared = SharedDispatcher::default();
    let a = shared.register("a", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));
    shared.register("b", Priority::Low, None, |_: &FrameState, _: f64| Ok(()));

    a.unregister();
    a.unregister();
    let remaining = shared
        .with(|d| d.registry().iter().map(|r| r.id().to_owned()).collect::<Vec<_>>())
        .unwrap();
    assert_eq!(remaining, ["b"]);
}

#[test]
fn slowdown_then_recovery_moves_quality_both_ways() {
    let mut dispatcher = Dispatcher::default();
    let profile = DeltaProfile::Stepped {
        before: Duration::from_millis(50),
        after: Duration::from_millis(10),
        at: HostTime::from_secs_f64(2.0),
    };
    let mut clock = FrameClock::new(profile);

    let slow = clock.run_for(&mut dispatcher, 2.0);
    assert_eq!(slow.lowest_quality, Some(QualityLevel::Minimal));

    // Ten windows at 100 FPS flush the slow samples out of the history.
    let fast = clock.run_for(&mut dispatcher, 10.0);
    assert_eq!(fast.final_quality, Some(QualityLevel::High));
}

#[test]
fn pacing_grade_tracks_shedding() {
    let mut dispatcher = Dispatcher::default();
    for i in 0..20 {
        dispatcher.register(format!("fx{i}"), Priority::Low, None, |_: &FrameState, _: f64| {
            Ok(())
        });
    }
    let mut tracker = PacingTracker::<32>::default();

    let mut clock = FrameClock::new(DeltaProfile::fps(60.0).unwrap());
    let mut report = None;
    for _ in 0..30 {
        let frame = clock.step(&mut dispatcher);
        report = Some(tracker.observe(PacingSample::from_report(&frame, 16.7)));
    }
    assert_eq!(report.unwrap().grade, PacingGrade::A);

    // The first slow window still holds the 60 FPS frames (a 40-frame
    // second), so the rolling average needs four more 20-frame windows to
    // fall below 25 and reach Minimal.
    clock.set_profile(DeltaProfile::fps(20.0).unwrap());
    for _ in 0..10 + 4 * 20 {
        let frame = clock.step(&mut dispatcher);
        report = Some(tracker.observe(PacingSample::from_report(&frame, 50.0)));
    }
    assert_eq!(dispatcher.quality(), QualityLevel::Minimal);
    assert_eq!(report.unwrap().grade, PacingGrade::D);
    assert!(tracker.sparkline_ascii(10.0, 50.0).ends_with('@'));
}

#[test]
fn recorded_trace_decodes_frame_by_frame() {
    use cadence_core::trace::Tracer;
    use cadence_debug::recorder::{RecordedEvent, RecorderSink, decode};

    let mut dispatcher = Dispatcher::default();
    dispatcher.register("pulse", Priority::Medium, Some(30.0), |_: &FrameState, _: f64| Ok(()));

    let mut recorder = RecorderSink::new();
    let mut clock = FrameClock::new(DeltaProfile::fps(60.0).unwrap());
    {
        let mut tracer = Tracer::new(&mut recorder);
        for _ in 0..6 {
            let (state, delta) = clock.tick();
            dispatcher.update_traced(&state, delta, &mut tracer);
        }
    }

    let events: Vec<_> = decode(recorder.as_bytes()).collect();
    let summaries = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::FrameSummary(_)))
        .count();
    let runs = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::CallbackRun { .. }))
        .count();
    let limited = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::CallbackSkipped { .. }))
        .count();
    assert_eq!(summaries, 6);
    assert_eq!(runs + limited, 6);
    assert_eq!(runs, 3, "30 Hz on a 60 Hz host runs every other frame");
}
