// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises dispatch, tracing and diagnostics.
//!
//! Registers a small scene of effects, runs it at 60 FPS, slows the host
//! down to 20 FPS, then lets it recover. Events go to both a
//! [`PrettyPrintSink`] and a [`RecorderSink`]; the recording is exported as
//! Chrome trace JSON at the end.
//!
//! Set `RUST_LOG=debug` to see the dispatcher's own log output.

use std::fs::File;
use std::io::{self, BufWriter};

use cadence_core::dispatch::{DispatchConfig, Dispatcher};
use cadence_core::error::CallbackError;
use cadence_core::frame::FrameState;
use cadence_core::registry::Priority;
use cadence_core::time::{Duration, HostTime, Timebase};
use cadence_core::trace::{
    AdmissionEvent, CallbackFailedEvent, CallbackRunEvent, CallbackSkippedEvent, FrameBeginEvent,
    FrameSummary, QualityChangeEvent, TraceSink, Tracer,
};
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;
use cadence_harness::{DeltaProfile, FrameClock, PacingSample, PacingTracker, RunSummary};

/// Seconds of simulated time per phase.
const PHASE_SECONDS: f64 = 3.0;

/// Forwards every event to two sinks.
struct Tee<'a> {
    first: &'a mut dyn TraceSink,
    second: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.first.on_frame_begin(e);
        self.second.on_frame_begin(e);
    }

    fn on_quality_change(&mut self, e: &QualityChangeEvent) {
        self.first.on_quality_change(e);
        self.second.on_quality_change(e);
    }

    fn on_admission(&mut self, e: &AdmissionEvent) {
        self.first.on_admission(e);
        self.second.on_admission(e);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        self.first.on_callback_failed(e);
        self.second.on_callback_failed(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.first.on_frame_summary(s);
        self.second.on_frame_summary(s);
    }

    fn on_callback_run(&mut self, e: &CallbackRunEvent<'_>) {
        self.first.on_callback_run(e);
        self.second.on_callback_run(e);
    }

    fn on_callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
        self.first.on_callback_skipped(e);
        self.second.on_callback_skipped(e);
    }
}

fn ok(_: &FrameState, _: f64) -> Result<(), CallbackError> {
    Ok(())
}

fn build_scene(dispatcher: &mut Dispatcher) {
    dispatcher.register("background", Priority::Critical, None, ok);
    dispatcher.register("starfield", Priority::High, Some(30.0), ok);
    for i in 0..6 {
        dispatcher.register(format!("sparkle-{i}"), Priority::Medium, Some(20.0), ok);
    }
    for i in 0..6 {
        dispatcher.register(format!("dust-{i}"), Priority::Low, None, ok);
    }
    dispatcher.register("comet", Priority::Medium, None, |state: &FrameState, _| {
        if state.frame_count % 90 == 0 {
            Err(CallbackError::failed("trail buffer exhausted"))
        } else {
            Ok(())
        }
    });
}

fn run_phase(
    label: &str,
    clock: &mut FrameClock,
    dispatcher: &mut Dispatcher,
    tracker: &mut PacingTracker<32>,
    tracer: &mut Tracer<'_>,
) {
    let end = clock.state().elapsed + Duration::from_secs_f64(PHASE_SECONDS);
    let mut summary = RunSummary::default();
    let mut last_grade = None;
    while clock.state().elapsed < end {
        let (state, delta) = clock.tick();
        let report = dispatcher.update_traced(&state, delta, tracer);
        let pacing = tracker.observe(PacingSample::from_report(&report, delta * 1000.0));
        last_grade = Some(pacing.grade);
        summary.absorb(report);
    }
    log::info!(
        "{label}: {} frames, {} runs, {} rate-limited, {} shed, {} failures, grade {}",
        summary.frames,
        summary.executed,
        summary.rate_limited,
        summary.shed,
        summary.failures.len(),
        last_grade.map_or("-", |g| g.as_str()),
    );
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let timebase = Timebase::MICROS;
    let mut pretty = PrettyPrintSink::new(Box::new(io::stdout()), timebase);
    let mut recorder = RecorderSink::new();

    let mut dispatcher = Dispatcher::new(DispatchConfig::default());
    build_scene(&mut dispatcher);

    let sixty_fps = Duration::from_secs_f64(1.0 / 60.0);
    let slowdown_at = HostTime::from_secs_f64(PHASE_SECONDS);
    let mut clock = FrameClock::new(DeltaProfile::Stepped {
        before: sixty_fps,
        after: Duration::from_millis(50),
        at: slowdown_at,
    });
    let mut tracker = PacingTracker::<32>::default();

    {
        let mut tee = Tee {
            first: &mut pretty,
            second: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);

        run_phase("steady", &mut clock, &mut dispatcher, &mut tracker, &mut tracer);
        run_phase("slowdown", &mut clock, &mut dispatcher, &mut tracker, &mut tracer);
        clock.set_profile(DeltaProfile::Steady(sixty_fps));
        run_phase("recovery", &mut clock, &mut dispatcher, &mut tracker, &mut tracer);
    }

    log::info!("frame deltas: [{}]", tracker.sparkline_ascii(10.0, 50.0));
    let metrics = dispatcher.metrics();
    log::info!(
        "final: {:.1} fps (avg {:.1}), quality {}, {} of {} callbacks enabled",
        metrics.instantaneous_fps,
        metrics.rolling_average_fps,
        metrics.quality_level,
        metrics.enabled_count,
        metrics.registered_count,
    );

    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    cadence_debug::chrome::export(recorder.as_bytes(), timebase, &mut writer)?;
    log::info!("wrote {path} ({} bytes recorded)", recorder.as_bytes().len());
    Ok(())
}
