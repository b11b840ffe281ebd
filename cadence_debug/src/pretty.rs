// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use cadence_core::time::{HostTime, Timebase};
use cadence_core::trace::{
    AdmissionEvent, CallbackFailedEvent, CallbackRunEvent, CallbackSkippedEvent, FrameBeginEvent,
    FrameSummary, QualityChangeEvent, SkipReason, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    per_callback: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("per_callback", &self.per_callback)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::new(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            per_callback: false,
        }
    }

    /// Also prints a line for every callback run or skip. Off by default.
    #[must_use]
    pub fn per_callback(mut self, enabled: bool) -> Self {
        self.per_callback = enabled;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1_000_000.0
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] #{} at {:.1}ms delta={:.2}ms fps={:.1}",
            e.frame_index,
            self.ms(e.now),
            e.delta.as_millis_f64(),
            e.instantaneous_fps,
        );
    }

    fn on_quality_change(&mut self, e: &QualityChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[quality] #{} {} -> {} (avg {:.1} fps)",
            e.frame_index, e.from, e.to, e.rolling_average_fps,
        );
    }

    fn on_admission(&mut self, e: &AdmissionEvent) {
        let cap = match e.cap {
            Some(cap) => cap.to_string(),
            None => "none".to_string(),
        };
        let _ = writeln!(
            self.writer,
            "[admit] #{} quality={} cap={cap} admitted={}/{}",
            e.frame_index, e.quality, e.admitted, e.enabled,
        );
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[FAILED] #{} `{}` ({:?}): {}",
            e.frame_index, e.id, e.priority, e.error,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] #{} fps={:.1} avg={:.1} quality={} ran={} limited={} failed={} \
             of {} admitted ({} enabled, {} registered)",
            s.frame_index,
            s.instantaneous_fps,
            s.rolling_average_fps,
            s.quality,
            s.executed,
            s.rate_limited,
            s.failed,
            s.admitted,
            s.enabled,
            s.registered,
        );
    }

    fn on_callback_run(&mut self, e: &CallbackRunEvent<'_>) {
        if self.per_callback {
            let _ = writeln!(self.writer, "[run] #{} `{}`", e.frame_index, e.id);
        }
    }

    fn on_callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
        if self.per_callback {
            let reason = match e.reason {
                SkipReason::OverCap => "over cap",
                SkipReason::RateLimited => "rate limited",
            };
            let _ = writeln!(
                self.writer,
                "[skip] #{} `{}` ({:?}) {reason}",
                e.frame_index, e.id, e.priority,
            );
        }
    }
}
