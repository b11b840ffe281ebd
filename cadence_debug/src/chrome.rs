// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::time::{HostTime, Timebase};
use cadence_core::trace::SkipReason;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Frame summaries become counter tracks (FPS, quality level, callback
/// counts); quality changes and failures become instant events. Events that
/// carry no timestamp of their own use the timestamp of the frame they
/// belong to.
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut frame_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                frame_ts = host_us(e.now, timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameBegin",
                    "cat": "Dispatch",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "delta_ms": e.delta.as_millis_f64(),
                        "fps": e.instantaneous_fps,
                    }
                }));
            }
            RecordedEvent::QualityChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("Quality {} -> {}", e.from, e.to),
                    "cat": "Quality",
                    "ts": host_us(e.now, timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "rolling_average_fps": e.rolling_average_fps,
                    }
                }));
            }
            RecordedEvent::Admission(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Admission",
                    "ts": frame_ts,
                    "pid": 0,
                    "args": {
                        "enabled": e.enabled,
                        "admitted": e.admitted,
                    }
                }));
            }
            RecordedEvent::CallbackFailed {
                frame_index,
                id,
                priority,
                error,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{id} failed"),
                    "cat": "Callback",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": priority.as_u8(),
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "error": error.to_string(),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                let ts = host_us(s.now, timebase);
                events.push(json!({
                    "ph": "C",
                    "name": "FPS",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "instantaneous": s.instantaneous_fps,
                        "rolling_average": s.rolling_average_fps,
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "Quality",
                    "ts": ts,
                    "pid": 0,
                    "args": { "level": s.quality.as_u8() }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "Callbacks",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "executed": s.executed,
                        "rate_limited": s.rate_limited,
                        "failed": s.failed,
                    }
                }));
            }
            RecordedEvent::CallbackRun {
                frame_index,
                id,
                priority,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": id,
                    "cat": "Callback",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": priority.as_u8(),
                    "s": "t",
                    "args": { "frame_index": frame_index }
                }));
            }
            RecordedEvent::CallbackSkipped {
                frame_index,
                id,
                priority,
                reason,
            } => {
                let reason = match reason {
                    SkipReason::OverCap => "over_cap",
                    SkipReason::RateLimited => "rate_limited",
                };
                events.push(json!({
                    "ph": "i",
                    "name": format!("{id} skipped"),
                    "cat": "Skip",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": priority.as_u8(),
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "reason": reason,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn host_us(t: HostTime, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
}
