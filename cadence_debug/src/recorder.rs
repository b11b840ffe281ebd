// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Fixed-width fields are written as-is;
//! callback ids and error messages are length-prefixed UTF-8. [`decode`]
//! reads them back as an iterator of [`RecordedEvent`], stopping at an
//! unknown tag or a truncated record.

use std::borrow::Cow;

use cadence_core::error::CallbackError;
use cadence_core::quality::QualityLevel;
use cadence_core::registry::Priority;
use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{
    AdmissionEvent, CallbackFailedEvent, CallbackRunEvent, CallbackSkippedEvent, FrameBeginEvent,
    FrameSummary, QualityChangeEvent, SkipReason, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_QUALITY_CHANGE: u8 = 2;
const TAG_ADMISSION: u8 = 3;
const TAG_CALLBACK_FAILED: u8 = 4;
const TAG_FRAME_SUMMARY: u8 = 5;
const TAG_CALLBACK_RUN: u8 = 6;
const TAG_CALLBACK_SKIPPED: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(&bytes[..len as usize]);
    }

    fn write_error(&mut self, e: &CallbackError) {
        match e {
            CallbackError::Failed(msg) => {
                self.write_u8(0);
                self.write_str(msg);
            }
            CallbackError::Panicked => {
                self.write_u8(1);
                self.write_str("");
            }
        }
    }

    fn write_skip_reason(&mut self, r: SkipReason) {
        self.write_u8(match r {
            SkipReason::OverCap => 0,
            SkipReason::RateLimited => 1,
        });
    }

    fn write_callback(&mut self, tag: u8, frame_index: u64, id: &str, priority: Priority) {
        self.write_u8(tag);
        self.write_u64(frame_index);
        self.write_u8(priority.as_u8());
        self.write_str(id);
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u64(e.delta.ticks());
        self.write_f64(e.instantaneous_fps);
    }

    fn on_quality_change(&mut self, e: &QualityChangeEvent) {
        self.write_u8(TAG_QUALITY_CHANGE);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u8(e.from.as_u8());
        self.write_u8(e.to.as_u8());
        self.write_f64(e.rolling_average_fps);
    }

    fn on_admission(&mut self, e: &AdmissionEvent) {
        self.write_u8(TAG_ADMISSION);
        self.write_u64(e.frame_index);
        self.write_u8(e.quality.as_u8());
        self.write_option_u32(e.cap);
        self.write_u32(e.enabled);
        self.write_u32(e.admitted);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        self.write_callback(TAG_CALLBACK_FAILED, e.frame_index, e.id, e.priority);
        self.write_error(e.error);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.now.ticks());
        self.write_f64(s.instantaneous_fps);
        self.write_f64(s.rolling_average_fps);
        self.write_u8(s.quality.as_u8());
        self.write_u32(s.registered);
        self.write_u32(s.enabled);
        self.write_u32(s.admitted);
        self.write_u32(s.executed);
        self.write_u32(s.rate_limited);
        self.write_u32(s.failed);
    }

    fn on_callback_run(&mut self, e: &CallbackRunEvent<'_>) {
        self.write_callback(TAG_CALLBACK_RUN, e.frame_index, e.id, e.priority);
    }

    fn on_callback_skipped(&mut self, e: &CallbackSkippedEvent<'_>) {
        self.write_callback(TAG_CALLBACK_SKIPPED, e.frame_index, e.id, e.priority);
        self.write_skip_reason(e.reason);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
///
/// Events carrying a callback id own it, so they outlive the recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`QualityChangeEvent`].
    QualityChange(QualityChangeEvent),
    /// An [`AdmissionEvent`].
    Admission(AdmissionEvent),
    /// A [`CallbackFailedEvent`].
    CallbackFailed {
        /// Frame counter.
        frame_index: u64,
        /// Id of the failing callback.
        id: String,
        /// Its priority tier.
        priority: Priority,
        /// What went wrong.
        error: CallbackError,
    },
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// A [`CallbackRunEvent`].
    CallbackRun {
        /// Frame counter.
        frame_index: u64,
        /// Id of the callback.
        id: String,
        /// Its priority tier.
        priority: Priority,
    },
    /// A [`CallbackSkippedEvent`].
    CallbackSkipped {
        /// Frame counter.
        frame_index: u64,
        /// Id of the callback.
        id: String,
        /// Its priority tier.
        priority: Priority,
        /// Why it was skipped.
        reason: SkipReason,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.read_bytes(8)?.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some((present != 0).then_some(val))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn read_quality(&mut self) -> Option<QualityLevel> {
        self.read_u8().map(QualityLevel::from_u8)
    }

    fn read_priority(&mut self) -> Option<Priority> {
        Some(match self.read_u8()? {
            0 => Priority::Critical,
            1 => Priority::High,
            2 => Priority::Medium,
            _ => Priority::Low,
        })
    }

    fn read_error(&mut self) -> Option<CallbackError> {
        let kind = self.read_u8()?;
        let message = self.read_string()?;
        Some(match kind {
            0 => CallbackError::Failed(Cow::Owned(message)),
            _ => CallbackError::Panicked,
        })
    }

    fn read_skip_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::OverCap,
            _ => SkipReason::RateLimited,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            delta: Duration(self.read_u64()?),
            instantaneous_fps: self.read_f64()?,
        }))
    }

    fn decode_quality_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::QualityChange(QualityChangeEvent {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            from: self.read_quality()?,
            to: self.read_quality()?,
            rolling_average_fps: self.read_f64()?,
        }))
    }

    fn decode_admission(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Admission(AdmissionEvent {
            frame_index: self.read_u64()?,
            quality: self.read_quality()?,
            cap: self.read_option_u32()?,
            enabled: self.read_u32()?,
            admitted: self.read_u32()?,
        }))
    }

    fn decode_callback_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CallbackFailed {
            frame_index: self.read_u64()?,
            priority: self.read_priority()?,
            id: self.read_string()?,
            error: self.read_error()?,
        })
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            instantaneous_fps: self.read_f64()?,
            rolling_average_fps: self.read_f64()?,
            quality: self.read_quality()?,
            registered: self.read_u32()?,
            enabled: self.read_u32()?,
            admitted: self.read_u32()?,
            executed: self.read_u32()?,
            rate_limited: self.read_u32()?,
            failed: self.read_u32()?,
        }))
    }

    fn decode_callback_run(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CallbackRun {
            frame_index: self.read_u64()?,
            priority: self.read_priority()?,
            id: self.read_string()?,
        })
    }

    fn decode_callback_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CallbackSkipped {
            frame_index: self.read_u64()?,
            priority: self.read_priority()?,
            id: self.read_string()?,
            reason: self.read_skip_reason()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_QUALITY_CHANGE => self.decode_quality_change(),
            TAG_ADMISSION => self.decode_admission(),
            TAG_CALLBACK_FAILED => self.decode_callback_failed(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_CALLBACK_RUN => self.decode_callback_run(),
            TAG_CALLBACK_SKIPPED => self.decode_callback_skipped(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
