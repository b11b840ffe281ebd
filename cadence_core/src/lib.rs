// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority-tiered, frame-budget-aware dispatch of per-frame callbacks.
//!
//! `cadence_core` decides, once per rendered frame, which registered
//! animation callbacks run. It is `no_std` compatible (with `alloc`) and
//! holds no global state: every [`Dispatcher`](dispatch::Dispatcher) is an
//! independent value owned by its host.
//!
//! # Architecture
//!
//! ```text
//!   Host frame (FrameState, delta)
//!       │
//!       ▼
//!   Sampler ──► rolling FPS ──► QualityThresholds::classify() ──► QualityLevel
//!                                                                     │
//!                 ┌───────────────────────────────────────────────────┘
//!                 ▼
//!   admit(enabled, cap) ──► should_run()? ──► callback ──► FrameReport
//! ```
//!
//! **[`registry`]**: Callbacks keyed by string id, with a [`Priority`]
//! tier, an optional [`TargetRate`] and an enabled flag.
//!
//! **[`sampler`]**: Instantaneous and rolling-average FPS from frame deltas.
//!
//! **[`quality`]**: Maps the rolling average to a four-step quality level.
//!
//! **[`admission`]**: Per-level caps; `Critical` and `High` always run.
//!
//! **[`rate`]**: Per-callback minimum spacing, checked after admission.
//!
//! **[`dispatch`]**: The frame loop tying the above together, with fault
//! isolation and a per-frame [`FrameReport`](dispatch::FrameReport).
//!
//! **[`shared`]**: A cloneable single-threaded handle that defers mutations
//! made from inside callbacks to the end of the frame.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! dispatch-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use cadence_core::dispatch::{DispatchConfig, Dispatcher};
//! use cadence_core::frame::FrameState;
//! use cadence_core::registry::Priority;
//! use cadence_core::time::Duration;
//!
//! let mut dispatcher = Dispatcher::new(DispatchConfig::default());
//! dispatcher.register("twinkle", Priority::Low, Some(30.0), |_, _| Ok(()));
//!
//! let state = FrameState::default().advance(Duration::from_millis(16));
//! let report = dispatcher.update(&state, 0.016);
//! assert_eq!(report.executed, 1);
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies and
//!   catches panicking callbacks as [`CallbackError::Panicked`](error::CallbackError::Panicked).
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-callback
//!   run and skip events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod admission;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod quality;
pub mod rate;
pub mod registry;
pub mod sampler;
pub mod shared;
pub mod time;
pub mod trace;

pub use registry::{Priority, TargetRate};
