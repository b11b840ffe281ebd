// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by per-frame callbacks.
//!
//! A failing callback never stops the frame: the dispatcher records a
//! [`CallbackFailure`] in the [`FrameReport`](crate::dispatch::FrameReport),
//! logs it, and moves on to the next candidate.

use alloc::borrow::Cow;
use alloc::string::String;

/// Why a callback invocation failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    /// The callback reported a failure.
    #[error("{0}")]
    Failed(Cow<'static, str>),
    /// The callback panicked. Only produced with the `std` feature, which
    /// enables unwinding capture around each invocation.
    #[error("callback panicked")]
    Panicked,
}

impl CallbackError {
    /// Creates a [`CallbackError::Failed`] from a message.
    #[must_use]
    pub fn failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Failed(message.into())
    }
}

/// A callback failure paired with the id it was registered under.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("callback `{id}` failed: {error}")]
pub struct CallbackFailure {
    /// The id of the callback that failed.
    pub id: String,
    /// What went wrong.
    #[source]
    pub error: CallbackError,
}
