#![forbid(unsafe_code)]

//! `pagemaker-web` drives draggable elements from a browser host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes drag events,
//!   layout rectangles and computed styles.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. It provides the runner a JS
//! bridge wraps; see [`host::DragHost`].

pub mod host;

use core::time::Duration;

pub use host::{DragHost, StepResult};

/// Host runner error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No element is mounted under this id.
    UnknownElement(String),
    /// An element with this id is already mounted.
    DuplicateElement(String),
}

impl core::fmt::Display for HostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownElement(id) => write!(f, "unknown element: {id}"),
            Self::DuplicateElement(id) => write!(f, "element already mounted: {id}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
