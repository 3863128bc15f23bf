#![forbid(unsafe_code)]

//! Core: geometry, spring animation, deferred timers, and the native drag
//! event model shared by pagemaker widgets and hosts.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod timer;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
