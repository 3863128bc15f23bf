#![forbid(unsafe_code)]

//! pagemaker public facade crate.
//!
//! Re-exports the drag-and-reorder element, its collaborators and the
//! host runner, plus a small prelude for builder code.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use pagemaker_core::animation::{Spring, SpringConfig};
pub use pagemaker_core::event::{DataTransfer, DragEvent, DragEventKind, DropEffects};
pub use pagemaker_core::geometry::{Axis, Point, Rect, Sides};

// --- Widget re-exports -----------------------------------------------------

pub use pagemaker_widgets::{
    ComputedStyle, Dispatch, DragContext, DragPayload, DragPhase, DragRegistry,
    DragRegistryEntry, Draggable, DraggableConfig, DraggableProps, ElementView, HoverSide,
    MarginStyle, MarginTargets, Markers, PayloadError,
};

// --- Host re-exports -------------------------------------------------------

#[cfg(feature = "web")]
pub use pagemaker_web::{DeterministicClock, DragHost, HostError, StepResult};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for pagemaker hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A drag payload could not be encoded or decoded.
    Payload(PayloadError),
    /// The host runner was asked about an element it does not manage.
    #[cfg(feature = "web")]
    Host(HostError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Host(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(err) => Some(err),
            #[cfg(feature = "web")]
            Self::Host(err) => Some(err),
        }
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        Self::Payload(err)
    }
}

#[cfg(feature = "web")]
impl From<HostError> for Error {
    fn from(err: HostError) -> Self {
        Self::Host(err)
    }
}

/// Standard result type for pagemaker APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Install a global JSON log subscriber filtered by `PAGEMAKER_LOG`.
#[cfg(feature = "tracing-json")]
pub use pagemaker_core::logging::install_json_subscriber;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ComputedStyle, DragContext, DragEvent, DragPayload, Draggable, DraggableConfig,
        DraggableProps, ElementView, Error, Rect, Result,
    };
    #[cfg(feature = "web")]
    pub use crate::{DragHost, StepResult};

    pub use crate::{core, widgets};
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use pagemaker_core as core;
pub use pagemaker_widgets as widgets;
#[cfg(feature = "web")]
pub use pagemaker_web as web;
