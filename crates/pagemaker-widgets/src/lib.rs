#![forbid(unsafe_code)]

//! Draggable page-builder elements.
//!
//! - [`draggable`]: the [`Draggable`] element and its props and view
//! - [`drag`]: payload, hover side, and the shared drag registry
//! - [`style`]: computed-style input and marker classes
//! - [`config`]: behavior knobs, including the env var contract

pub mod config;
pub mod drag;
pub mod draggable;
pub mod style;

pub use config::DraggableConfig;
pub use drag::{
    DragContext, DragPayload, DragRegistry, DragRegistryEntry, HoverSide, PayloadError,
};
pub use draggable::{
    Dispatch, DragPhase, Draggable, DraggableProps, ElementView, MarginStyle, MarginTargets,
};
pub use style::{ComputedStyle, Markers};
