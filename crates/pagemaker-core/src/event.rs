#![forbid(unsafe_code)]

//! Native drag-and-drop event model.
//!
//! These types mirror what a browser hands to drag handlers: the event
//! phase, client coordinates, the event target's bounding box, a timestamp
//! on the host's monotonic clock, a propagation flag, and a mutable
//! [`DataTransfer`] channel that only carries strings.
//!
//! # Design Notes
//!
//! - `target_rect` is the box of the node the pointer is over, which may be
//!   a descendant of the element that owns the handler.
//! - `time_stamp` is host-supplied; nothing here reads a wall clock.
//! - Allowed drop effects use bitflags so `copyMove` and friends compose.

use std::collections::BTreeMap;
use std::time::Duration;

use bitflags::bitflags;

use crate::geometry::{Point, Rect};

/// Phase of a drag gesture as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    /// The user picked up the element.
    Start,
    /// The pointer moved over a drop target.
    Over,
    /// The pointer left a drop target.
    Leave,
    /// The gesture finished (dropped or cancelled).
    End,
}

impl DragEventKind {
    /// DOM event name for this phase.
    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Start => "dragstart",
            Self::Over => "dragover",
            Self::Leave => "dragleave",
            Self::End => "dragend",
        }
    }
}

bitflags! {
    /// Operations a drag source permits (`effectAllowed`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DropEffects: u8 {
        const COPY = 0b001;
        const MOVE = 0b010;
        const LINK = 0b100;
    }
}

impl DropEffects {
    /// The `effectAllowed` keyword for this set.
    #[must_use]
    pub fn as_dom_str(self) -> &'static str {
        let copy = self.contains(Self::COPY);
        let mov = self.contains(Self::MOVE);
        let link = self.contains(Self::LINK);
        match (copy, mov, link) {
            (false, false, false) => "none",
            (true, false, false) => "copy",
            (false, true, false) => "move",
            (false, false, true) => "link",
            (true, true, false) => "copyMove",
            (true, false, true) => "copyLink",
            (false, true, true) => "linkMove",
            (true, true, true) => "all",
        }
    }

    /// Parse an `effectAllowed` keyword. `uninitialized` maps to `all`,
    /// matching browser behavior.
    #[must_use]
    pub fn from_dom_str(s: &str) -> Option<Self> {
        Some(match s {
            "none" => Self::empty(),
            "copy" => Self::COPY,
            "move" => Self::MOVE,
            "link" => Self::LINK,
            "copyMove" => Self::COPY | Self::MOVE,
            "copyLink" => Self::COPY | Self::LINK,
            "linkMove" => Self::LINK | Self::MOVE,
            "all" | "uninitialized" => Self::all(),
            _ => return None,
        })
    }
}

/// String-keyed data channel attached to a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTransfer {
    /// Permitted operations. `None` means the source never set it.
    pub effect_allowed: Option<DropEffects>,
    data: BTreeMap<String, String>,
}

impl DataTransfer {
    /// Create an empty transfer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `format`, replacing any previous value.
    pub fn set_data(&mut self, format: impl Into<String>, value: impl Into<String>) {
        self.data.insert(format.into(), value.into());
    }

    /// Read the value stored under `format`.
    #[must_use]
    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.data.get(format).map(String::as_str)
    }

    /// Remove one format, or everything when `format` is `None`.
    pub fn clear_data(&mut self, format: Option<&str>) {
        match format {
            Some(f) => {
                self.data.remove(f);
            }
            None => self.data.clear(),
        }
    }

    /// Formats currently stored.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

/// One native drag event.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent {
    pub kind: DragEventKind,
    /// Pointer position in client coordinates.
    pub client: Point,
    /// Bounding box of the node under the pointer, if the host reported one.
    pub target_rect: Option<Rect>,
    /// Host monotonic time at dispatch.
    pub time_stamp: Duration,
    pub data_transfer: DataTransfer,
    propagation_stopped: bool,
}

impl DragEvent {
    /// Create an event of `kind` at the origin.
    #[must_use]
    pub fn new(kind: DragEventKind) -> Self {
        Self {
            kind,
            client: Point::default(),
            target_rect: None,
            time_stamp: Duration::ZERO,
            data_transfer: DataTransfer::new(),
            propagation_stopped: false,
        }
    }

    /// A `dragstart` event.
    #[must_use]
    pub fn start() -> Self {
        Self::new(DragEventKind::Start)
    }

    /// A `dragover` event at client coordinates `(x, y)`.
    #[must_use]
    pub fn over(x: f32, y: f32) -> Self {
        Self::new(DragEventKind::Over).at_point(Point::new(x, y))
    }

    /// A `dragleave` event.
    #[must_use]
    pub fn leave() -> Self {
        Self::new(DragEventKind::Leave)
    }

    /// A `dragend` event.
    #[must_use]
    pub fn end() -> Self {
        Self::new(DragEventKind::End)
    }

    /// Set the pointer position.
    #[must_use]
    pub fn at_point(mut self, client: Point) -> Self {
        self.client = client;
        self
    }

    /// Set the bounding box of the node under the pointer.
    #[must_use]
    pub fn with_target_rect(mut self, rect: Rect) -> Self {
        self.target_rect = Some(rect);
        self
    }

    /// Set the dispatch timestamp.
    #[must_use]
    pub fn at_time(mut self, time_stamp: Duration) -> Self {
        self.time_stamp = time_stamp;
        self
    }

    /// Attach an existing data channel (e.g. the one filled at drag start).
    #[must_use]
    pub fn with_data_transfer(mut self, data_transfer: DataTransfer) -> Self {
        self.data_transfer = data_transfer;
        self
    }

    /// Stop the event from bubbling to ancestor handlers.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether a handler stopped propagation.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_dom_names() {
        assert_eq!(DragEventKind::Start.dom_name(), "dragstart");
        assert_eq!(DragEventKind::Over.dom_name(), "dragover");
        assert_eq!(DragEventKind::Leave.dom_name(), "dragleave");
        assert_eq!(DragEventKind::End.dom_name(), "dragend");
    }

    #[test]
    fn drop_effects_keywords() {
        assert_eq!(DropEffects::COPY.as_dom_str(), "copy");
        assert_eq!((DropEffects::COPY | DropEffects::MOVE).as_dom_str(), "copyMove");
        assert_eq!(DropEffects::all().as_dom_str(), "all");
        assert_eq!(DropEffects::empty().as_dom_str(), "none");
    }

    #[test]
    fn drop_effects_parse() {
        assert_eq!(DropEffects::from_dom_str("linkMove"), Some(DropEffects::LINK | DropEffects::MOVE));
        assert_eq!(DropEffects::from_dom_str("uninitialized"), Some(DropEffects::all()));
        assert_eq!(DropEffects::from_dom_str("teleport"), None);
    }

    #[test]
    fn data_transfer_set_get_clear() {
        let mut dt = DataTransfer::new();
        assert!(dt.get_data("data").is_none());
        dt.set_data("data", "{}");
        dt.set_data("text/plain", "hi");
        assert_eq!(dt.get_data("data"), Some("{}"));
        assert_eq!(dt.types().collect::<Vec<_>>(), vec!["data", "text/plain"]);
        dt.clear_data(Some("data"));
        assert!(dt.get_data("data").is_none());
        dt.clear_data(None);
        assert_eq!(dt.types().count(), 0);
    }

    #[test]
    fn event_builders() {
        let ev = DragEvent::over(3.0, 4.0)
            .with_target_rect(Rect::new(0.0, 0.0, 10.0, 10.0))
            .at_time(Duration::from_millis(7));
        assert_eq!(ev.kind, DragEventKind::Over);
        assert_eq!(ev.client, Point::new(3.0, 4.0));
        assert_eq!(ev.target_rect, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(ev.time_stamp, Duration::from_millis(7));
        assert!(!ev.propagation_stopped());
    }

    #[test]
    fn stop_propagation_sticks() {
        let mut ev = DragEvent::start();
        ev.stop_propagation();
        assert!(ev.propagation_stopped());
    }
}
