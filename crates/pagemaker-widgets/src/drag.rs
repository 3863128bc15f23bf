#![forbid(unsafe_code)]

//! Drag payload and the shared drag registry.
//!
//! Defines [`DragPayload`], the record a draggable element serializes into
//! the native data channel at drag start, [`HoverSide`] for the
//! before/after decision over a drop target, and the registry that tracks
//! which hosted element is currently in flight.
//!
//! # Design
//!
//! ## Registry ownership
//!
//! The registry is an ordinary value owned by the host and lent to each
//! element handler as `&mut impl DragRegistry`. Because a host dispatches one
//! event at a time, there is exactly one writer at any moment; no locking is
//! involved and no global state exists.
//!
//! ## Invariants
//!
//! 1. At most one [`DragRegistryEntry`] is held at a time. Setting a new
//!    entry replaces the previous one wholesale.
//! 2. Only elements already hosted in a dropzone publish an entry, so an
//!    entry always names the origin dropzone.
//! 3. Clearing the entry does not clear the last published drop position;
//!    the receiving dropzone reads it when handling the drop.
//!
//! ## Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Missing `data` key | Drop from a foreign source | [`PayloadError::Missing`] |
//! | Malformed JSON | Foreign or truncated payload | [`PayloadError::Decode`] |
//! | No `checkAndRemoveElement` | Caller left the default | Removal allowed |

use std::fmt;
use std::rc::Rc;

use pagemaker_core::event::DataTransfer;
use pagemaker_core::geometry::{Axis, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Data-channel format key the payload is stored under.
pub const DATA_FORMAT: &str = "data";

// ---------------------------------------------------------------------------
// PayloadError
// ---------------------------------------------------------------------------

/// Failure to move a [`DragPayload`] through a text data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Serialization to JSON failed.
    Encode(String),
    /// The stored text is not a valid payload.
    Decode(String),
    /// The data channel has nothing under the expected format.
    Missing {
        /// The format key that was looked up.
        format: &'static str,
    },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(msg) => write!(f, "failed to encode drag payload: {msg}"),
            Self::Decode(msg) => write!(f, "failed to decode drag payload: {msg}"),
            Self::Missing { format } => write!(f, "no drag payload under {format:?}"),
        }
    }
}

impl std::error::Error for PayloadError {}

// ---------------------------------------------------------------------------
// DragPayload
// ---------------------------------------------------------------------------

/// Description of the element being dragged, as seen by the drop handler.
///
/// Serialized as JSON because the native channel only carries strings.
/// Absent `name`, `parentID`, `dropzoneID` and `fields` are omitted from the
/// JSON text; an absent `payload` is written as `null`.
///
/// # Examples
///
/// ```
/// # use pagemaker_widgets::drag::DragPayload;
/// let p = DragPayload::new("el-1", "text-input").with_dropzone("canvas-a");
/// let json = p.to_json().unwrap();
/// assert_eq!(DragPayload::from_json(&json).unwrap(), p);
/// assert!(p.is_hosted());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Value>>,
    /// Free-form caller data.
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "dropzoneID", default, skip_serializing_if = "Option::is_none")]
    pub dropzone_id: Option<String>,
}

impl DragPayload {
    /// Create a payload for a fresh (not yet hosted) element.
    #[must_use]
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            name: None,
            fields: None,
            payload: None,
            parent_id: None,
            dropzone_id: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the element as hosted in `dropzone_id`.
    #[must_use]
    pub fn with_dropzone(mut self, dropzone_id: impl Into<String>) -> Self {
        self.dropzone_id = Some(dropzone_id.into());
        self
    }

    /// Whether the element already lives inside a dropzone and is eligible
    /// for removal from it once dropped elsewhere.
    #[must_use]
    pub fn is_hosted(&self) -> bool {
        self.dropzone_id.is_some()
    }

    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        serde_json::to_string(self).map_err(|e| PayloadError::Encode(e.to_string()))
    }

    /// Parse from JSON text.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(text).map_err(|e| PayloadError::Decode(e.to_string()))
    }

    /// Store this payload in `dt` under [`DATA_FORMAT`].
    pub fn write_to(&self, dt: &mut DataTransfer) -> Result<(), PayloadError> {
        dt.set_data(DATA_FORMAT, self.to_json()?);
        Ok(())
    }

    /// Read a payload previously stored with [`DragPayload::write_to`].
    pub fn read_from(dt: &DataTransfer) -> Result<Self, PayloadError> {
        let text = dt.get_data(DATA_FORMAT).ok_or(PayloadError::Missing {
            format: DATA_FORMAT,
        })?;
        Self::from_json(text)
    }
}

// ---------------------------------------------------------------------------
// HoverSide
// ---------------------------------------------------------------------------

/// Which half of a drop target the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverSide {
    /// Left of (or above) the midpoint: insert before the target.
    Before,
    /// At or past the midpoint: insert after the target.
    After,
}

impl HoverSide {
    /// Classify `coord` against `rect` along `axis`.
    ///
    /// Returns `None` when `coord` is outside the rectangle's span on that
    /// axis. The midpoint itself counts as [`HoverSide::After`].
    #[must_use]
    pub fn locate(rect: Rect, axis: Axis, coord: f32) -> Option<Self> {
        if !rect.spans(axis, coord) {
            return None;
        }
        if coord < rect.midpoint(axis) {
            Some(Self::Before)
        } else {
            Some(Self::After)
        }
    }

    /// Insertion index for a target sitting at `index`.
    #[must_use]
    pub fn insertion_index(self, index: usize) -> usize {
        match self {
            Self::Before => index,
            Self::After => index.saturating_add(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry entry
// ---------------------------------------------------------------------------

/// Callback asking the origin dropzone to remove an element by id.
pub type RemoveElementFn = Rc<dyn Fn(&str)>;

/// Callback asking whether an element may be removed from its origin.
pub type CheckAndRemoveFn = Rc<dyn Fn(&str) -> bool>;

/// The always-allow default for [`CheckAndRemoveFn`].
#[must_use]
pub fn allow_removal() -> CheckAndRemoveFn {
    Rc::new(|_: &str| true)
}

/// The in-flight element, recorded so its origin dropzone can drop it.
#[derive(Clone)]
pub struct DragRegistryEntry {
    pub element_id: String,
    /// Dropzone that currently hosts the element.
    pub dropzone_id: String,
    pub remove_element: Option<RemoveElementFn>,
    pub check_and_remove_element: CheckAndRemoveFn,
}

impl fmt::Debug for DragRegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragRegistryEntry")
            .field("element_id", &self.element_id)
            .field("dropzone_id", &self.dropzone_id)
            .field("remove_element", &self.remove_element.as_ref().map(|_| ".."))
            .field("check_and_remove_element", &"..")
            .finish()
    }
}

impl DragRegistryEntry {
    /// Create an entry with no removal callback and the allow-all check.
    #[must_use]
    pub fn new(element_id: impl Into<String>, dropzone_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            dropzone_id: dropzone_id.into(),
            remove_element: None,
            check_and_remove_element: allow_removal(),
        }
    }
}

// ---------------------------------------------------------------------------
// DragRegistry
// ---------------------------------------------------------------------------

/// Sink for drag lifecycle side effects.
///
/// Elements only ever write to the registry; the host or the receiving
/// dropzone reads it back.
pub trait DragRegistry {
    /// Record (or with `None`, clear) the element in flight.
    fn set_dragged_element(&mut self, entry: Option<DragRegistryEntry>);

    /// Record the insertion index under the pointer.
    fn set_drop_position(&mut self, index: usize);
}

/// Owned registry state: one optional in-flight entry and the last
/// published drop position.
#[derive(Debug, Default)]
pub struct DragContext {
    dragged: Option<DragRegistryEntry>,
    drop_position: Option<usize>,
}

impl DragContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The element currently in flight, if it came from a dropzone.
    #[must_use]
    pub fn dragged_element(&self) -> Option<&DragRegistryEntry> {
        self.dragged.as_ref()
    }

    /// Take the in-flight entry, leaving the slot empty.
    pub fn take_dragged_element(&mut self) -> Option<DragRegistryEntry> {
        self.dragged.take()
    }

    /// Last insertion index published by a hovered element.
    #[must_use]
    pub fn drop_position(&self) -> Option<usize> {
        self.drop_position
    }

    /// Forget both the entry and the drop position.
    pub fn reset(&mut self) {
        self.dragged = None;
        self.drop_position = None;
    }

    /// Ask the origin dropzone to give up the in-flight element because it
    /// was dropped into `target_dropzone`.
    ///
    /// Nothing happens when no entry is held or when the element is dropped
    /// back into its own dropzone. Returns whether removal was requested.
    pub fn remove_from_origin(&self, target_dropzone: &str) -> bool {
        let Some(entry) = self.dragged.as_ref() else {
            return false;
        };
        if entry.dropzone_id == target_dropzone {
            return false;
        }
        if !(entry.check_and_remove_element)(&entry.element_id) {
            pagemaker_core::debug!(
                element = %entry.element_id,
                origin = %entry.dropzone_id,
                "origin dropzone refused removal"
            );
            return false;
        }
        if let Some(remove) = entry.remove_element.as_ref() {
            remove(&entry.element_id);
        }
        true
    }
}

impl DragRegistry for DragContext {
    fn set_dragged_element(&mut self, entry: Option<DragRegistryEntry>) {
        pagemaker_core::trace!(
            element = ?entry.as_ref().map(|e| e.element_id.as_str()),
            "set dragged element"
        );
        self.dragged = entry;
    }

    fn set_drop_position(&mut self, index: usize) {
        self.drop_position = Some(index);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
