#![forbid(unsafe_code)]

//! Resolved style input and class-list output.
//!
//! [`ComputedStyle`] is what the host reads from `getComputedStyle` for the
//! element at mount time. [`baseline_margin`] turns its margin properties
//! into the floor used by the gap animation. [`Markers`] are the transient
//! `before` / `after` classes toggled while hovering.

use std::collections::BTreeMap;

use bitflags::bitflags;
use pagemaker_core::geometry::Sides;

/// Class every draggable element carries.
pub const DRAG_ITEM_CLASS: &str = "drag-item";

/// Extra class for elements laid out along the horizontal axis.
pub const INLINE_CLASS: &str = "inline";

bitflags! {
    /// Hover marker classes. `BEFORE` and `AFTER` are never set together.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u8 {
        const BEFORE = 0b01;
        const AFTER = 0b10;
    }
}

impl Markers {
    /// Class names for the set markers, in a stable order.
    pub fn class_names(self) -> impl Iterator<Item = &'static str> {
        [(Self::BEFORE, "before"), (Self::AFTER, "after")]
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

/// Resolved CSS properties keyed by their hyphenated name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    properties: BTreeMap<String, String>,
}

impl ComputedStyle {
    /// Create an empty style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property (builder).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Read a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Style with all four margins set from pixel values.
    #[must_use]
    pub fn with_margins(self, margins: Sides) -> Self {
        self.with("margin-top", format!("{}px", margins.top))
            .with("margin-right", format!("{}px", margins.right))
            .with("margin-bottom", format!("{}px", margins.bottom))
            .with("margin-left", format!("{}px", margins.left))
    }
}

/// Parse a CSS pixel length such as `"12px"`, `"12.5px"` or `"0"`.
///
/// Leading numeric text is accepted the way `parseFloat` accepts it, so
/// `"8px !important"` yields `8.0`. Returns `None` for keywords like `auto`
/// and for non-finite numbers.
#[must_use]
pub fn parse_px(value: &str) -> Option<f32> {
    let s = value.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0))
        })
        .map_or(s.len(), |(i, _)| i);
    let n: f32 = s[..end].parse().ok()?;
    n.is_finite().then_some(n)
}

/// Extract the element's natural margins.
///
/// Missing or unparseable values degrade to `0`; negative margins are
/// floored at `0` so the animated gap never shrinks below zero.
#[must_use]
pub fn baseline_margin(style: &ComputedStyle) -> Sides {
    let read = |name: &str| -> f32 {
        match style.get(name) {
            Some(raw) => parse_px(raw).map_or_else(
                || {
                    pagemaker_core::debug!(property = name, value = raw, "unparseable margin, using 0");
                    0.0
                },
                |v| v.max(0.0),
            ),
            None => 0.0,
        }
    };
    Sides::new(
        read("margin-top"),
        read("margin-right"),
        read("margin-bottom"),
        read("margin-left"),
    )
}
