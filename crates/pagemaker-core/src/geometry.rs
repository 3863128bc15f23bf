#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixel space.
//!
//! Coordinates follow the DOM convention: origin at the top-left of the
//! viewport, `x` grows right, `y` grows down. Values are `f32` because hosts
//! report fractional client coordinates and bounding boxes.

/// A pointer position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Coordinate along `axis`.
    #[inline]
    pub const fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Layout axis along which siblings are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// Siblings flow left to right (inline layout).
    Horizontal,
    /// Siblings stack top to bottom.
    #[default]
    Vertical,
}

impl Axis {
    /// Pick the axis from an "allow horizontal" switch.
    #[inline]
    pub const fn from_horizontal(allow_horizontal: bool) -> Self {
        if allow_horizontal {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    /// Whether this is the horizontal axis.
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal)
    }
}

/// A bounding box, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Start edge along `axis` (left or top).
    #[inline]
    pub fn start(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Extent along `axis` (width or height).
    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Midpoint along `axis`.
    #[inline]
    pub fn midpoint(&self, axis: Axis) -> f32 {
        self.start(axis) + self.extent(axis) / 2.0
    }

    /// Whether `coord` falls within the rectangle's span on `axis`.
    ///
    /// Both edges are inclusive, so a pointer resting exactly on the
    /// border still counts as inside.
    #[inline]
    pub fn spans(&self, axis: Axis, coord: f32) -> bool {
        match axis {
            Axis::Horizontal => coord >= self.x && coord <= self.right(),
            Axis::Vertical => coord >= self.y && coord <= self.bottom(),
        }
    }

    /// Check if a point lies inside the rectangle (edges inclusive).
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.spans(Axis::Horizontal, point.x) && self.spans(Axis::Vertical, point.y)
    }
}

/// Per-side lengths for margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Sides {
    /// All sides zero.
    pub const ZERO: Self = Self::all(0.0);

    /// Create new sides with equal values.
    pub const fn all(val: f32) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The leading side on `axis` (top or left).
    #[inline]
    pub const fn leading(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// The trailing side on `axis` (bottom or right).
    #[inline]
    pub const fn trailing(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }
}

impl From<(f32, f32, f32, f32)> for Sides {
    fn from((top, right, bottom, left): (f32, f32, f32, f32)) -> Self {
        Self::new(top, right, bottom, left)
    }
}
