#![forbid(unsafe_code)]

//! The draggable element.
//!
//! [`Draggable`] wraps one builder element (a form field, a layout block,
//! ...). It can be picked up, and when it already lives inside a dropzone it
//! is also a drop target for its siblings: hovering it shows a `before` or
//! `after` marker, publishes the insertion index to the [`DragRegistry`] and
//! animates a margin gap where the dragged element would land.
//!
//! # Lifecycle
//!
//! The host drives every step explicitly:
//!
//! | Host call | When | Semantics |
//! |-----------|------|-----------|
//! | [`Draggable::mount`] | once, after first layout | one-shot baseline capture |
//! | [`Draggable::receive_props`] | on every parent re-render | recurring; fires `update_state` once per `init_done` rising edge |
//! | [`Draggable::set_layout`] | whenever the element box changes | recurring |
//! | [`Draggable::dispatch`] | per native drag event | routes to the handlers |
//! | [`Draggable::tick`] | per animation frame | deferred resets, then springs |
//! | [`Draggable::render`] | per frame | declarative view |
//!
//! # State machines
//!
//! Drag source: `Idle -> Dragging` on drag start, back to `Idle` on drag end.
//! Drop target: `Neutral -> Before <-> After -> Neutral`, where `Neutral` is
//! entered on drag-leave or drag-end.
//!
//! # Invariants
//!
//! 1. `BEFORE` and `AFTER` markers are mutually exclusive.
//! 2. Rendered margins are never below the captured baseline.
//! 3. Drag end clears the registry entry no matter who set it.
//! 4. Margin resets write absolute zeros, so a late deferred reset cannot
//!    corrupt state; the next drag-over simply re-targets the gap.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use pagemaker_core::animation::Spring;
use pagemaker_core::event::{DragEvent, DragEventKind};
use pagemaker_core::geometry::{Axis, Rect, Sides};
use pagemaker_core::timer::DeferredQueue;
use serde_json::Value;

use crate::config::DraggableConfig;
use crate::drag::{
    CheckAndRemoveFn, DragPayload, DragRegistry, DragRegistryEntry, HoverSide, PayloadError,
    RemoveElementFn, allow_removal,
};
use crate::style::{ComputedStyle, DRAG_ITEM_CLASS, INLINE_CLASS, Markers, baseline_margin};

/// Attribute in `element_props` that replaces the base class name.
const CLASS_NAME_ATTR: &str = "className";

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// Callback fired when the parent finishes initialization.
pub type UpdateStateFn = Rc<dyn Fn()>;

/// Inputs supplied by the parent on every render.
#[derive(Clone)]
pub struct DraggableProps {
    pub id: String,
    pub element_type: String,
    pub name: Option<String>,
    /// Position among siblings in the hosting dropzone.
    pub index: usize,
    /// Lay out along the horizontal axis instead of vertically.
    pub allow_horizontal: bool,
    pub fields: Option<Vec<Value>>,
    /// Whether the element can be picked up (default: true).
    pub draggable: bool,
    /// Whether the hosting dropzone can take another element (default: false).
    pub space_available: bool,
    pub dropzone_id: Option<String>,
    pub parent_id: Option<String>,
    pub payload: Option<Value>,
    /// Extra attributes spread onto the rendered element.
    pub element_props: Option<BTreeMap<String, String>>,
    /// Animate the drop gap (default: true).
    pub enable_motion: bool,
    /// Keys of the host-rendered child nodes.
    pub children: Vec<String>,
    pub update_state: UpdateStateFn,
    pub remove_element: Option<RemoveElementFn>,
    pub check_and_remove_element: CheckAndRemoveFn,
    /// Whether the parent finished its own initialization.
    pub init_done: bool,
}

impl fmt::Debug for DraggableProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraggableProps")
            .field("id", &self.id)
            .field("element_type", &self.element_type)
            .field("name", &self.name)
            .field("index", &self.index)
            .field("allow_horizontal", &self.allow_horizontal)
            .field("draggable", &self.draggable)
            .field("space_available", &self.space_available)
            .field("dropzone_id", &self.dropzone_id)
            .field("parent_id", &self.parent_id)
            .field("enable_motion", &self.enable_motion)
            .field("children", &self.children)
            .field("init_done", &self.init_done)
            .finish_non_exhaustive()
    }
}

impl DraggableProps {
    /// Create props with the required fields and defaults for the rest.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, element_type: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            name: None,
            index: 0,
            allow_horizontal: false,
            fields: None,
            draggable: true,
            space_available: false,
            dropzone_id: None,
            parent_id: None,
            payload: None,
            element_props: None,
            enable_motion: true,
            children: children.into_iter().map(Into::into).collect(),
            update_state: Rc::new(|| {}),
            remove_element: None,
            check_and_remove_element: allow_removal(),
            init_done: false,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn horizontal(mut self, allow_horizontal: bool) -> Self {
        self.allow_horizontal = allow_horizontal;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Value>) -> Self {
        self.fields = Some(fields);
        self
    }

    #[must_use]
    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    #[must_use]
    pub fn space_available(mut self, space_available: bool) -> Self {
        self.space_available = space_available;
        self
    }

    /// Host the element in a dropzone. This also makes it a drop target.
    #[must_use]
    pub fn in_dropzone(mut self, dropzone_id: impl Into<String>) -> Self {
        self.dropzone_id = Some(dropzone_id.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_element_props(mut self, props: BTreeMap<String, String>) -> Self {
        self.element_props = Some(props);
        self
    }

    #[must_use]
    pub fn enable_motion(mut self, enable_motion: bool) -> Self {
        self.enable_motion = enable_motion;
        self
    }

    #[must_use]
    pub fn on_update_state(mut self, f: impl Fn() + 'static) -> Self {
        self.update_state = Rc::new(f);
        self
    }

    #[must_use]
    pub fn on_remove_element(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.remove_element = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_check_and_remove(mut self, f: impl Fn(&str) -> bool + 'static) -> Self {
        self.check_and_remove_element = Rc::new(f);
        self
    }

    #[must_use]
    pub fn init_done(mut self, init_done: bool) -> Self {
        self.init_done = init_done;
        self
    }

    /// Layout axis selected by `allow_horizontal`.
    #[must_use]
    pub fn axis(&self) -> Axis {
        Axis::from_horizontal(self.allow_horizontal)
    }

    /// Payload describing this element to a drop handler.
    #[must_use]
    pub fn payload(&self) -> DragPayload {
        DragPayload {
            id: self.id.clone(),
            element_type: self.element_type.clone(),
            name: self.name.clone(),
            fields: self.fields.clone(),
            payload: self.payload.clone(),
            parent_id: self.parent_id.clone(),
            dropzone_id: self.dropzone_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Inline margin overrides. `None` leaves the stylesheet value in effect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginStyle {
    pub margin_top: Option<f32>,
    pub margin_right: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
}

impl MarginStyle {
    /// Whether no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render as an inline `style` attribute value.
    #[must_use]
    pub fn to_css(&self) -> String {
        [
            ("margin-top", self.margin_top),
            ("margin-right", self.margin_right),
            ("margin-bottom", self.margin_bottom),
            ("margin-left", self.margin_left),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|px| format!("{name}: {px}px;")))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Declarative output of [`Draggable::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    pub id: String,
    pub class_name: String,
    /// Value of the `draggable` attribute.
    pub draggable: bool,
    /// Whether drag-over and drag-leave handlers are attached.
    pub drop_target: bool,
    /// `element_props` minus the consumed `className`.
    pub attributes: BTreeMap<String, String>,
    pub style: MarginStyle,
    pub children: Vec<String>,
}

impl ElementView {
    /// Whether `class` is in the class list.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }
}

/// How [`Draggable::dispatch`] treated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No handler is attached for this event kind.
    Unhandled,
    /// A handler ran.
    Handled,
    /// The drag-over handler declined (no space, or no layout).
    Declined,
}

/// Drag-source phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// Gap targets the springs are chasing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginTargets {
    pub before: f32,
    pub after: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    ResetMargins,
}

// ---------------------------------------------------------------------------
// Draggable
// ---------------------------------------------------------------------------

/// One draggable builder element.
pub struct Draggable {
    props: DraggableProps,
    config: DraggableConfig,
    baseline: Sides,
    mounted: bool,
    /// The element's own bounding box.
    layout: Option<Rect>,
    phase: DragPhase,
    markers: Markers,
    targets: MarginTargets,
    before: Spring,
    after: Spring,
    pending: DeferredQueue<Deferred>,
    last_tick: Option<Duration>,
}

impl fmt::Debug for Draggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draggable")
            .field("id", &self.props.id)
            .field("baseline", &self.baseline)
            .field("mounted", &self.mounted)
            .field("layout", &self.layout)
            .field("phase", &self.phase)
            .field("markers", &self.markers)
            .field("targets", &self.targets)
            .field("pending_resets", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Draggable {
    /// Create an element with the default configuration.
    #[must_use]
    pub fn new(props: DraggableProps) -> Self {
        Self::with_config(props, DraggableConfig::default())
    }

    /// Create an element with a custom configuration.
    #[must_use]
    pub fn with_config(props: DraggableProps, config: DraggableConfig) -> Self {
        let spring = config.spring;
        Self {
            props,
            config,
            baseline: Sides::ZERO,
            mounted: false,
            layout: None,
            phase: DragPhase::Idle,
            markers: Markers::empty(),
            targets: MarginTargets::default(),
            before: Spring::new(0.0).with_config(spring),
            after: Spring::new(0.0).with_config(spring),
            pending: DeferredQueue::new(),
            last_tick: None,
        }
    }

    // --- accessors --------------------------------------------------------

    pub fn props(&self) -> &DraggableProps {
        &self.props
    }

    pub fn config(&self) -> &DraggableConfig {
        &self.config
    }

    /// Natural margins captured at mount.
    pub fn baseline(&self) -> Sides {
        self.baseline
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn layout(&self) -> Option<Rect> {
        self.layout
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn markers(&self) -> Markers {
        self.markers
    }

    /// Current drop-target state, `None` when neutral.
    pub fn hover_side(&self) -> Option<HoverSide> {
        if self.markers.contains(Markers::BEFORE) {
            Some(HoverSide::Before)
        } else if self.markers.contains(Markers::AFTER) {
            Some(HoverSide::After)
        } else {
            None
        }
    }

    pub fn margin_targets(&self) -> MarginTargets {
        self.targets
    }

    /// Current animated `(before, after)` margin values.
    pub fn animated_margins(&self) -> (f32, f32) {
        (self.before.value(), self.after.value())
    }

    /// Deferred margin resets not yet fired.
    pub fn pending_resets(&self) -> usize {
        self.pending.len()
    }

    /// Whether the gap animation is active for this element.
    pub fn motion_enabled(&self) -> bool {
        self.config.motion && self.props.enable_motion
    }

    /// Whether drag-over and drag-leave handlers are attached.
    pub fn is_drop_target(&self) -> bool {
        self.props.dropzone_id.is_some()
    }

    /// Whether any spring is still moving.
    pub fn is_animating(&self) -> bool {
        !self.before.is_resting() || !self.after.is_resting()
    }

    // --- lifecycle --------------------------------------------------------

    /// Capture the baseline margins from the resolved style.
    ///
    /// One-shot: later calls are ignored. Without a style the baseline stays
    /// all-zero.
    pub fn mount(&mut self, style: Option<&ComputedStyle>) {
        if self.mounted {
            pagemaker_core::debug!(id = %self.props.id, "already mounted, ignoring");
            return;
        }
        self.mounted = true;
        if let Some(style) = style {
            self.baseline = baseline_margin(style);
        }
        pagemaker_core::trace!(id = %self.props.id, baseline = ?self.baseline, "mounted");
    }

    /// Adopt new props from the parent.
    ///
    /// When `init_done` rises from false to true, the current `update_state`
    /// callback fires once before the new props are adopted.
    pub fn receive_props(&mut self, next: DraggableProps) {
        if self.props.init_done != next.init_done && next.init_done {
            pagemaker_core::debug!(id = %self.props.id, "parent initialized, updating state");
            (self.props.update_state)();
        }
        self.props = next;
    }

    /// Record the element's bounding box.
    pub fn set_layout(&mut self, rect: Option<Rect>) {
        self.layout = rect;
    }

    // --- handlers ---------------------------------------------------------

    /// Route a native event to its handler.
    ///
    /// Drag-over and drag-leave are only attached for elements hosted in a
    /// dropzone.
    pub fn dispatch(
        &mut self,
        event: &mut DragEvent,
        registry: &mut impl DragRegistry,
    ) -> Result<Dispatch, PayloadError> {
        let span = pagemaker_core::trace_span!(
            "draggable_dispatch",
            id = %self.props.id,
            kind = event.kind.dom_name()
        );
        let _guard = span.enter();

        match event.kind {
            DragEventKind::Start => {
                self.drag_start(event, registry)?;
                Ok(Dispatch::Handled)
            }
            DragEventKind::Over if self.is_drop_target() => {
                if self.drag_over(event, registry) {
                    Ok(Dispatch::Handled)
                } else {
                    Ok(Dispatch::Declined)
                }
            }
            DragEventKind::Leave if self.is_drop_target() => {
                self.drag_leave(event);
                Ok(Dispatch::Handled)
            }
            DragEventKind::Over | DragEventKind::Leave => Ok(Dispatch::Unhandled),
            DragEventKind::End => {
                self.drag_end(event, registry);
                Ok(Dispatch::Handled)
            }
        }
    }

    /// The element was picked up.
    ///
    /// Writes the payload into the data channel and, when the element is
    /// hosted in a dropzone, publishes a registry entry so the origin can
    /// later remove it.
    pub fn drag_start(
        &mut self,
        event: &mut DragEvent,
        registry: &mut impl DragRegistry,
    ) -> Result<(), PayloadError> {
        event.stop_propagation();

        event.data_transfer.effect_allowed = Some(self.config.effect_allowed);
        self.props.payload().write_to(&mut event.data_transfer)?;
        self.phase = DragPhase::Dragging;

        if let Some(dropzone_id) = self.props.dropzone_id.as_ref() {
            registry.set_dragged_element(Some(DragRegistryEntry {
                element_id: self.props.id.clone(),
                dropzone_id: dropzone_id.clone(),
                remove_element: self.props.remove_element.clone(),
                check_and_remove_element: Rc::clone(&self.props.check_and_remove_element),
            }));
        }
        pagemaker_core::debug!(id = %self.props.id, hosted = self.is_drop_target(), "drag start");
        Ok(())
    }

    /// The pointer moved over this element.
    ///
    /// Returns `false` without touching any state when the hosting dropzone
    /// has no space or the element box is unknown.
    pub fn drag_over(&mut self, event: &DragEvent, registry: &mut impl DragRegistry) -> bool {
        if !self.props.space_available {
            return false;
        }
        let Some(rect) = self.layout else {
            pagemaker_core::debug!(id = %self.props.id, "drag over without layout");
            return false;
        };

        let axis = self.props.axis();
        let Some(side) = HoverSide::locate(rect, axis, event.client.along(axis)) else {
            return true;
        };

        self.markers = match side {
            HoverSide::Before => Markers::BEFORE,
            HoverSide::After => Markers::AFTER,
        };
        registry.set_drop_position(side.insertion_index(self.props.index));

        // Horizontal layouts keep their siblings inline and get no gap.
        if !axis.is_horizontal() {
            let gap = event.target_rect.unwrap_or(rect).height;
            let resting = self.resting_targets();
            self.targets = match side {
                HoverSide::Before => MarginTargets {
                    before: gap,
                    after: resting.after,
                },
                HoverSide::After => MarginTargets {
                    before: resting.before,
                    after: gap,
                },
            };
            self.retarget();
        }
        true
    }

    /// The pointer left this element.
    ///
    /// Markers clear immediately; margins reset after the configured delay,
    /// counted from the later of the event time and the last tick.
    pub fn drag_leave(&mut self, event: &DragEvent) {
        self.markers = Markers::empty();
        let now = self
            .last_tick
            .map_or(event.time_stamp, |last| last.max(event.time_stamp));
        self.pending.schedule(
            now,
            self.config.leave_reset_delay,
            Deferred::ResetMargins,
        );
    }

    /// The gesture finished, wherever it ended.
    pub fn drag_end(&mut self, event: &mut DragEvent, registry: &mut impl DragRegistry) {
        event.stop_propagation();
        self.markers = Markers::empty();
        registry.set_dragged_element(None);
        self.phase = DragPhase::Idle;
        self.reset_margins();
        pagemaker_core::debug!(id = %self.props.id, "drag end");
    }

    /// Advance to host time `now`: fire due resets, then step the springs.
    pub fn tick(&mut self, now: Duration) {
        for action in self.pending.drain_due(now) {
            match action {
                Deferred::ResetMargins => self.reset_margins(),
            }
        }
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_tick = Some(now);
        self.before.tick(dt);
        self.after.tick(dt);
    }

    /// Produce the element's declarative view.
    #[must_use]
    pub fn render(&self) -> ElementView {
        let span = pagemaker_core::debug_span!("draggable_render", id = %self.props.id);
        let _guard = span.enter();

        let mut attributes = self.props.element_props.clone().unwrap_or_default();
        let mut class_name = attributes.remove(CLASS_NAME_ATTR).unwrap_or_else(|| {
            if self.props.allow_horizontal {
                format!("{DRAG_ITEM_CLASS} {INLINE_CLASS}")
            } else {
                DRAG_ITEM_CLASS.to_string()
            }
        });
        for marker in self.markers.class_names() {
            if !class_name.is_empty() {
                class_name.push(' ');
            }
            class_name.push_str(marker);
        }

        ElementView {
            id: self.props.id.clone(),
            class_name,
            draggable: self.props.draggable,
            drop_target: self.is_drop_target(),
            attributes,
            style: if self.motion_enabled() {
                self.motion_style()
            } else {
                MarginStyle::default()
            },
            children: self.props.children.clone(),
        }
    }

    // --- internals --------------------------------------------------------

    /// Baseline margins on the active axis.
    fn resting_targets(&self) -> MarginTargets {
        let axis = self.props.axis();
        MarginTargets {
            before: self.baseline.leading(axis),
            after: self.baseline.trailing(axis),
        }
    }

    fn reset_margins(&mut self) {
        self.targets = MarginTargets::default();
        self.retarget();
    }

    fn retarget(&mut self) {
        self.before.set_target(self.targets.before);
        self.after.set_target(self.targets.after);
    }

    /// Inline margins for the current animation frame. A side whose
    /// animated value is exactly zero is left to the stylesheet.
    fn motion_style(&self) -> MarginStyle {
        let floor = self.resting_targets();
        let before = self.before.value();
        let after = self.after.value();
        let before = (before != 0.0).then(|| before.max(floor.before));
        let after = (after != 0.0).then(|| after.max(floor.after));

        if self.props.axis().is_horizontal() {
            MarginStyle {
                margin_left: before,
                margin_right: after,
                ..MarginStyle::default()
            }
        } else {
            MarginStyle {
                margin_top: before,
                margin_bottom: after,
                ..MarginStyle::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragContext;
    use pagemaker_core::geometry::Point;
    use std::cell::Cell;

    const MS_16: Duration = Duration::from_millis(16);

    fn hosted(index: usize) -> Draggable {
        let mut d = Draggable::new(
            DraggableProps::new("e1", "text-input", ["label"])
                .at_index(index)
                .in_dropzone("canvas")
                .space_available(true),
        );
        d.mount(None);
        d.set_layout(Some(Rect::new(0.0, 100.0, 300.0, 40.0)));
        d
    }

    fn settle(d: &mut Draggable, from: Duration) -> Duration {
        let mut now = from;
        for _ in 0..120 {
            now += MS_16;
            d.tick(now);
        }
        now
    }

    // === Props ===

    #[test]
    fn props_defaults() {
        let p = DraggableProps::new("a", "button", ["child"]);
        assert!(p.draggable);
        assert!(!p.space_available);
        assert!(p.enable_motion);
        assert!(!p.init_done);
        assert_eq!(p.index, 0);
        assert_eq!(p.children, vec!["child".to_string()]);
        assert!((p.check_and_remove_element)("a"));
        assert_eq!(p.axis(), Axis::Vertical);
    }

    #[test]
    fn props_payload_mirrors_fields() {
        let p = DraggableProps::new("a", "button", ["c"])
            .with_name("Submit")
            .with_parent("row-1")
            .in_dropzone("canvas")
            .with_payload(serde_json::json!({"label": "Go"}));
        let payload = p.payload();
        assert_eq!(payload.id, "a");
        assert_eq!(payload.element_type, "button");
        assert_eq!(payload.name.as_deref(), Some("Submit"));
        assert_eq!(payload.parent_id.as_deref(), Some("row-1"));
        assert_eq!(payload.dropzone_id.as_deref(), Some("canvas"));
        assert!(payload.fields.is_none());
    }

    // === Mount ===

    #[test]
    fn mount_without_style_keeps_zero_baseline() {
        let mut d = Draggable::new(DraggableProps::new("a", "t", ["c"]));
        d.mount(None);
        assert!(d.is_mounted());
        assert_eq!(d.baseline(), Sides::ZERO);
    }

    #[test]
    fn mount_is_one_shot() {
        let mut d = Draggable::new(DraggableProps::new("a", "t", ["c"]));
        let first = ComputedStyle::new().with("margin-top", "5px");
        let second = ComputedStyle::new().with("margin-top", "50px");
        d.mount(Some(&first));
        d.mount(Some(&second));
        assert_eq!(d.baseline().top, 5.0);
    }

    // === Receive props ===

    #[test]
    fn update_state_fires_on_init_rising_edge_only() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let base = DraggableProps::new("a", "t", ["c"])
            .on_update_state(move || counter.set(counter.get() + 1));

        let mut d = Draggable::new(base.clone());
        d.receive_props(base.clone().init_done(false));
        assert_eq!(calls.get(), 0);
        d.receive_props(base.clone().init_done(true));
        assert_eq!(calls.get(), 1);
        d.receive_props(base.clone().init_done(true));
        assert_eq!(calls.get(), 1);
        d.receive_props(base.clone().init_done(false));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn receive_props_adopts_new_index() {
        let mut d = hosted(0);
        let next = d.props().clone().at_index(7);
        d.receive_props(next);
        assert_eq!(d.props().index, 7);
    }

    // === Drag start ===

    #[test]
    fn drag_start_writes_payload_and_effect() {
        let mut d = hosted(2);
        let mut ctx = DragContext::new();
        let mut ev = DragEvent::start();
        d.drag_start(&mut ev, &mut ctx).unwrap();

        assert!(ev.propagation_stopped());
        assert_eq!(
            ev.data_transfer.effect_allowed.map(|e| e.as_dom_str()),
            Some("copy")
        );
        let payload = DragPayload::read_from(&ev.data_transfer).unwrap();
        assert_eq!(payload.id, "e1");
        assert_eq!(payload.dropzone_id.as_deref(), Some("canvas"));
        assert_eq!(d.phase(), DragPhase::Dragging);
    }

    #[test]
    fn drag_start_hosted_publishes_entry() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.drag_start(&mut DragEvent::start(), &mut ctx).unwrap();
        let entry = ctx.dragged_element().unwrap();
        assert_eq!(entry.element_id, "e1");
        assert_eq!(entry.dropzone_id, "canvas");
    }

    #[test]
    fn drag_start_unhosted_leaves_registry_untouched() {
        let mut d = Draggable::new(DraggableProps::new("palette-1", "header", ["H"]));
        let mut ctx = DragContext::new();
        ctx.set_dragged_element(Some(DragRegistryEntry::new("other", "z")));
        d.drag_start(&mut DragEvent::start(), &mut ctx).unwrap();
        assert_eq!(ctx.dragged_element().unwrap().element_id, "other");
    }

    // === Drag over ===

    #[test]
    fn drag_over_before_example() {
        let mut d = hosted(2);
        let mut ctx = DragContext::new();
        assert!(d.drag_over(&DragEvent::over(10.0, 110.0), &mut ctx));
        assert_eq!(d.hover_side(), Some(HoverSide::Before));
        assert_eq!(ctx.drop_position(), Some(2));
        assert_eq!(d.margin_targets(), MarginTargets { before: 40.0, after: 0.0 });
    }

    #[test]
    fn drag_over_after_example() {
        let mut d = hosted(2);
        let mut ctx = DragContext::new();
        assert!(d.drag_over(&DragEvent::over(10.0, 135.0), &mut ctx));
        assert_eq!(d.hover_side(), Some(HoverSide::After));
        assert_eq!(ctx.drop_position(), Some(3));
        assert_eq!(d.margin_targets(), MarginTargets { before: 0.0, after: 40.0 });
    }

    #[test]
    fn drag_over_gap_uses_event_target_height() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        let ev = DragEvent::over(10.0, 105.0).with_target_rect(Rect::new(0.0, 102.0, 100.0, 18.0));
        d.drag_over(&ev, &mut ctx);
        assert_eq!(d.margin_targets().before, 18.0);
    }

    #[test]
    fn drag_over_uses_baseline_for_other_side() {
        let mut d = Draggable::new(
            DraggableProps::new("e1", "t", ["c"])
                .in_dropzone("z")
                .space_available(true),
        );
        d.mount(Some(&ComputedStyle::new().with_margins(Sides::new(4.0, 0.0, 6.0, 0.0))));
        d.set_layout(Some(Rect::new(0.0, 0.0, 100.0, 20.0)));
        let mut ctx = DragContext::new();
        d.drag_over(&DragEvent::over(5.0, 2.0), &mut ctx);
        assert_eq!(d.margin_targets(), MarginTargets { before: 20.0, after: 6.0 });
        d.drag_over(&DragEvent::over(5.0, 18.0), &mut ctx);
        assert_eq!(d.margin_targets(), MarginTargets { before: 4.0, after: 20.0 });
    }

    #[test]
    fn drag_over_markers_toggle() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.drag_over(&DragEvent::over(0.0, 101.0), &mut ctx);
        assert_eq!(d.markers(), Markers::BEFORE);
        d.drag_over(&DragEvent::over(0.0, 139.0), &mut ctx);
        assert_eq!(d.markers(), Markers::AFTER);
        d.drag_over(&DragEvent::over(0.0, 101.0), &mut ctx);
        assert_eq!(d.markers(), Markers::BEFORE);
    }

    #[test]
    fn drag_over_without_space_changes_nothing() {
        let mut d = hosted(2);
        let next = d.props().clone().space_available(false);
        d.receive_props(next);
        let mut ctx = DragContext::new();
        assert!(!d.drag_over(&DragEvent::over(10.0, 110.0), &mut ctx));
        assert_eq!(d.markers(), Markers::empty());
        assert_eq!(ctx.drop_position(), None);
        assert_eq!(d.margin_targets(), MarginTargets::default());
    }

    #[test]
    fn drag_over_without_layout_declines() {
        let mut d = hosted(2);
        d.set_layout(None);
        let mut ctx = DragContext::new();
        assert!(!d.drag_over(&DragEvent::over(10.0, 110.0), &mut ctx));
        assert_eq!(ctx.drop_position(), None);
    }

    #[test]
    fn drag_over_outside_span_is_accepted_but_inert() {
        let mut d = hosted(2);
        let mut ctx = DragContext::new();
        assert!(d.drag_over(&DragEvent::over(10.0, 500.0), &mut ctx));
        assert_eq!(d.markers(), Markers::empty());
        assert_eq!(ctx.drop_position(), None);
    }

    #[test]
    fn drag_over_horizontal_has_no_gap() {
        let mut d = Draggable::new(
            DraggableProps::new("e1", "t", ["c"])
                .at_index(1)
                .horizontal(true)
                .in_dropzone("z")
                .space_available(true),
        );
        d.mount(None);
        d.set_layout(Some(Rect::new(100.0, 0.0, 80.0, 30.0)));
        let mut ctx = DragContext::new();

        assert!(d.drag_over(&DragEvent::over(110.0, 5.0), &mut ctx));
        assert_eq!(ctx.drop_position(), Some(1));
        assert_eq!(d.hover_side(), Some(HoverSide::Before));

        assert!(d.drag_over(&DragEvent::over(170.0, 5.0), &mut ctx));
        assert_eq!(ctx.drop_position(), Some(2));
        assert_eq!(d.margin_targets(), MarginTargets::default());
    }

    // === Drag leave ===

    #[test]
    fn drag_leave_clears_markers_now_and_margins_later() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.drag_over(&DragEvent::over(0.0, 110.0).at_time(Duration::ZERO), &mut ctx);
        d.drag_leave(&DragEvent::leave().at_time(Duration::from_millis(100)));

        assert_eq!(d.markers(), Markers::empty());
        assert_eq!(d.margin_targets().before, 40.0);
        assert_eq!(d.pending_resets(), 1);

        d.tick(Duration::from_millis(349));
        assert_eq!(d.margin_targets().before, 40.0);
        d.tick(Duration::from_millis(350));
        assert_eq!(d.margin_targets(), MarginTargets::default());
        assert_eq!(d.pending_resets(), 0);
    }

    #[test]
    fn late_reset_is_overwritten_by_next_drag_over() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.drag_leave(&DragEvent::leave().at_time(Duration::ZERO));
        d.tick(Duration::from_millis(300));
        d.drag_over(&DragEvent::over(0.0, 130.0), &mut ctx);
        assert_eq!(d.margin_targets().after, 40.0);
    }

    #[test]
    fn unstamped_leave_waits_full_delay_from_last_tick() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.tick(Duration::from_secs(1));
        d.dispatch(&mut DragEvent::over(10.0, 110.0), &mut ctx)
            .unwrap();
        d.dispatch(&mut DragEvent::leave(), &mut ctx).unwrap();

        d.tick(Duration::from_millis(1016));
        assert_eq!(d.margin_targets().before, 40.0);
        d.tick(Duration::from_millis(1249));
        assert_eq!(d.margin_targets().before, 40.0);
        d.tick(Duration::from_millis(1250));
        assert_eq!(d.margin_targets(), MarginTargets::default());
    }

    #[test]
    fn stamped_leave_after_last_tick_uses_event_time() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.tick(Duration::from_millis(100));
        d.drag_over(&DragEvent::over(10.0, 110.0), &mut ctx);
        d.drag_leave(&DragEvent::leave().at_time(Duration::from_millis(200)));

        d.tick(Duration::from_millis(449));
        assert_eq!(d.margin_targets().before, 40.0);
        d.tick(Duration::from_millis(450));
        assert_eq!(d.margin_targets(), MarginTargets::default());
    }

    // === Drag end ===

    #[test]
    fn drag_end_clears_everything() {
        let mut d = hosted(1);
        let mut ctx = DragContext::new();
        d.drag_start(&mut DragEvent::start(), &mut ctx).unwrap();
        d.drag_over(&DragEvent::over(0.0, 110.0), &mut ctx);

        let mut ev = DragEvent::end();
        d.drag_end(&mut ev, &mut ctx);
        assert!(ev.propagation_stopped());
        assert!(ctx.dragged_element().is_none());
        assert_eq!(d.markers(), Markers::empty());
        assert_eq!(d.margin_targets(), MarginTargets::default());
        assert_eq!(d.phase(), DragPhase::Idle);
    }

    #[test]
    fn drag_end_clears_foreign_entry() {
        let mut d = Draggable::new(DraggableProps::new("palette", "t", ["c"]));
        let mut ctx = DragContext::new();
        ctx.set_dragged_element(Some(DragRegistryEntry::new("someone-else", "z")));
        d.drag_end(&mut DragEvent::end(), &mut ctx);
        assert!(ctx.dragged_element().is_none());
    }

    // === Dispatch ===

    #[test]
    fn dispatch_routes_by_kind() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        assert_eq!(d.dispatch(&mut DragEvent::start(), &mut ctx), Ok(Dispatch::Handled));
        assert_eq!(
            d.dispatch(&mut DragEvent::over(0.0, 110.0), &mut ctx),
            Ok(Dispatch::Handled)
        );
        assert_eq!(d.dispatch(&mut DragEvent::leave(), &mut ctx), Ok(Dispatch::Handled));
        assert_eq!(d.dispatch(&mut DragEvent::end(), &mut ctx), Ok(Dispatch::Handled));
    }

    #[test]
    fn dispatch_unhosted_ignores_over_and_leave() {
        let mut d = Draggable::new(DraggableProps::new("p", "t", ["c"]).space_available(true));
        d.set_layout(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut ctx = DragContext::new();
        assert_eq!(
            d.dispatch(&mut DragEvent::over(1.0, 1.0), &mut ctx),
            Ok(Dispatch::Unhandled)
        );
        assert_eq!(d.dispatch(&mut DragEvent::leave(), &mut ctx), Ok(Dispatch::Unhandled));
        assert_eq!(ctx.drop_position(), None);
    }

    #[test]
    fn dispatch_reports_declined_over() {
        let mut d = hosted(0);
        d.set_layout(None);
        let mut ctx = DragContext::new();
        let mut ev = DragEvent::over(0.0, 0.0).at_point(Point::new(1.0, 110.0));
        assert_eq!(d.dispatch(&mut ev, &mut ctx), Ok(Dispatch::Declined));
    }

    // === Render ===

    #[test]
    fn render_classes() {
        let mut d = hosted(0);
        assert_eq!(d.render().class_name, "drag-item");
        let mut ctx = DragContext::new();
        d.drag_over(&DragEvent::over(0.0, 110.0), &mut ctx);
        let view = d.render();
        assert_eq!(view.class_name, "drag-item before");
        assert!(view.has_class("before"));
        assert!(!view.has_class("after"));
        assert!(view.drop_target);
        assert!(view.draggable);
        assert_eq!(view.children, vec!["label".to_string()]);
    }

    #[test]
    fn render_inline_class() {
        let d = Draggable::new(DraggableProps::new("a", "t", ["c"]).horizontal(true));
        assert_eq!(d.render().class_name, "drag-item inline");
        assert!(!d.render().drop_target);
    }

    #[test]
    fn render_element_props_override_class() {
        let mut attrs = BTreeMap::new();
        attrs.insert("className".to_string(), "custom".to_string());
        attrs.insert("data-testid".to_string(), "el".to_string());
        let d = Draggable::new(DraggableProps::new("a", "t", ["c"]).with_element_props(attrs));
        let view = d.render();
        assert_eq!(view.class_name, "custom");
        assert_eq!(view.attributes.get("data-testid").map(String::as_str), Some("el"));
        assert!(!view.attributes.contains_key("className"));
    }

    #[test]
    fn render_style_animates_and_respects_baseline() {
        let mut d = Draggable::new(
            DraggableProps::new("e1", "t", ["c"])
                .in_dropzone("z")
                .space_available(true),
        );
        d.mount(Some(&ComputedStyle::new().with_margins(Sides::new(8.0, 0.0, 8.0, 0.0))));
        d.set_layout(Some(Rect::new(0.0, 0.0, 100.0, 40.0)));
        let mut ctx = DragContext::new();

        assert!(d.render().style.is_empty());
        d.tick(Duration::ZERO);
        d.drag_over(&DragEvent::over(5.0, 5.0), &mut ctx);
        d.tick(MS_16 * 2);

        let style = d.render().style;
        let top = style.margin_top.unwrap();
        assert!((8.0..=40.0).contains(&top), "top={top}");
        assert_eq!(style.margin_left, None);

        settle(&mut d, MS_16 * 2);
        let style = d.render().style;
        assert_eq!(style.margin_top, Some(40.0));
        assert_eq!(style.margin_bottom, Some(8.0));
        assert_eq!(style.to_css(), "margin-top: 40px; margin-bottom: 8px;");
    }

    #[test]
    fn render_style_returns_to_stylesheet_after_reset() {
        let mut d = hosted(0);
        let mut ctx = DragContext::new();
        d.tick(Duration::ZERO);
        d.drag_over(&DragEvent::over(0.0, 110.0), &mut ctx);
        let now = settle(&mut d, Duration::ZERO);
        assert_eq!(d.render().style.margin_top, Some(40.0));

        d.drag_end(&mut DragEvent::end(), &mut ctx);
        settle(&mut d, now);
        assert!(d.render().style.is_empty());
        assert!(!d.is_animating());
    }

    #[test]
    fn render_without_motion_has_no_style() {
        let mut d = Draggable::with_config(
            DraggableProps::new("e1", "t", ["c"])
                .in_dropzone("z")
                .space_available(true),
            DraggableConfig::default().without_motion(),
        );
        d.set_layout(Some(Rect::new(0.0, 0.0, 100.0, 40.0)));
        let mut ctx = DragContext::new();
        d.tick(Duration::ZERO);
        d.drag_over(&DragEvent::over(5.0, 5.0), &mut ctx);
        settle(&mut d, Duration::ZERO);
        assert!(d.render().style.is_empty());
        assert!(!d.motion_enabled());
    }

    #[test]
    fn render_horizontal_style_uses_left_right() {
        let mut d = Draggable::new(DraggableProps::new("e1", "t", ["c"]).horizontal(true));
        d.mount(Some(&ComputedStyle::new().with_margins(Sides::new(0.0, 3.0, 0.0, 2.0))));
        // Horizontal drag-over sets no gap, so drive the springs directly.
        d.targets = MarginTargets { before: 1.0, after: 1.0 };
        d.retarget();
        d.tick(Duration::ZERO);
        settle(&mut d, Duration::ZERO);
        let style = d.render().style;
        assert_eq!(style.margin_left, Some(2.0));
        assert_eq!(style.margin_right, Some(3.0));
        assert_eq!(style.margin_top, None);
    }

    #[test]
    fn horizontal_floor_ignores_top_and_bottom_baseline() {
        let mut d = Draggable::new(DraggableProps::new("e1", "t", ["c"]).horizontal(true));
        d.mount(Some(&ComputedStyle::new().with_margins(Sides::new(10.0, 3.0, 12.0, 2.0))));
        d.targets = MarginTargets { before: 1.0, after: 1.0 };
        d.retarget();
        d.tick(Duration::ZERO);
        settle(&mut d, Duration::ZERO);
        let style = d.render().style;
        assert_eq!(style.margin_left, Some(2.0));
        assert_eq!(style.margin_right, Some(3.0));
        assert_eq!(style.margin_top, None);
        assert_eq!(style.margin_bottom, None);
    }

    #[test]
    fn margin_style_css_empty() {
        assert_eq!(MarginStyle::default().to_css(), "");
    }
}
