#![forbid(unsafe_code)]

//! Step-based runner for a page of draggable elements.
//!
//! [`DragHost`] owns every mounted [`Draggable`], the shared [`DragContext`]
//! and a [`DeterministicClock`]. The host (JavaScript) controls the loop:
//!
//! 1. Mount elements via [`DragHost::mount`] and report their boxes via
//!    [`DragHost::set_layout`].
//! 2. Push native drag events via [`DragHost::push_event`].
//! 3. Advance time via [`DragHost::advance_time`].
//! 4. Call [`DragHost::step`] once per animation frame.
//! 5. Read element views via [`DragHost::view`] or [`DragHost::views`].
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use pagemaker_core::event::DragEvent;
//! use pagemaker_core::geometry::Rect;
//! use pagemaker_web::DragHost;
//! use pagemaker_widgets::DraggableProps;
//!
//! let mut host = DragHost::new();
//! host.mount(
//!     DraggableProps::new("a", "text-input", ["label"])
//!         .in_dropzone("canvas")
//!         .space_available(true),
//!     None,
//! )
//! .unwrap();
//! host.set_layout("a", Some(Rect::new(0.0, 100.0, 300.0, 40.0))).unwrap();
//!
//! host.push_event("a", DragEvent::over(10.0, 110.0));
//! host.advance_time(Duration::from_millis(16));
//! let result = host.step();
//!
//! assert_eq!(result.events_processed, 1);
//! assert_eq!(host.registry().drop_position(), Some(0));
//! assert!(host.view("a").unwrap().has_class("before"));
//! ```

use core::time::Duration;
use std::collections::VecDeque;

use pagemaker_core::event::{DataTransfer, DragEvent, DragEventKind};
use pagemaker_core::geometry::Rect;
use pagemaker_widgets::{
    ComputedStyle, Dispatch, DragContext, DragPayload, Draggable, DraggableConfig,
    DraggableProps, ElementView, PayloadError,
};

use crate::{DeterministicClock, HostError};

/// Result of a single [`DragHost::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Events dispatched to a mounted element.
    pub events_processed: u32,
    /// Events dropped because their target is not mounted.
    pub events_dropped: u32,
    /// Drag-over events the target declined (no space or no layout).
    pub events_declined: u32,
    /// Events whose handler failed to encode the drag payload.
    pub events_failed: u32,
    /// Whether any element is still animating after this step.
    pub animating: bool,
    /// Current frame index (monotonically increasing).
    pub frame_idx: u64,
}

/// Host-driven, non-blocking runner for draggable elements.
///
/// Elements keep their mount order; [`DragHost::views`] returns them in that
/// order. The data channel written at drag start is kept until drag end so
/// a drop handler can read the payload of the gesture in flight.
#[derive(Debug)]
pub struct DragHost {
    clock: DeterministicClock,
    config: DraggableConfig,
    registry: DragContext,
    elements: Vec<Draggable>,
    queue: VecDeque<(String, DragEvent)>,
    transfer: Option<DataTransfer>,
    frame_idx: u64,
}

impl Default for DragHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DragHost {
    /// Create an empty host with the default element configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DraggableConfig::default())
    }

    /// Create an empty host whose elements share `config`.
    #[must_use]
    pub fn with_config(config: DraggableConfig) -> Self {
        Self {
            clock: DeterministicClock::new(),
            config,
            registry: DragContext::new(),
            elements: Vec::new(),
            queue: VecDeque::new(),
            transfer: None,
            frame_idx: 0,
        }
    }

    // --- element lifecycle ------------------------------------------------

    /// Mount a new element and capture its baseline margins from `style`.
    pub fn mount(
        &mut self,
        props: DraggableProps,
        style: Option<&ComputedStyle>,
    ) -> Result<(), HostError> {
        if self.index_of(&props.id).is_some() {
            return Err(HostError::DuplicateElement(props.id));
        }
        let mut element = Draggable::with_config(props, self.config.clone());
        element.mount(style);
        element.tick(self.clock.now());
        pagemaker_core::debug!(id = %element.props().id, "element mounted");
        self.elements.push(element);
        Ok(())
    }

    /// Deliver re-rendered props to the element with the same id.
    pub fn update_props(&mut self, props: DraggableProps) -> Result<(), HostError> {
        let element = self.element_mut(&props.id)?;
        element.receive_props(props);
        Ok(())
    }

    /// Remove an element, discarding its queued events.
    pub fn unmount(&mut self, id: &str) -> Result<Draggable, HostError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| HostError::UnknownElement(id.to_string()))?;
        self.queue.retain(|(target, _)| target != id);
        pagemaker_core::debug!(id, "element unmounted");
        Ok(self.elements.remove(idx))
    }

    /// Report an element's bounding box (`None` when it is not laid out).
    pub fn set_layout(&mut self, id: &str, rect: Option<Rect>) -> Result<(), HostError> {
        self.element_mut(id)?.set_layout(rect);
        Ok(())
    }

    // --- input ------------------------------------------------------------

    /// Queue a native event for the element `id`.
    ///
    /// Events are dispatched on the next [`step`](Self::step) call.
    pub fn push_event(&mut self, id: impl Into<String>, event: DragEvent) {
        self.queue.push_back((id.into(), event));
    }

    /// Advance the deterministic clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the deterministic clock to an absolute time.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Dispatch every queued event, then advance all elements to the
    /// current clock time.
    pub fn step(&mut self) -> StepResult {
        let now = self.clock.now();
        let mut result = StepResult::default();

        while let Some((id, mut event)) = self.queue.pop_front() {
            let Some(idx) = self.index_of(&id) else {
                pagemaker_core::warn!(
                    id = %id,
                    kind = event.kind.dom_name(),
                    "dropping event for unknown element"
                );
                result.events_dropped += 1;
                continue;
            };

            event.time_stamp = now;
            let element = &mut self.elements[idx];
            match element.dispatch(&mut event, &mut self.registry) {
                Ok(Dispatch::Declined) => result.events_declined += 1,
                Ok(_) => {}
                Err(err) => {
                    pagemaker_core::warn!(id = %id, error = %err, "drag handler failed");
                    result.events_failed += 1;
                }
            }
            result.events_processed += 1;

            match event.kind {
                DragEventKind::Start => self.transfer = Some(event.data_transfer),
                DragEventKind::End => self.transfer = None,
                DragEventKind::Over | DragEventKind::Leave => {}
            }
        }

        for element in &mut self.elements {
            element.tick(now);
        }

        self.frame_idx += 1;
        result.animating = self.is_animating();
        result.frame_idx = self.frame_idx;
        result
    }

    // --- output -----------------------------------------------------------

    /// Render one element.
    pub fn view(&self, id: &str) -> Result<ElementView, HostError> {
        self.element(id)
            .map(Draggable::render)
            .ok_or_else(|| HostError::UnknownElement(id.to_string()))
    }

    /// Render every element in mount order.
    #[must_use]
    pub fn views(&self) -> Vec<ElementView> {
        self.elements.iter().map(Draggable::render).collect()
    }

    /// Payload of the gesture in flight, if a drag started and has not ended.
    pub fn active_payload(&self) -> Result<Option<DragPayload>, PayloadError> {
        self.transfer
            .as_ref()
            .map(DragPayload::read_from)
            .transpose()
    }

    /// Data channel of the gesture in flight.
    #[must_use]
    pub fn data_transfer(&self) -> Option<&DataTransfer> {
        self.transfer.as_ref()
    }

    // --- accessors --------------------------------------------------------

    /// Access a mounted element.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Draggable> {
        self.elements.iter().find(|e| e.props().id == id)
    }

    /// Shared drag registry.
    pub fn registry(&self) -> &DragContext {
        &self.registry
    }

    /// Mutably access the registry (for the receiving dropzone's drop handler).
    pub fn registry_mut(&mut self) -> &mut DragContext {
        &mut self.registry
    }

    /// Configuration handed to newly mounted elements.
    pub fn config(&self) -> &DraggableConfig {
        &self.config
    }

    /// Current clock time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Current frame index.
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    /// Events waiting for the next step.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Whether any element still has a moving spring or a pending reset.
    pub fn is_animating(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.is_animating() || e.pending_resets() > 0)
    }

    /// Number of mounted elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    // --- private helpers --------------------------------------------------

    fn index_of(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.props().id == id)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut Draggable, HostError> {
        self.elements
            .iter_mut()
            .find(|e| e.props().id == id)
            .ok_or_else(|| HostError::UnknownElement(id.to_string()))
    }
}
