//! Host-facing engine owning the view, the shapes and the gesture state.
//!
//! # Coordinate System
//!
//! Three coordinate spaces meet here:
//!
//! - **Surface**: host pixels; touch events and [`Frame`] outlines use it
//! - **Image-local**: intrinsic image pixels; shape geometry is stored in it
//! - **Relative**: fractions of the displayed image bounds, see
//!   [`crate::shape::placement`]
//!
//! ## Event Flow
//!
//! Every host call that can change what is on screen returns the
//! [`EngineEvent`]s it produced. The engine never calls back into the host
//! itself, so a click handler is free to add or remove shapes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::geometry::{Point, Rect, Size};
use crate::gesture::{GestureOutcome, GestureStateMachine, Scene, TouchEvent};
use crate::shape::{
    Color, Geometry, HitTester, RectRegion, Shape, ShapeData, ShapeKind, ShapeRegistry,
    ShapeStatus, ViewContext,
};
use crate::transform::viewport::recenter;
use crate::transform::{BoundsTracker, Transform, TransformState};

// ============================================================================
// Events
// ============================================================================

/// Notification produced by the engine for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A single tap landed on a rectangle.
    RectangleClicked(ShapeData),
    /// A single tap landed on a polygon.
    PolygonClicked(ShapeData),
    /// The view jumped from `from` to `to`; the host may tween between them.
    AnimateTransform { from: Transform, to: Transform },
    /// Something visible changed.
    RedrawRequested,
}

impl EngineEvent {
    /// Route this event to the matching listener method.
    pub fn dispatch(&self, listener: &mut dyn CropListener) {
        match self {
            EngineEvent::RectangleClicked(data) => listener.on_rectangle_click(data),
            EngineEvent::PolygonClicked(data) => listener.on_polygon_click(data),
            EngineEvent::AnimateTransform { from, to } => listener.on_animate(from, to),
            EngineEvent::RedrawRequested => listener.on_redraw(),
        }
    }
}

/// Listener for Rust hosts. Every method defaults to a no-op.
pub trait CropListener {
    fn on_rectangle_click(&mut self, _shape: &ShapeData) {}

    fn on_polygon_click(&mut self, _shape: &ShapeData) {}

    fn on_animate(&mut self, _from: &Transform, _to: &Transform) {}

    fn on_redraw(&mut self) {}
}

// ============================================================================
// Render list
// ============================================================================

/// One shape as it should be drawn, in surface coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawShape {
    pub id: String,
    pub kind: ShapeKind,
    pub color: Color,
    pub locked: bool,
    pub status: ShapeStatus,
    /// Closed outline; rectangles list their four corners clockwise from the
    /// top-left.
    pub outline: Vec<Point>,
    /// Drag handles; only the focused active shape has any.
    pub handles: Vec<Point>,
    pub focused: bool,
}

/// Everything the host needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub transform: Transform,
    /// Surface bounds of the image.
    pub bounds: Rect,
    /// Rectangles in insertion order, then polygons in insertion order.
    pub shapes: Vec<DrawShape>,
}

// ============================================================================
// Engine
// ============================================================================

/// Zoomable image surface with editable crop shapes.
#[derive(Debug, Clone)]
pub struct CropEngine {
    config: EngineConfig,
    surface: Size,
    transform: TransformState,
    bounds: BoundsTracker,
    registry: ShapeRegistry,
    gestures: GestureStateMachine,
    redraw: bool,
}

impl CropEngine {
    /// Create an engine with the image fit-centered in the surface.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration, validated here
    /// * `surface` - Host surface size in pixels
    /// * `image` - Intrinsic image size in pixels
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidDimensions`] for a non-positive size
    /// - [`EngineError::InvalidScaleRange`] for an invalid configuration
    pub fn new(config: EngineConfig, surface: Size, image: Size) -> Result<Self, EngineError> {
        check_size(surface)?;
        check_size(image)?;
        Self::with_start_transform(config, surface, image, Transform::fit_center(image, surface))
    }

    /// Create an engine whose first layout is `start`.
    ///
    /// # Errors
    ///
    /// Same as [`CropEngine::new`]; a non-positive start scale is reported as
    /// [`EngineError::InvalidScaleRange`].
    pub fn with_start_transform(
        config: EngineConfig,
        surface: Size,
        image: Size,
        start: Transform,
    ) -> Result<Self, EngineError> {
        check_size(surface)?;
        check_size(image)?;
        let config = config.validate()?;
        if start.scale.is_nan() || start.scale <= 0.0 {
            return Err(EngineError::InvalidScaleRange {
                min: config.min_scale * start.scale,
                max: config.max_scale * start.scale,
            });
        }
        let transform = TransformState::new(start, config.min_scale, config.max_scale)?;
        debug!(?surface, ?image, scale = start.scale, "engine created");

        Ok(Self {
            config,
            surface,
            transform,
            bounds: BoundsTracker::new(image),
            registry: ShapeRegistry::new(),
            gestures: GestureStateMachine::new(&config),
            redraw: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface_size(&self) -> Size {
        self.surface
    }

    pub fn image_size(&self) -> Size {
        self.bounds.image_size()
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Snapshot of the current view for placement and relative conversion.
    pub fn view(&self) -> ViewContext {
        let transform = self.transform.current();
        ViewContext {
            transform,
            bounds: self.bounds.bounds(&transform),
            surface: self.surface,
            image: self.bounds.image_size(),
            scale_factor: self.transform.scale_factor(),
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn transform(&self) -> Transform {
        self.transform.current()
    }

    pub fn start_transform(&self) -> Transform {
        self.transform.start()
    }

    /// Absolute scale of the current transform.
    pub fn current_scale(&self) -> f32 {
        self.transform.current_scale()
    }

    /// Current scale relative to the starting scale.
    pub fn scale_factor(&self) -> f32 {
        self.transform.scale_factor()
    }

    /// Surface-space bounds of the image.
    pub fn bounds(&self) -> Rect {
        self.bounds.bounds(&self.transform.current())
    }

    /// Return to the starting transform and abandon any gesture in progress.
    pub fn reset(&mut self) -> Vec<EngineEvent> {
        self.gestures.reset();
        let from = self.transform.current();
        let to = self.transform.start();
        let mut events = Vec::new();
        if from != to {
            self.apply_settle(from, to, &mut events);
        }
        events
    }

    /// Replace the relative zoom range.
    ///
    /// The double-tap zoom factor is clamped into the new range. A view
    /// zoomed outside the new range is scaled back into it about the surface
    /// center, and the returned events describe that jump.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidScaleRange`]; the previous range is kept.
    pub fn set_scale_range(&mut self, min: f32, max: f32) -> Result<Vec<EngineEvent>, EngineError> {
        self.transform.set_scale_range(min, max)?;
        self.config.min_scale = min;
        self.config.max_scale = max;
        self.config.double_tap_zoom_factor = self.config.double_tap_zoom_factor.clamp(min, max);
        Ok(self.fit_scale_range())
    }

    /// Replace the whole configuration.
    ///
    /// Takes effect from the next touch event. Changed tap timings abandon
    /// any gesture in progress. The view is pulled into the new scale range
    /// as in [`CropEngine::set_scale_range`].
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidScaleRange`]; the previous configuration is kept.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<Vec<EngineEvent>, EngineError> {
        let config = config.validate()?;
        self.transform
            .set_scale_range(config.min_scale, config.max_scale)?;
        if config.gestures != self.config.gestures {
            self.gestures = GestureStateMachine::new(&config);
        }
        debug!(?config, "configuration replaced");
        self.config = config;
        Ok(self.fit_scale_range())
    }

    fn fit_scale_range(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let from = self.transform.current();
        let center = self.surface.center();
        if !self.transform.clamp_scale(center) {
            return events;
        }
        let mut to = self.transform.current();
        if self.config.auto_center {
            let bounds = self.bounds.bounds(&to);
            to = recenter(&to, &bounds, self.bounds.displayed_size(&to), self.surface);
        }
        debug!(from = from.scale, to = to.scale, "view pulled into scale range");
        self.apply_settle(from, to, &mut events);
        events
    }

    // ========================================================================
    // Shapes
    // ========================================================================

    /// Add a rectangle centered on the visible part of the image and focus it.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateId`] if a rectangle with `id` exists.
    pub fn add_rect(&mut self, id: &str, color: Color) -> Result<(), EngineError> {
        let view = self.view();
        self.registry.add_rect(id, color, &view)?;
        self.redraw = true;
        Ok(())
    }

    /// Add a regular polygon centered on the visible part of the image and
    /// focus it.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateId`] if a polygon with `id` exists
    /// - [`EngineError::InvalidPolygon`] for fewer than three sides
    pub fn add_polygon(
        &mut self,
        id: &str,
        color: Color,
        sides: usize,
        status: ShapeStatus,
    ) -> Result<(), EngineError> {
        let view = self.view();
        self.registry.add_polygon(id, color, sides, status, &view)?;
        self.redraw = true;
        Ok(())
    }

    /// Add a rectangle from relative coordinates.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateId`] if a rectangle with `id` exists.
    pub fn add_rect_relative(
        &mut self,
        id: &str,
        color: Color,
        relative: &Rect,
    ) -> Result<(), EngineError> {
        let view = self.view();
        self.registry.add_rect_relative(id, color, relative, &view)?;
        self.redraw = true;
        Ok(())
    }

    /// Add a polygon from relative vertices.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateId`] if a polygon with `id` exists
    /// - [`EngineError::InvalidPolygon`] for fewer than three vertices
    pub fn add_polygon_relative(
        &mut self,
        id: &str,
        color: Color,
        relative: &[Point],
        status: ShapeStatus,
    ) -> Result<(), EngineError> {
        let view = self.view();
        self.registry
            .add_polygon_relative(id, color, relative, status, &view)?;
        self.redraw = true;
        Ok(())
    }

    /// Remove a shape. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.registry.remove(id).is_some();
        self.redraw |= removed;
        removed
    }

    /// Flip the lock flag of a shape and return the new value.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool, EngineError> {
        let locked = self.registry.toggle_lock(id)?;
        self.redraw = true;
        Ok(locked)
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn set_color(&mut self, id: &str, color: Color) -> Result<(), EngineError> {
        self.registry.set_color(id, color)?;
        self.redraw = true;
        Ok(())
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn set_status(&mut self, id: &str, status: ShapeStatus) -> Result<(), EngineError> {
        self.registry.set_status(id, status)?;
        self.redraw = true;
        Ok(())
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.registry.focused_id()
    }

    pub fn rect_ids(&self) -> Vec<String> {
        self.registry.rect_ids()
    }

    pub fn polygon_ids(&self) -> Vec<String> {
        self.registry.polygon_ids()
    }

    /// Owned snapshot of a shape.
    pub fn shape(&self, id: &str) -> Option<ShapeData> {
        self.registry.get(id).map(|shape| ShapeData::new(id, shape))
    }

    /// Geometry of a shape in relative coordinates.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn relative_geometry(&self, id: &str) -> Result<Geometry, EngineError> {
        let shape = self
            .registry
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Ok(self.view().geometry_to_relative(&shape.geometry))
    }

    /// Every rectangle in relative coordinates, in insertion order.
    pub fn relative_rects(&self) -> Vec<(String, Rect)> {
        let view = self.view();
        self.registry
            .rects()
            .filter_map(|(id, shape)| match &shape.geometry {
                Geometry::Rect(rect) => Some((id.to_string(), view.rect_to_relative(rect))),
                Geometry::Polygon(_) => None,
            })
            .collect()
    }

    /// Every polygon's vertices in relative coordinates, in insertion order.
    pub fn relative_polygons(&self) -> Vec<(String, Vec<Point>)> {
        let view = self.view();
        self.registry
            .polygons()
            .filter_map(|(id, shape)| match &shape.geometry {
                Geometry::Polygon(polygon) => Some((
                    id.to_string(),
                    polygon.points().iter().map(|&p| view.to_relative(p)).collect(),
                )),
                Geometry::Rect(_) => None,
            })
            .collect()
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Feed one touch event.
    pub fn on_touch_event(&mut self, event: &TouchEvent) -> Vec<EngineEvent> {
        let mut scene = Scene {
            config: &self.config,
            transform: &mut self.transform,
            bounds: &self.bounds,
            registry: &mut self.registry,
            surface: self.surface,
        };
        let outcomes = self.gestures.handle(event, &mut scene);
        self.apply_outcomes(outcomes)
    }

    /// Advance host time; confirms a pending single tap once its double-tap
    /// window has passed.
    pub fn tick(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        let outcomes: Vec<_> = self.gestures.tick(now_ms).into_iter().collect();
        self.apply_outcomes(outcomes)
    }

    /// Whether a registry or view change happened since the last call.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn apply_outcomes(&mut self, outcomes: Vec<GestureOutcome>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut changed = false;
        for outcome in outcomes {
            match outcome {
                GestureOutcome::Changed => changed = true,
                GestureOutcome::Tap(at) => {
                    self.tap(at, &mut events);
                    changed = true;
                }
                GestureOutcome::Settle { from, to } => self.apply_settle(from, to, &mut events),
            }
        }
        if changed && !events.contains(&EngineEvent::RedrawRequested) {
            self.redraw = true;
            events.push(EngineEvent::RedrawRequested);
        }
        events
    }

    fn apply_settle(&mut self, from: Transform, to: Transform, events: &mut Vec<EngineEvent>) {
        self.transform.set(to);
        self.redraw = true;
        if self.config.animate_on_reset {
            events.push(EngineEvent::AnimateTransform { from, to });
        }
        events.push(EngineEvent::RedrawRequested);
    }

    /// Confirmed single tap: notify every kind that was hit and move focus to
    /// the hit, polygons taking precedence.
    fn tap(&mut self, at: Point, events: &mut Vec<EngineEvent>) {
        self.registry.refresh_focus();
        let tester = HitTester::new(&self.registry, self.transform.current());
        let rect_hit = tester.classify_rect(at).id;
        let polygon_hit = tester
            .classify_polygon(at, self.registry.focused_id())
            .id;

        if let Some(id) = rect_hit.as_deref() {
            if let Some(shape) = self.registry.rect(id) {
                events.push(EngineEvent::RectangleClicked(ShapeData::new(id, shape)));
            }
        }
        if let Some(id) = polygon_hit.as_deref() {
            if let Some(shape) = self.registry.polygon(id) {
                events.push(EngineEvent::PolygonClicked(ShapeData::new(id, shape)));
            }
        }

        let focus = polygon_hit.or(rect_hit);
        debug!(x = at.x, y = at.y, focus = ?focus, "tap");
        self.registry.set_focus(focus.as_deref());
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Build the render list for the current state.
    ///
    /// Runs the implicit focus refresh first, so a removed focused shape
    /// hands its handles to the first active polygon.
    pub fn frame(&mut self) -> Frame {
        self.registry.refresh_focus();
        let transform = self.transform.current();
        let focused = self.registry.focused_id();

        let mut shapes = Vec::with_capacity(
            self.registry.count(ShapeKind::Rectangle) + self.registry.count(ShapeKind::Polygon),
        );
        for (id, shape) in self.registry.rects().chain(self.registry.polygons()) {
            shapes.push(draw_shape(id, shape, &transform, focused == Some(id)));
        }

        Frame {
            transform,
            bounds: self.bounds.bounds(&transform),
            shapes,
        }
    }
}

fn check_size(size: Size) -> Result<(), EngineError> {
    if !size.is_valid() {
        return Err(EngineError::InvalidDimensions {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

fn draw_shape(id: &str, shape: &Shape, transform: &Transform, focused: bool) -> DrawShape {
    let with_handles = focused && shape.is_active();
    let (outline, handles) = match &shape.geometry {
        Geometry::Rect(rect) => {
            let surface = transform.map_rect(rect);
            let handles = if with_handles {
                RectRegion::HANDLES
                    .iter()
                    .filter_map(|region| region.handle(&surface))
                    .collect()
            } else {
                Vec::new()
            };
            (surface.corners().to_vec(), handles)
        }
        Geometry::Polygon(polygon) => {
            let outline: Vec<Point> = polygon
                .points()
                .iter()
                .map(|&p| transform.map_point(p))
                .collect();
            let handles = if with_handles {
                outline.clone()
            } else {
                Vec::new()
            };
            (outline, handles)
        }
    };

    DrawShape {
        id: id.to_string(),
        kind: shape.kind(),
        color: shape.color,
        locked: shape.locked,
        status: shape.status,
        outline,
        handles,
        focused,
    }
}
