//! Ordered storage for crop shapes and the focused-shape pointer.
//!
//! Rectangles and polygons live in separate insertion-ordered mappings. Ids
//! are unique within a mapping; the two mappings do not check each other.

use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineError;
use crate::geometry::{Point, Rect};

use super::placement::ViewContext;
use super::{Color, Geometry, Polygon, Shape, ShapeKind, ShapeStatus};

/// Order in which shape kinds are consulted when both are present.
///
/// Hit-testing for drags and id lookups try rectangles before polygons.
pub const KIND_PRIORITY: [ShapeKind; 2] = [ShapeKind::Rectangle, ShapeKind::Polygon];

/// Insertion-ordered id -> shape mapping.
#[derive(Debug, Clone, Default)]
struct ShapeMap {
    order: Vec<String>,
    shapes: HashMap<String, Shape>,
}

impl ShapeMap {
    fn len(&self) -> usize {
        self.order.len()
    }

    fn contains(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }

    fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    /// Insert a new entry. The caller checks for duplicates first.
    fn insert(&mut self, id: &str, shape: Shape) {
        self.order.push(id.to_string());
        self.shapes.insert(id.to_string(), shape);
    }

    fn remove(&mut self, id: &str) -> Option<Shape> {
        let shape = self.shapes.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(shape)
    }

    fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.order
            .iter()
            .filter_map(move |id| self.shapes.get(id).map(|shape| (id.as_str(), shape)))
    }
}

/// All crop shapes on the surface.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    rects: ShapeMap,
    polygons: ShapeMap,
    focused: Option<String>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: ShapeKind) -> &ShapeMap {
        match kind {
            ShapeKind::Rectangle => &self.rects,
            ShapeKind::Polygon => &self.polygons,
        }
    }

    fn map_mut(&mut self, kind: ShapeKind) -> &mut ShapeMap {
        match kind {
            ShapeKind::Rectangle => &mut self.rects,
            ShapeKind::Polygon => &mut self.polygons,
        }
    }

    fn check_unique(&self, kind: ShapeKind, id: &str) -> Result<(), EngineError> {
        if self.map(kind).contains(id) {
            return Err(EngineError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, id: &str, shape: Shape) -> Result<(), EngineError> {
        let kind = shape.kind();
        self.check_unique(kind, id)?;
        debug!(id, %kind, "shape added");
        self.map_mut(kind).insert(id, shape);
        Ok(())
    }

    // ========================================================================
    // Adding shapes
    // ========================================================================

    /// Add a rectangle with default placement and focus it.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateId`] if a rectangle with `id` exists.
    pub fn add_rect(
        &mut self,
        id: &str,
        color: Color,
        view: &ViewContext,
    ) -> Result<(), EngineError> {
        self.check_unique(ShapeKind::Rectangle, id)?;
        self.insert_rect(id, view.default_rect(), color)?;
        self.focused = Some(id.to_string());
        Ok(())
    }

    /// Add a regular polygon with default placement and focus it.
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
        view: &ViewContext,
    ) -> Result<(), EngineError> {
        self.check_unique(ShapeKind::Polygon, id)?;
        let polygon = view.default_polygon(sides)?;
        self.insert_polygon(id, polygon, color, status)?;
        self.focused = Some(id.to_string());
        Ok(())
    }

    /// Add a rectangle given in relative coordinates. Focus is unchanged.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateId`] if a rectangle with `id` exists.
    pub fn add_rect_relative(
        &mut self,
        id: &str,
        color: Color,
        relative: &Rect,
        view: &ViewContext,
    ) -> Result<(), EngineError> {
        self.check_unique(ShapeKind::Rectangle, id)?;
        self.insert_rect(id, view.rect_from_relative(relative), color)
    }

    /// Add a polygon given in relative coordinates. Focus is unchanged.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateId`] if a polygon with `id` exists
    /// - [`EngineError::InvalidPolygon`] for fewer than three points
    pub fn add_polygon_relative(
        &mut self,
        id: &str,
        color: Color,
        relative: &[Point],
        status: ShapeStatus,
        view: &ViewContext,
    ) -> Result<(), EngineError> {
        self.check_unique(ShapeKind::Polygon, id)?;
        let polygon = view.polygon_from_relative(relative)?;
        self.insert_polygon(id, polygon, color, status)
    }

    /// Insert a rectangle with image-local geometry as-is.
    pub fn insert_rect(&mut self, id: &str, rect: Rect, color: Color) -> Result<(), EngineError> {
        self.insert(
            id,
            Shape::new(Geometry::Rect(rect), color, ShapeStatus::Active),
        )
    }

    /// Insert a polygon with image-local geometry as-is.
    pub fn insert_polygon(
        &mut self,
        id: &str,
        polygon: Polygon,
        color: Color,
        status: ShapeStatus,
    ) -> Result<(), EngineError> {
        self.insert(id, Shape::new(Geometry::Polygon(polygon), color, status))
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Remove the shape with `id` from whichever mapping holds it.
    ///
    /// Absent ids are ignored. Removing the focused shape clears focus.
    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        let removed = KIND_PRIORITY
            .iter()
            .find_map(|&kind| self.map_mut(kind).remove(id));
        if removed.is_some() {
            debug!(id, "shape removed");
            if self.focused.as_deref() == Some(id) {
                self.focused = None;
            }
        }
        removed
    }

    /// Flip the lock flag and return the new state.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool, EngineError> {
        let shape = self.require_mut(id)?;
        shape.locked = !shape.locked;
        let locked = shape.locked;
        debug!(id, locked, "shape lock toggled");
        Ok(locked)
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn set_color(&mut self, id: &str, color: Color) -> Result<(), EngineError> {
        self.require_mut(id)?.color = color;
        Ok(())
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no shape has this id.
    pub fn set_status(&mut self, id: &str, status: ShapeStatus) -> Result<(), EngineError> {
        self.require_mut(id)?.status = status;
        Ok(())
    }

    /// Replace the geometry of an existing shape. Returns whether it existed.
    pub(crate) fn set_geometry(&mut self, id: &str, geometry: Geometry) -> bool {
        match self.map_mut(geometry.kind()).get_mut(id) {
            Some(shape) => {
                shape.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_focus(&mut self, id: Option<&str>) {
        self.focused = id.map(str::to_string);
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Shape, EngineError> {
        let kind = self
            .kind_of(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        self.map_mut(kind)
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Implicit focus: when the focused id names no shape and polygons exist,
    /// focus moves to the first-inserted active polygon.
    ///
    /// Returns whether focus changed.
    pub fn refresh_focus(&mut self) -> bool {
        if let Some(id) = self.focused.as_deref() {
            if self.kind_of(id).is_some() {
                return false;
            }
        }
        let next = self
            .polygons
            .iter()
            .find(|(_, shape)| shape.is_active())
            .map(|(id, _)| id.to_string());
        if next == self.focused {
            return false;
        }
        debug!(from = ?self.focused, to = ?next, "focus refreshed");
        self.focused = next;
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Shape with `id`, rectangles first.
    pub fn get(&self, id: &str) -> Option<&Shape> {
        KIND_PRIORITY
            .iter()
            .find_map(|&kind| self.map(kind).get(id))
    }

    /// Kind of the mapping holding `id`, rectangles first.
    pub fn kind_of(&self, id: &str) -> Option<ShapeKind> {
        KIND_PRIORITY
            .iter()
            .copied()
            .find(|&kind| self.map(kind).contains(id))
    }

    pub fn rect(&self, id: &str) -> Option<&Shape> {
        self.rects.get(id)
    }

    pub fn polygon(&self, id: &str) -> Option<&Shape> {
        self.polygons.get(id)
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Rectangle ids in insertion order.
    pub fn rect_ids(&self) -> Vec<String> {
        self.rects.ids()
    }

    /// Polygon ids in insertion order.
    pub fn polygon_ids(&self) -> Vec<String> {
        self.polygons.ids()
    }

    pub fn rects(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.rects.iter()
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.polygons.iter()
    }

    /// Number of shapes of `kind`.
    pub fn count(&self, kind: ShapeKind) -> usize {
        self.map(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.len() == 0 && self.polygons.len() == 0
    }
}
