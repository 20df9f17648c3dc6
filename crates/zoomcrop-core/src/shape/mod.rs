//! Crop shapes: the data model shared by the registry, hit-testing and the
//! constraint solver.
//!
//! A [`Shape`] carries the fields every crop object has (color, lock flag,
//! status) and a kind-specific [`Geometry`] in image-local coordinates.
//!
//! ## Shape Kinds
//!
//! - **Rectangle**: axis-aligned, edited by corners, edge midpoints or body
//! - **Polygon**: three or more vertices, edited by vertex or body

pub mod constraint;
pub mod hit;
pub mod placement;
pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::{Point, Rect};

pub use constraint::ConstraintEngine;
pub use hit::{Hit, HitTester, PolygonRegion, RectRegion, Region};
pub use placement::ViewContext;
pub use registry::{ShapeRegistry, KIND_PRIORITY};

/// Packed ARGB color (`0xAARRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);
    pub const GREEN: Color = Color(0xFF00_FF00);
    pub const BLUE: Color = Color(0xFF00_00FF);

    pub fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(u32::from_be_bytes([a, r, g, b]))
    }

    pub fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    pub fn red(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    pub fn green(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    pub fn blue(self) -> u8 {
        self.0.to_be_bytes()[3]
    }
}

/// Whether a shape takes part in editing.
///
/// Inactive shapes are drawn without handles and are skipped when focus is
/// assigned implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeStatus {
    #[default]
    Active,
    Inactive,
}

/// Which registry mapping a shape lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Polygon,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Rectangle => f.write_str("Crop rectangle"),
            ShapeKind::Polygon => f.write_str("Crop polygon"),
        }
    }
}

/// Closed polygon with at least three vertices, in winding order.
///
/// Collinear or self-intersecting vertex sets are accepted; only the vertex
/// count is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Minimum number of vertices.
    pub const MIN_VERTICES: usize = 3;

    /// Create a polygon from its vertices.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPolygon`] for fewer than three vertices.
    pub fn new(points: Vec<Point>) -> Result<Self, EngineError> {
        if points.len() < Self::MIN_VERTICES {
            return Err(EngineError::InvalidPolygon {
                vertices: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed polygon.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn vertex(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub(crate) fn vertex_mut(&mut self, index: usize) -> Option<&mut Point> {
        self.points.get_mut(index)
    }

    /// Every vertex shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        self.map_points(|p| p.offset(dx, dy))
    }

    /// Polygon with `f` applied to every vertex, vertex count preserved.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            points: self.points.iter().map(|&p| f(p)).collect(),
        }
    }

    /// Axis-aligned bounding box of the vertices.
    pub fn bounding_rect(&self) -> Rect {
        Rect::enclosing(&self.points).unwrap_or_default()
    }
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = EngineError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Polygon::new(points)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.points
    }
}

/// Kind-specific geometry in image-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Rect(Rect),
    Polygon(Polygon),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rect(_) => ShapeKind::Rectangle,
            Geometry::Polygon(_) => ShapeKind::Polygon,
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        match self {
            Geometry::Rect(rect) => *rect,
            Geometry::Polygon(polygon) => polygon.bounding_rect(),
        }
    }
}

/// A crop object stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub geometry: Geometry,
    pub color: Color,
    /// Locked shapes ignore drags and resizes.
    pub locked: bool,
    pub status: ShapeStatus,
}

impl Shape {
    pub fn new(geometry: Geometry, color: Color, status: ShapeStatus) -> Self {
        Self {
            geometry,
            color,
            locked: false,
            status,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn is_active(&self) -> bool {
        self.status == ShapeStatus::Active
    }
}

/// Owned snapshot of a shape handed to click listeners.
///
/// Detached from the registry, so a listener may add or remove shapes while
/// holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
    pub id: String,
    pub kind: ShapeKind,
    pub geometry: Geometry,
    pub color: Color,
    pub locked: bool,
    pub status: ShapeStatus,
}

impl ShapeData {
    pub fn new(id: &str, shape: &Shape) -> Self {
        Self {
            id: id.to_string(),
            kind: shape.kind(),
            geometry: shape.geometry.clone(),
            color: shape.color,
            locked: shape.locked,
            status: shape.status,
        }
    }
}
