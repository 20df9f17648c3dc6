//! Touch-target classification.
//!
//! All checks run in surface space: shape geometry is mapped through the
//! current transform before it is compared with the touch point. Handle
//! thresholds are fixed squared distances, so on-screen grab size does not
//! follow the zoom level.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::transform::Transform;

use super::registry::{ShapeRegistry, KIND_PRIORITY};
use super::{Geometry, ShapeKind};

/// Squared surface distance for rectangle corner and edge handles.
pub const RECT_HANDLE_RADIUS_SQ: f32 = 64.0 * 32.0;

/// Squared surface distance for polygon vertices.
pub const POLYGON_VERTEX_RADIUS_SQ: f32 = 256.0 * 200.0;

/// Part of a rectangle under the touch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectRegion {
    LeftTop,
    RightTop,
    LeftBottom,
    RightBottom,
    TopEdge,
    LeftEdge,
    BottomEdge,
    RightEdge,
    Center,
    OutOfBounds,
}

impl RectRegion {
    /// Classification order: corners, then the body, then edge midpoints.
    pub const CHECK_ORDER: [RectRegion; 9] = [
        RectRegion::LeftTop,
        RectRegion::RightTop,
        RectRegion::LeftBottom,
        RectRegion::RightBottom,
        RectRegion::Center,
        RectRegion::TopEdge,
        RectRegion::LeftEdge,
        RectRegion::BottomEdge,
        RectRegion::RightEdge,
    ];

    /// Handles drawn on a focused rectangle.
    pub const HANDLES: [RectRegion; 8] = [
        RectRegion::LeftTop,
        RectRegion::RightTop,
        RectRegion::LeftBottom,
        RectRegion::RightBottom,
        RectRegion::TopEdge,
        RectRegion::LeftEdge,
        RectRegion::BottomEdge,
        RectRegion::RightEdge,
    ];

    pub fn moves_left(self) -> bool {
        matches!(
            self,
            RectRegion::LeftTop | RectRegion::LeftBottom | RectRegion::LeftEdge
        )
    }

    pub fn moves_right(self) -> bool {
        matches!(
            self,
            RectRegion::RightTop | RectRegion::RightBottom | RectRegion::RightEdge
        )
    }

    pub fn moves_top(self) -> bool {
        matches!(
            self,
            RectRegion::LeftTop | RectRegion::RightTop | RectRegion::TopEdge
        )
    }

    pub fn moves_bottom(self) -> bool {
        matches!(
            self,
            RectRegion::LeftBottom | RectRegion::RightBottom | RectRegion::BottomEdge
        )
    }

    /// Position of this region's handle on `rect`, `None` for the body and
    /// out-of-bounds regions.
    pub fn handle(self, rect: &Rect) -> Option<Point> {
        let mid_x = (rect.left + rect.right) / 2.0;
        let mid_y = (rect.top + rect.bottom) / 2.0;
        let point = match self {
            RectRegion::LeftTop => Point::new(rect.left, rect.top),
            RectRegion::RightTop => Point::new(rect.right, rect.top),
            RectRegion::LeftBottom => Point::new(rect.left, rect.bottom),
            RectRegion::RightBottom => Point::new(rect.right, rect.bottom),
            RectRegion::TopEdge => Point::new(mid_x, rect.top),
            RectRegion::LeftEdge => Point::new(rect.left, mid_y),
            RectRegion::BottomEdge => Point::new(mid_x, rect.bottom),
            RectRegion::RightEdge => Point::new(rect.right, mid_y),
            RectRegion::Center | RectRegion::OutOfBounds => return None,
        };
        Some(point)
    }
}

/// Part of a polygon under the touch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonRegion {
    Inside,
    Vertex(usize),
    OutOfBounds,
}

/// Region of either shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Rect(RectRegion),
    Polygon(PolygonRegion),
}

impl Region {
    pub fn is_out_of_bounds(self) -> bool {
        matches!(
            self,
            Region::Rect(RectRegion::OutOfBounds) | Region::Polygon(PolygonRegion::OutOfBounds)
        )
    }

    /// Region used when nothing of `kind` was hit.
    pub fn miss(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Region::Rect(RectRegion::OutOfBounds),
            ShapeKind::Polygon => Region::Polygon(PolygonRegion::OutOfBounds),
        }
    }
}

/// Result of a hit-test: the matched shape id, if any, and its region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub id: Option<String>,
    pub region: Region,
}

impl Hit {
    pub fn miss(kind: ShapeKind) -> Self {
        Self {
            id: None,
            region: Region::miss(kind),
        }
    }

    fn on(id: &str, region: Region) -> Self {
        Self {
            id: Some(id.to_string()),
            region,
        }
    }
}

/// Classifies surface points against the shapes of a registry.
pub struct HitTester<'a> {
    registry: &'a ShapeRegistry,
    transform: Transform,
}

impl<'a> HitTester<'a> {
    pub fn new(registry: &'a ShapeRegistry, transform: Transform) -> Self {
        Self {
            registry,
            transform,
        }
    }

    /// Classify `point` against the first non-empty mapping in
    /// [`KIND_PRIORITY`] order.
    ///
    /// Returns `None` when the registry holds no shapes at all.
    pub fn classify(&self, point: Point, last_focused: Option<&str>) -> Option<Hit> {
        KIND_PRIORITY
            .iter()
            .find(|&&kind| self.registry.count(kind) > 0)
            .map(|&kind| self.classify_kind(kind, point, last_focused))
    }

    pub fn classify_kind(&self, kind: ShapeKind, point: Point, last_focused: Option<&str>) -> Hit {
        match kind {
            ShapeKind::Rectangle => self.classify_rect(point),
            ShapeKind::Polygon => self.classify_polygon(point, last_focused),
        }
    }

    /// Rectangle classification.
    ///
    /// Each region in [`RectRegion::CHECK_ORDER`] is checked across every
    /// rectangle before the next region is tried. Within one check the most
    /// recently inserted match wins, since it is drawn on top.
    pub fn classify_rect(&self, point: Point) -> Hit {
        let rects: Vec<(&str, Rect)> = self
            .registry
            .rects()
            .filter_map(|(id, shape)| match &shape.geometry {
                Geometry::Rect(rect) => Some((id, self.transform.map_rect(rect))),
                Geometry::Polygon(_) => None,
            })
            .collect();

        for region in RectRegion::CHECK_ORDER {
            let matched = rects.iter().rev().find(|(_, rect)| match region.handle(rect) {
                Some(handle) => handle.distance_sq(point) <= RECT_HANDLE_RADIUS_SQ,
                None => rect.contains(point),
            });
            if let Some((id, _)) = matched {
                return Hit::on(id, Region::Rect(region));
            }
        }
        Hit::miss(ShapeKind::Rectangle)
    }

    /// Polygon classification.
    ///
    /// `last_focused` is tested first; then every polygon in insertion order.
    /// For each polygon the interior is tested before the vertices.
    pub fn classify_polygon(&self, point: Point, last_focused: Option<&str>) -> Hit {
        if let Some(id) = last_focused {
            let region = self
                .registry
                .polygon(id)
                .and_then(|shape| self.polygon_region(&shape.geometry, point));
            if let Some(region) = region {
                return Hit::on(id, Region::Polygon(region));
            }
        }

        for (id, shape) in self.registry.polygons() {
            if let Some(region) = self.polygon_region(&shape.geometry, point) {
                return Hit::on(id, Region::Polygon(region));
            }
        }
        Hit::miss(ShapeKind::Polygon)
    }

    fn polygon_region(&self, geometry: &Geometry, point: Point) -> Option<PolygonRegion> {
        let Geometry::Polygon(polygon) = geometry else {
            return None;
        };
        let surface: Vec<Point> = polygon
            .points()
            .iter()
            .map(|&p| self.transform.map_point(p))
            .collect();

        if polygon_contains(&surface, point) {
            return Some(PolygonRegion::Inside);
        }
        surface
            .iter()
            .position(|vertex| vertex.distance_sq(point) <= POLYGON_VERTEX_RADIUS_SQ)
            .map(PolygonRegion::Vertex)
    }
}

/// Even-odd ray casting test.
///
/// Degenerate (collinear) polygons have no interior and contain nothing.
pub fn polygon_contains(vertices: &[Point], point: Point) -> bool {
    let mut inside = false;
    let mut j = match vertices.len() {
        0 => return false,
        n => n - 1,
    };
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::shape::{Color, Polygon, ShapeStatus};
    use proptest::prelude::*;

    proptest! {
        /// Property: with a rectangle exactly covering a polygon's bounding
        /// box, any point inside the rectangle resolves to the rectangle.
        #[test]
        fn prop_rect_priority_over_polygon(
            left in 0.0f32..=200.0,
            top in 0.0f32..=200.0,
            size in 50.0f32..=200.0,
            fx in 0.0f32..=1.0,
            fy in 0.0f32..=1.0,
        ) {
            let polygon = Polygon::new(vec![
                Point::new(left + size / 2.0, top),
                Point::new(left + size, top + size),
                Point::new(left, top + size),
            ]).unwrap();
            let rect = polygon.bounding_rect();

            let mut registry = ShapeRegistry::new();
            registry.insert_polygon("p", polygon, Color::RED, ShapeStatus::Active).unwrap();
            registry.insert_rect("r", rect, Color::RED).unwrap();

            let point = Point::new(left + fx * size, top + fy * size);
            let hit = HitTester::new(&registry, Transform::identity())
                .classify(point, Some("p"))
                .unwrap();
            prop_assert_eq!(hit.id.as_deref(), Some("r"));
            prop_assert!(matches!(hit.region, Region::Rect(_)));
        }
    }
}
