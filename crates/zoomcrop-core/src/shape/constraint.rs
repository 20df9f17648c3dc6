//! Move and resize solving for crop shapes.
//!
//! Shapes live in image-local space but are kept inside the surface bounds
//! of the image, which are in surface space. Every check maps the shape
//! through the current transform, measures the per-side overflow in surface
//! space, and converts the correction back to image-local units before
//! applying it.
//!
//! ## Operations
//!
//! - **Move** (rectangle body, polygon interior): rigid translation, then the
//!   whole shape is shifted back by the overflow on each side
//! - **Resize** (corners, edges, vertices): only the grabbed coordinates move
//!   and only those coordinates are clamped; rectangles then have their
//!   minimum width/height restored from the anchored side
//!
//! Lock flags are not checked here.

use tracing::trace;

use crate::geometry::{Point, Rect};
use crate::transform::Transform;

use super::hit::{PolygonRegion, RectRegion, Region};
use super::{Geometry, Polygon};

/// Pure geometry solver bound to one transform and one bounds rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintEngine {
    transform: Transform,
    bounds: Rect,
    min_width: f32,
    min_height: f32,
}

impl ConstraintEngine {
    /// Create a solver.
    ///
    /// # Arguments
    /// * `transform` - Current view transform
    /// * `bounds` - Surface-space bounds of the image under `transform`
    /// * `min_width` / `min_height` - Minimum rectangle size in image-local units
    pub fn new(transform: Transform, bounds: Rect, min_width: f32, min_height: f32) -> Self {
        Self {
            transform,
            bounds,
            min_width,
            min_height,
        }
    }

    /// Apply an image-local drag of `(dx, dy)` on `region` of `geometry`.
    ///
    /// A region of the other shape kind, or an out-of-bounds region, returns
    /// the geometry unchanged.
    pub fn translate(&self, geometry: &Geometry, region: Region, dx: f32, dy: f32) -> Geometry {
        match (geometry, region) {
            (Geometry::Rect(rect), Region::Rect(region)) => {
                Geometry::Rect(self.translate_rect(*rect, region, dx, dy))
            }
            (Geometry::Polygon(polygon), Region::Polygon(region)) => {
                Geometry::Polygon(self.translate_polygon(polygon, region, dx, dy))
            }
            _ => geometry.clone(),
        }
    }

    pub fn translate_rect(&self, rect: Rect, region: RectRegion, dx: f32, dy: f32) -> Rect {
        match region {
            RectRegion::OutOfBounds => rect,
            RectRegion::Center => self.clamp_rect_move(rect.offset(dx, dy)),
            _ => {
                let mut moved = rect;
                if region.moves_left() {
                    moved.left += dx;
                }
                if region.moves_right() {
                    moved.right += dx;
                }
                if region.moves_top() {
                    moved.top += dy;
                }
                if region.moves_bottom() {
                    moved.bottom += dy;
                }
                let clamped = self.clamp_rect_resize(moved, region);
                self.pin_min_size(clamped, region)
            }
        }
    }

    pub fn translate_polygon(
        &self,
        polygon: &Polygon,
        region: PolygonRegion,
        dx: f32,
        dy: f32,
    ) -> Polygon {
        match region {
            PolygonRegion::OutOfBounds => polygon.clone(),
            PolygonRegion::Inside => self.clamp_polygon_move(&polygon.offset(dx, dy)),
            PolygonRegion::Vertex(index) => {
                let mut moved = polygon.clone();
                if let Some(vertex) = moved.vertex_mut(index) {
                    *vertex = self.clamp_point(vertex.offset(dx, dy));
                }
                moved
            }
        }
    }

    /// Shift the rectangle back inside the bounds, each side independently.
    pub fn clamp_rect_move(&self, rect: Rect) -> Rect {
        let (sx, sy) = self.move_correction(&rect);
        if sx != 0.0 || sy != 0.0 {
            trace!(sx, sy, "rectangle move clamped");
        }
        rect.offset(sx, sy)
    }

    /// Shift every vertex back by the overflow of the polygon's bounding box.
    pub fn clamp_polygon_move(&self, polygon: &Polygon) -> Polygon {
        let (sx, sy) = self.move_correction(&polygon.bounding_rect());
        if sx == 0.0 && sy == 0.0 {
            return polygon.clone();
        }
        trace!(sx, sy, "polygon move clamped");
        polygon.offset(sx, sy)
    }

    /// Image-local shift that undoes the per-side overflow of `rect`.
    fn move_correction(&self, rect: &Rect) -> (f32, f32) {
        let surface = self.transform.map_rect(rect);
        let mut sx = 0.0;
        let mut sy = 0.0;

        let left = surface.left - self.bounds.left;
        let right = surface.right - self.bounds.right;
        let top = surface.top - self.bounds.top;
        let bottom = surface.bottom - self.bounds.bottom;

        if left < 0.0 {
            sx -= left;
        }
        if right > 0.0 {
            sx -= right;
        }
        if top < 0.0 {
            sy -= top;
        }
        if bottom > 0.0 {
            sy -= bottom;
        }

        (
            self.transform.invert_length(sx),
            self.transform.invert_length(sy),
        )
    }

    fn clamp_rect_resize(&self, mut rect: Rect, region: RectRegion) -> Rect {
        let t = &self.transform;
        if region.moves_left() && t.map_x(rect.left) < self.bounds.left {
            rect.left = t.invert_x(self.bounds.left);
        }
        if region.moves_right() && t.map_x(rect.right) > self.bounds.right {
            rect.right = t.invert_x(self.bounds.right);
        }
        if region.moves_top() && t.map_y(rect.top) < self.bounds.top {
            rect.top = t.invert_y(self.bounds.top);
        }
        if region.moves_bottom() && t.map_y(rect.bottom) > self.bounds.bottom {
            rect.bottom = t.invert_y(self.bounds.bottom);
        }
        rect
    }

    /// Restore the minimum size by moving the dragged side away from the
    /// anchored one.
    fn pin_min_size(&self, mut rect: Rect, region: RectRegion) -> Rect {
        if rect.width() < self.min_width {
            if region.moves_left() {
                rect.left = rect.right - self.min_width;
            } else if region.moves_right() {
                rect.right = rect.left + self.min_width;
            }
        }
        if rect.height() < self.min_height {
            if region.moves_top() {
                rect.top = rect.bottom - self.min_height;
            } else if region.moves_bottom() {
                rect.bottom = rect.top + self.min_height;
            }
        }
        rect
    }

    fn clamp_point(&self, point: Point) -> Point {
        let t = &self.transform;
        let mut clamped = point;
        let x = t.map_x(point.x);
        let y = t.map_y(point.y);
        if x < self.bounds.left {
            clamped.x = t.invert_x(self.bounds.left);
        } else if x > self.bounds.right {
            clamped.x = t.invert_x(self.bounds.right);
        }
        if y < self.bounds.top {
            clamped.y = t.invert_y(self.bounds.top);
        } else if y > self.bounds.bottom {
            clamped.y = t.invert_y(self.bounds.bottom);
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect {
        left: 0.0,
        top: 0.0,
        right: 400.0,
        bottom: 400.0,
    };

    fn identity() -> ConstraintEngine {
        ConstraintEngine::new(Transform::identity(), BOUNDS, 10.0, 10.0)
    }

    fn square() -> Rect {
        Rect::new(100.0, 100.0, 300.0, 300.0)
    }

    fn triangle() -> Polygon {
        Polygon::new(vec![
            Point::new(200.0, 100.0),
            Point::new(300.0, 300.0),
            Point::new(100.0, 300.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_corner_drag_then_clamp() {
        let engine = identity();
        let rect = engine.translate_rect(square(), RectRegion::RightBottom, 50.0, 50.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 350.0, 350.0));

        let rect = engine.translate_rect(rect, RectRegion::RightBottom, 500.0, 500.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 400.0, 400.0));
    }

    #[test]
    fn test_edge_moves_single_coordinate() {
        let engine = identity();
        let rect = engine.translate_rect(square(), RectRegion::TopEdge, 30.0, -20.0);
        assert_eq!(rect, Rect::new(100.0, 80.0, 300.0, 300.0));

        let rect = engine.translate_rect(square(), RectRegion::LeftEdge, -20.0, 30.0);
        assert_eq!(rect, Rect::new(80.0, 100.0, 300.0, 300.0));
    }

    #[test]
    fn test_center_move_clamps_whole_rect() {
        let engine = identity();
        let rect = engine.translate_rect(square(), RectRegion::Center, -150.0, 250.0);
        // Shifted back so it touches the left and bottom bounds, size kept.
        assert_eq!(rect, Rect::new(0.0, 200.0, 200.0, 400.0));
    }

    #[test]
    fn test_min_size_pins_dragged_side() {
        let engine = identity();
        // Drag the left edge past the right edge.
        let rect = engine.translate_rect(square(), RectRegion::LeftEdge, 500.0, 0.0);
        assert_eq!(rect.right, 300.0);
        assert_eq!(rect.left, 290.0);

        // Drag the bottom-right corner past the top-left corner.
        let rect = engine.translate_rect(square(), RectRegion::RightBottom, -400.0, -400.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 110.0, 110.0));
    }

    #[test]
    fn test_overflow_converted_to_image_units() {
        // Zoomed 2x, image [0,0,200,200] covers surface [0,0,400,400].
        let engine = ConstraintEngine::new(Transform::new(2.0, 0.0, 0.0), BOUNDS, 10.0, 10.0);
        let rect = Rect::new(50.0, 50.0, 150.0, 150.0);
        let rect = engine.translate_rect(rect, RectRegion::Center, 100.0, 0.0);
        assert_eq!(rect, Rect::new(100.0, 50.0, 200.0, 150.0));
    }

    #[test]
    fn test_out_of_bounds_region_is_noop() {
        let engine = identity();
        assert_eq!(engine.translate_rect(square(), RectRegion::OutOfBounds, 5.0, 5.0), square());
        let polygon = triangle();
        let moved = engine.translate_polygon(&polygon, PolygonRegion::OutOfBounds, 5.0, 5.0);
        assert_eq!(moved, polygon);
    }

    #[test]
    fn test_polygon_vertex_clamped() {
        let engine = identity();
        let polygon = engine.translate_polygon(&triangle(), PolygonRegion::Vertex(0), 0.0, -250.0);
        assert_eq!(polygon.vertex(0), Some(Point::new(200.0, 0.0)));
        // Other vertices untouched.
        assert_eq!(polygon.vertex(1), Some(Point::new(300.0, 300.0)));
    }

    #[test]
    fn test_polygon_move_shifts_every_vertex() {
        let engine = identity();
        let polygon = engine.translate_polygon(&triangle(), PolygonRegion::Inside, 150.0, 0.0);
        // Rightmost vertex would be at 450; everything shifts back by 50.
        assert_eq!(polygon.vertex(0), Some(Point::new(300.0, 100.0)));
        assert_eq!(polygon.vertex(1), Some(Point::new(400.0, 300.0)));
        assert_eq!(polygon.vertex(2), Some(Point::new(200.0, 300.0)));
    }

    #[test]
    fn test_mismatched_region_kind() {
        let engine = identity();
        let geometry = Geometry::Rect(square());
        let moved = engine.translate(&geometry, Region::Polygon(PolygonRegion::Inside), 10.0, 10.0);
        assert_eq!(moved, geometry);
    }
}
