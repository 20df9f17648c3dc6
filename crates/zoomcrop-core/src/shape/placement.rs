//! Placement of new shapes and conversion to and from relative coordinates.
//!
//! # Coordinate System
//!
//! Relative coordinates are fractions of the current surface bounds of the
//! image: `(0, 0)` is the top-left corner of the displayed image and `(1, 1)`
//! its bottom-right corner, whatever the pan and zoom. Hosts persist shapes
//! in this form.

use std::f32::consts::PI;

use crate::error::EngineError;
use crate::geometry::{Point, Rect, Size};
use crate::transform::Transform;

use super::constraint::ConstraintEngine;
use super::{Geometry, Polygon};

/// Snapshot of the view needed to place and convert shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    /// Current view transform.
    pub transform: Transform,
    /// Surface-space bounds of the image under `transform`.
    pub bounds: Rect,
    /// Surface size.
    pub surface: Size,
    /// Intrinsic image size.
    pub image: Size,
    /// Current scale relative to the start scale.
    pub scale_factor: f32,
}

impl ViewContext {
    /// Edge length of a newly added shape in image-local units.
    ///
    /// Half the smaller image dimension as displayed at the start scale, so a
    /// new shape has the same on-screen size whatever the current zoom.
    pub fn default_edge(&self) -> f32 {
        self.image.width.min(self.image.height) / (2.0 * self.scale_factor)
    }

    /// Image-local center of a newly added shape.
    ///
    /// Horizontally this is the surface center mapped back into the image.
    /// Vertically it is the same while the displayed image is taller than
    /// the surface, and the image's own center otherwise.
    pub fn default_center(&self) -> Point {
        let surface_center = self.transform.invert_point(self.surface.center());
        let displayed_height = self.image.height * self.transform.scale;
        let y = if displayed_height > self.surface.height {
            surface_center.y
        } else {
            self.image.center().y
        };
        Point::new(surface_center.x, y)
    }

    /// Default square for a new rectangle, clamped into the bounds.
    pub fn default_rect(&self) -> Rect {
        let rect = Rect::square_around(self.default_center(), self.default_edge());
        self.mover().clamp_rect_move(rect)
    }

    /// Regular polygon with `sides` vertices inscribed in the default square,
    /// clamped into the bounds.
    ///
    /// Vertex 0 sits at 12 o'clock; the rest follow clockwise at equal angles.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPolygon`] for fewer than three sides.
    pub fn default_polygon(&self, sides: usize) -> Result<Polygon, EngineError> {
        if sides < Polygon::MIN_VERTICES {
            return Err(EngineError::InvalidPolygon { vertices: sides });
        }
        let center = self.default_center();
        let radius = self.default_edge() / 2.0;
        let step = 2.0 * PI / sides as f32;

        let points = (0..sides)
            .map(|i| {
                let angle = step * i as f32;
                Point::new(center.x + radius * angle.sin(), center.y - radius * angle.cos())
            })
            .collect();
        let polygon = Polygon::new(points)?;
        Ok(self.mover().clamp_polygon_move(&polygon))
    }

    /// Image-local point to relative coordinates.
    pub fn to_relative(&self, point: Point) -> Point {
        let surface = self.transform.map_point(point);
        Point::new(
            (surface.x - self.bounds.left) / self.bounds.width(),
            (surface.y - self.bounds.top) / self.bounds.height(),
        )
    }

    /// Relative coordinates to an image-local point.
    pub fn from_relative(&self, relative: Point) -> Point {
        let surface = Point::new(
            relative.x * self.bounds.width() + self.bounds.left,
            relative.y * self.bounds.height() + self.bounds.top,
        );
        self.transform.invert_point(surface)
    }

    pub fn rect_to_relative(&self, rect: &Rect) -> Rect {
        let lt = self.to_relative(Point::new(rect.left, rect.top));
        let rb = self.to_relative(Point::new(rect.right, rect.bottom));
        Rect::new(lt.x, lt.y, rb.x, rb.y)
    }

    pub fn rect_from_relative(&self, relative: &Rect) -> Rect {
        let lt = self.from_relative(Point::new(relative.left, relative.top));
        let rb = self.from_relative(Point::new(relative.right, relative.bottom));
        Rect::new(lt.x, lt.y, rb.x, rb.y)
    }

    /// Relative vertices to an image-local polygon.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPolygon`] for fewer than three vertices.
    pub fn polygon_from_relative(&self, relative: &[Point]) -> Result<Polygon, EngineError> {
        Polygon::new(relative.iter().map(|&p| self.from_relative(p)).collect())
    }

    pub fn geometry_to_relative(&self, geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::Rect(rect) => Geometry::Rect(self.rect_to_relative(rect)),
            Geometry::Polygon(polygon) => {
                Geometry::Polygon(polygon.map_points(|p| self.to_relative(p)))
            }
        }
    }

    /// Solver used for placement; minimum sizes do not apply to rigid moves.
    fn mover(&self) -> ConstraintEngine {
        ConstraintEngine::new(self.transform, self.bounds, 0.0, 0.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::transform::surface_bounds;
    use proptest::prelude::*;

    proptest! {
        /// Property: image-local -> relative -> image-local is the identity.
        #[test]
        fn prop_relative_round_trip(
            scale in 0.2f32..=5.0,
            tx in -500.0f32..=500.0,
            ty in -500.0f32..=500.0,
            l in 0.0f32..=300.0,
            t in 0.0f32..=200.0,
            w in 1.0f32..=100.0,
            h in 1.0f32..=100.0,
        ) {
            let image = Size::new(400.0, 300.0);
            let transform = Transform::new(scale, tx, ty);
            let view = ViewContext {
                transform,
                bounds: surface_bounds(image, &transform),
                surface: Size::new(400.0, 400.0),
                image,
                scale_factor: 1.0,
            };
            let rect = Rect::new(l, t, l + w, t + h);
            let back = view.rect_from_relative(&view.rect_to_relative(&rect));
            prop_assert!((back.left - rect.left).abs() < 1e-2);
            prop_assert!((back.top - rect.top).abs() < 1e-2);
            prop_assert!((back.right - rect.right).abs() < 1e-2);
            prop_assert!((back.bottom - rect.bottom).abs() < 1e-2);
        }
    }
}
