//! Plain geometry value types shared by every engine component.
//!
//! # Coordinate Systems
//!
//! - **Surface space**: pixels of the visible viewport, after the view
//!   transform is applied. Touch input arrives in surface space.
//! - **Image-local space**: pixels of the untransformed source image. Shape
//!   geometry is stored in image-local space so it stays attached to the image
//!   while the user pans and zooms.
//!
//! Origin is the top-left corner in both systems, y grows downwards.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point shifted by `(dx, dy)`.
    #[inline]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared euclidean distance to `other`.
    ///
    /// Touch-target checks compare against squared thresholds, so the square
    /// root is never needed.
    #[inline]
    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }
}

/// Width and height of the surface or the intrinsic image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle stored as edges.
///
/// A well-formed rectangle has `left <= right` and `top <= bottom`, but the
/// type does not enforce it: a drag can transiently invert edges before the
/// minimum-size clamp pins them again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle of side `edge` centered on `center`.
    pub fn square_around(center: Point, edge: f32) -> Self {
        let half = edge / 2.0;
        Self::new(
            center.x - half,
            center.y - half,
            center.x + half,
            center.y + half,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        (self.left..=self.right).contains(&point.x) && (self.top..=self.bottom).contains(&point.y)
    }

    /// Rectangle shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Corners in the order left-top, right-top, left-bottom, right-bottom.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.left, self.bottom),
            Point::new(self.right, self.bottom),
        ]
    }

    /// Smallest rectangle containing every point, `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            rect.left = rect.left.min(p.x);
            rect.top = rect.top.min(p.y);
            rect.right = rect.right.max(p.x);
            rect.bottom = rect.bottom.max(p.y);
        }
        Some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_sq(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_size_validity() {
        assert!(Size::new(400.0, 300.0).is_valid());
        assert!(!Size::new(0.0, 300.0).is_valid());
        assert!(!Size::new(400.0, -1.0).is_valid());
        assert!(!Size::new(f32::NAN, 300.0).is_valid());
    }

    #[test]
    fn test_rect_square_around() {
        let rect = Rect::square_around(Point::new(200.0, 200.0), 200.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 300.0, 300.0));
        assert_eq!(rect.center(), Point::new(200.0, 200.0));
    }

    #[test]
    fn test_rect_contains_is_inclusive() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(rect.contains(Point::new(15.0, 15.0)));
        assert!(!rect.contains(Point::new(20.1, 15.0)));
    }

    #[test]
    fn test_rect_enclosing() {
        let points = [
            Point::new(5.0, 1.0),
            Point::new(-2.0, 4.0),
            Point::new(3.0, 9.0),
        ];
        assert_eq!(
            Rect::enclosing(&points),
            Some(Rect::new(-2.0, 1.0, 5.0, 9.0))
        );
        assert_eq!(Rect::enclosing(&[]), None);
    }
}
