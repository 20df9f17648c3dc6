//! The immutable view transform.
//!
//! A uniform scale plus translation maps image-local coordinates to surface
//! coordinates:
//!
//! ```text
//! surface_x = image_x * scale + translate_x
//! surface_y = image_y * scale + translate_y
//! ```
//!
//! Storing one `scale` instead of separate x/y factors keeps zoom uniform by
//! construction.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Scale-and-translate affine transform from image-local to surface space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Uniform scale factor (image pixel → surface pixels).
    pub scale: f32,
    /// Horizontal translation in surface pixels.
    pub translate_x: f32,
    /// Vertical translation in surface pixels.
    pub translate_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Transform that fits `image` inside `surface`, preserving aspect ratio
    /// and centering the leftover space.
    ///
    /// This is the first-layout transform an image view uses before the user
    /// touches anything.
    pub fn fit_center(image: Size, surface: Size) -> Self {
        let scale = (surface.width / image.width).min(surface.height / image.height);
        let translate_x = (surface.width - image.width * scale) / 2.0;
        let translate_y = (surface.height - image.height * scale) / 2.0;
        Self::new(scale, translate_x, translate_y)
    }

    /// Horizontal scale (equal to [`Transform::scale_y`]).
    #[inline]
    pub fn scale_x(&self) -> f32 {
        self.scale
    }

    /// Vertical scale (equal to [`Transform::scale_x`]).
    #[inline]
    pub fn scale_y(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn map_x(&self, x: f32) -> f32 {
        x * self.scale + self.translate_x
    }

    #[inline]
    pub fn map_y(&self, y: f32) -> f32 {
        y * self.scale + self.translate_y
    }

    /// Image-local point to surface space.
    #[inline]
    pub fn map_point(&self, point: Point) -> Point {
        Point::new(self.map_x(point.x), self.map_y(point.y))
    }

    /// Image-local rectangle to surface space.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        Rect::new(
            self.map_x(rect.left),
            self.map_y(rect.top),
            self.map_x(rect.right),
            self.map_y(rect.bottom),
        )
    }

    #[inline]
    pub fn invert_x(&self, x: f32) -> f32 {
        (x - self.translate_x) / self.scale
    }

    #[inline]
    pub fn invert_y(&self, y: f32) -> f32 {
        (y - self.translate_y) / self.scale
    }

    /// Surface point back to image-local space.
    #[inline]
    pub fn invert_point(&self, point: Point) -> Point {
        Point::new(self.invert_x(point.x), self.invert_y(point.y))
    }

    /// Surface-space length to image-local length.
    #[inline]
    pub fn invert_length(&self, length: f32) -> f32 {
        length / self.scale
    }

    /// Translate in surface space.
    pub fn post_translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.scale, self.translate_x + dx, self.translate_y + dy)
    }

    /// Scale by `factor` about the surface point `focus`.
    ///
    /// The image point under `focus` stays under `focus`.
    pub fn post_scale(&self, factor: f32, focus: Point) -> Self {
        Self::new(
            self.scale * factor,
            focus.x + (self.translate_x - focus.x) * factor,
            focus.y + (self.translate_y - focus.y) * factor,
        )
    }

    /// Same scale, new translation.
    pub fn with_translation(&self, translate_x: f32, translate_y: f32) -> Self {
        Self::new(self.scale, translate_x, translate_y)
    }
}
