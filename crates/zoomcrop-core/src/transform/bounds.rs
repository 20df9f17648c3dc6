//! On-surface rectangle occupied by the transformed image.

use std::cell::Cell;

use crate::geometry::{Rect, Size};

use super::matrix::Transform;

/// Derives the surface bounds of the image from a transform.
///
/// The cached rectangle is keyed by the transform it was computed from, so a
/// read after any transform change recomputes instead of returning stale
/// bounds.
#[derive(Debug, Clone)]
pub struct BoundsTracker {
    image: Size,
    cache: Cell<Option<(Transform, Rect)>>,
}

impl BoundsTracker {
    pub fn new(image: Size) -> Self {
        Self {
            image,
            cache: Cell::new(None),
        }
    }

    /// Intrinsic image size.
    pub fn image_size(&self) -> Size {
        self.image
    }

    /// Surface-space bounds of the image under `transform`.
    pub fn bounds(&self, transform: &Transform) -> Rect {
        if let Some((cached_for, rect)) = self.cache.get() {
            if cached_for == *transform {
                return rect;
            }
        }
        let rect = surface_bounds(self.image, transform);
        self.cache.set(Some((*transform, rect)));
        rect
    }

    /// Image size as displayed under `transform`.
    pub fn displayed_size(&self, transform: &Transform) -> Size {
        Size::new(
            self.image.width * transform.scale,
            self.image.height * transform.scale,
        )
    }
}

/// Surface-space rectangle covered by an image of `image` size.
pub fn surface_bounds(image: Size, transform: &Transform) -> Rect {
    Rect::new(
        transform.translate_x,
        transform.translate_y,
        image.width * transform.scale + transform.translate_x,
        image.height * transform.scale + transform.translate_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_follow_transform() {
        let tracker = BoundsTracker::new(Size::new(400.0, 200.0));
        let t = Transform::new(2.0, 10.0, 20.0);
        assert_eq!(tracker.bounds(&t), Rect::new(10.0, 20.0, 810.0, 420.0));
        assert_eq!(tracker.displayed_size(&t), Size::new(800.0, 400.0));
    }

    #[test]
    fn test_cache_never_stale() {
        let tracker = BoundsTracker::new(Size::new(100.0, 100.0));
        let first = Transform::identity();
        assert_eq!(tracker.bounds(&first), Rect::new(0.0, 0.0, 100.0, 100.0));

        let moved = first.post_translate(5.0, 5.0);
        assert_eq!(tracker.bounds(&moved), Rect::new(5.0, 5.0, 105.0, 105.0));
        assert_eq!(tracker.bounds(&first), Rect::new(0.0, 0.0, 100.0, 100.0));
    }
}
