//! Mutable pan/zoom state built on top of the immutable [`Transform`].

use tracing::trace;

use crate::config::check_scale_range;
use crate::error::EngineError;
use crate::geometry::Point;

use super::matrix::Transform;

/// Relative tolerance used when comparing a scale against the start scale.
const SCALE_EPSILON: f32 = 1e-5;

/// Current and starting view transform plus absolute scale bounds.
///
/// The absolute bounds are `relative_min * start.scale` and
/// `relative_max * start.scale`, so they follow the image's natural starting
/// size rather than screen units.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    current: Transform,
    start: Transform,
    min_scale: f32,
    max_scale: f32,
}

impl TransformState {
    /// Create the state from the first-layout transform.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidScaleRange`] for a non-positive or inverted range.
    pub fn new(
        start: Transform,
        relative_min: f32,
        relative_max: f32,
    ) -> Result<Self, EngineError> {
        check_scale_range(relative_min, relative_max)?;
        Ok(Self {
            current: start,
            start,
            min_scale: relative_min * start.scale,
            max_scale: relative_max * start.scale,
        })
    }

    pub fn current(&self) -> Transform {
        self.current
    }

    pub fn start(&self) -> Transform {
        self.start
    }

    /// Absolute scale of the current transform.
    pub fn current_scale(&self) -> f32 {
        self.current.scale
    }

    /// Current scale relative to the starting scale (1.0 = not zoomed).
    pub fn scale_factor(&self) -> f32 {
        self.current.scale / self.start.scale
    }

    /// Absolute minimum scale.
    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    /// Absolute maximum scale.
    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    /// Whether the current scale equals the starting scale.
    pub fn is_at_start_scale(&self) -> bool {
        (self.current.scale - self.start.scale).abs() <= self.start.scale * SCALE_EPSILON
    }

    /// Translate the image by a surface-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.current = self.current.post_translate(dx, dy);
    }

    /// Zoom by `factor` about the surface point `focus`.
    ///
    /// The resulting absolute scale is clamped to `[min_scale, max_scale]`;
    /// the factor actually applied is returned.
    pub fn zoom_by(&mut self, factor: f32, focus: Point) -> f32 {
        if !factor.is_finite() || factor <= 0.0 {
            return 1.0;
        }
        let projected = self.current.scale * factor;
        let clamped = projected.clamp(self.min_scale, self.max_scale);
        let applied = clamped / self.current.scale;
        if applied != factor {
            trace!(factor, applied, scale = clamped, "zoom clamped to scale bounds");
        }
        self.current = self.current.post_scale(applied, focus);
        applied
    }

    /// Restore the starting transform. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.current != self.start;
        self.current = self.start;
        changed
    }

    /// Replace the current transform with a computed target.
    pub fn set(&mut self, transform: Transform) {
        self.current = transform;
    }

    /// Replace the relative scale range and recompute the absolute bounds.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidScaleRange`]; the previous range is kept.
    pub fn set_scale_range(
        &mut self,
        relative_min: f32,
        relative_max: f32,
    ) -> Result<(), EngineError> {
        check_scale_range(relative_min, relative_max)?;
        self.min_scale = relative_min * self.start.scale;
        self.max_scale = relative_max * self.start.scale;
        Ok(())
    }

    /// Scale the current transform about `focus` until it is back inside
    /// `[min_scale, max_scale]`. Returns whether anything changed.
    pub fn clamp_scale(&mut self, focus: Point) -> bool {
        let scale = self.current.scale;
        let clamped = scale.clamp(self.min_scale, self.max_scale);
        if clamped == scale {
            return false;
        }
        trace!(scale, clamped, "current scale pulled into new bounds");
        self.current = self.current.post_scale(clamped / scale, focus);
        true
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any sequence of zooms stays within the absolute bounds.
        #[test]
        fn prop_zoom_sequence_stays_in_bounds(
            start_scale in 0.1f32..=4.0,
            factors in proptest::collection::vec(0.05f32..=20.0, 1..40),
            focus in (-500.0f32..=500.0, -500.0f32..=500.0),
        ) {
            let start = Transform::new(start_scale, 0.0, 0.0);
            let mut s = TransformState::new(start, 0.6, 8.0).unwrap();
            for factor in factors {
                s.zoom_by(factor, Point::new(focus.0, focus.1));
                let scale = s.current_scale();
                prop_assert!(scale >= s.min_scale() * (1.0 - 1e-4));
                prop_assert!(scale <= s.max_scale() * (1.0 + 1e-4));
            }
        }
    }
}
