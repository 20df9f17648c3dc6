//! Zoomcrop Core - interaction and geometry engine
//!
//! This crate provides the engine behind a zoomable, pannable image surface
//! overlaid with editable crop rectangles and polygons: the view transform,
//! multi-touch gesture handling, hit-testing, move/resize constraints and
//! the shape registry. It draws nothing; hosts paint the [`Frame`] it builds.

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod shape;
pub mod transform;

pub use config::{AutoResetMode, EngineConfig, GestureTimings};
pub use engine::{CropEngine, CropListener, DrawShape, EngineEvent, Frame};
pub use error::EngineError;
pub use geometry::{Point, Rect, Size};
pub use gesture::{TouchAction, TouchEvent};
pub use shape::{
    Color, Geometry, Polygon, Shape, ShapeData, ShapeKind, ShapeRegistry, ShapeStatus,
};
pub use transform::{Transform, TransformState};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pinch(x: f32, half_span: f32) -> Vec<Point> {
        vec![Point::new(x - half_span, 200.0), Point::new(x + half_span, 200.0)]
    }

    proptest! {
        /// Property: a pinch gesture of any shape keeps the scale factor
        /// inside the configured range.
        #[test]
        fn prop_pinch_sequence_respects_scale_range(
            spans in proptest::collection::vec((1.0f32..=400.0, 0.0f32..=400.0), 1..30),
        ) {
            let config = EngineConfig {
                auto_reset_mode: AutoResetMode::Never,
                ..EngineConfig::default()
            };
            let size = Size::new(400.0, 400.0);
            let mut engine = CropEngine::new(config, size, size).unwrap();

            engine.on_touch_event(&TouchEvent::new(TouchAction::Down, pinch(200.0, 50.0), 0));
            for (i, (half_span, x)) in spans.into_iter().enumerate() {
                let event = TouchEvent::new(TouchAction::Move, pinch(x, half_span), i as u64 + 1);
                engine.on_touch_event(&event);
                let factor = engine.scale_factor();
                prop_assert!(factor >= config.min_scale * (1.0 - 1e-4));
                prop_assert!(factor <= config.max_scale * (1.0 + 1e-4));
            }
        }
    }
}
