//! View transform: the affine pan/zoom model of the image inside the surface.
//!
//! # Components
//!
//! - [`Transform`]: immutable scale + translation value
//! - [`TransformState`]: current/start transform with clamped zoom
//! - [`BoundsTracker`]: surface rectangle covered by the transformed image
//! - [`viewport`]: pan clamping, re-centering and auto-reset targets
//!
//! # Coordinate System
//!
//! - Translation is in surface pixels
//! - Scale is surface pixels per image pixel, uniform on both axes
//! - Scale bounds are relative to the first-layout (start) scale

mod bounds;
mod matrix;
mod state;
pub mod viewport;

pub use bounds::{surface_bounds, BoundsTracker};
pub use matrix::Transform;
pub use state::TransformState;
