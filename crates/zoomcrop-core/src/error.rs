//! Error types for engine operations.

use thiserror::Error;

use crate::shape::ShapeKind;

/// Errors surfaced synchronously by engine and registry operations.
///
/// Every failing operation leaves the engine state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A shape with this id already exists in the mapping for `kind`.
    #[error("{kind} with id {id:?} already exists")]
    DuplicateId { kind: ShapeKind, id: String },

    /// No rectangle or polygon is registered under this id.
    #[error("No crop shape with id {0:?}")]
    NotFound(String),

    /// Scale bounds are non-positive or not strictly increasing.
    #[error("Invalid scale range: min {min} must be > 0 and < max {max}")]
    InvalidScaleRange { min: f32, max: f32 },

    /// A polygon needs at least three vertices.
    #[error("Polygon needs at least 3 vertices, got {vertices}")]
    InvalidPolygon { vertices: usize },

    /// Surface or image dimensions are not strictly positive.
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
}
