//! JavaScript-facing data shapes and conversion helpers.
//!
//! Core value types already derive serde, so most of them cross the boundary
//! as-is through `serde_wasm_bindgen`. The types here only exist where the
//! core representation is a tuple, which would arrive in JavaScript as an
//! array.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use zoomcrop_core::{EngineError, Point, Rect, ShapeStatus};

/// A rectangle in relative coordinates, keyed by shape id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsRelativeRect {
    pub id: String,
    pub rect: Rect,
}

impl From<(String, Rect)> for JsRelativeRect {
    fn from((id, rect): (String, Rect)) -> Self {
        Self { id, rect }
    }
}

/// A polygon's vertices in relative coordinates, keyed by shape id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsRelativePolygon {
    pub id: String,
    pub points: Vec<Point>,
}

impl From<(String, Vec<Point>)> for JsRelativePolygon {
    fn from((id, points): (String, Vec<Point>)) -> Self {
        Self { id, points }
    }
}

/// Map the `active` flag used by the JS API to a shape status.
pub(crate) fn status_from_active(active: bool) -> ShapeStatus {
    if active {
        ShapeStatus::Active
    } else {
        ShapeStatus::Inactive
    }
}

/// Convert an engine error into the string error thrown in JavaScript.
pub(crate) fn to_js_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Deserialize a JS value, naming `what` in the error message.
pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_active() {
        assert_eq!(status_from_active(true), ShapeStatus::Active);
        assert_eq!(status_from_active(false), ShapeStatus::Inactive);
    }

    #[test]
    fn test_relative_rect_from_tuple() {
        let rect = Rect::new(0.1, 0.2, 0.3, 0.4);
        let js: JsRelativeRect = ("a".to_string(), rect).into();
        assert_eq!(js.id, "a");
        assert_eq!(js.rect, rect);
    }

    #[test]
    fn test_relative_polygon_from_tuple() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.5, 1.0)];
        let js: JsRelativePolygon = ("p".to_string(), points.clone()).into();
        assert_eq!(js.points, points);
    }
}
