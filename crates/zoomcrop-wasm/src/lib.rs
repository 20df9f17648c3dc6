//! Zoomcrop WASM - WebAssembly bindings for Zoomcrop
//!
//! This crate exposes the zoomcrop-core engine to JavaScript/TypeScript
//! hosts that draw an image and its crop shapes on a canvas.
//!
//! # Module Structure
//!
//! - `engine` - The `JsCropEngine` class: shapes, touch input, render list
//! - `types` - JS-facing data shapes and serde conversion helpers
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEngine } from '@zoomcrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const engine = new JsCropEngine(400, 400, image.width, image.height);
//! engine.add_polygon('crop-1', 0xff00ff00, 5, true);
//! const frame = engine.frame();
//! console.log(`${frame.shapes.length} shapes to draw`);
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod types;

// Re-export public types
pub use engine::JsCropEngine;
pub use types::{JsRelativePolygon, JsRelativeRect};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
