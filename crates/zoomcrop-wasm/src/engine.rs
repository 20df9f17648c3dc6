//! Crop engine WASM bindings.
//!
//! `JsCropEngine` wraps the core [`CropEngine`] for a browser canvas host.
//! Every method takes `&self` and borrows the engine internally, so a click
//! listener may call back into the same instance: listeners are only invoked
//! once the engine borrow has been released.

use std::cell::RefCell;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use zoomcrop_core::{
    AutoResetMode, Color, CropEngine, CropListener, EngineConfig, EngineEvent, Point, Rect,
    ShapeData, Size, TouchEvent, Transform,
};

use crate::types::{
    from_js, status_from_active, to_js, to_js_error, JsRelativePolygon, JsRelativeRect,
};

/// Listener functions registered from JavaScript.
#[derive(Debug, Clone, Default)]
struct JsListeners {
    rectangle_click: Option<Function>,
    polygon_click: Option<Function>,
    animate: Option<Function>,
    redraw: Option<Function>,
}

impl JsListeners {
    fn call(function: &Option<Function>, arg: Result<JsValue, JsValue>) {
        let Some(function) = function else {
            return;
        };
        let result = arg.and_then(|arg| function.call1(&JsValue::NULL, &arg));
        if let Err(err) = result {
            web_sys::console::warn_1(&err);
        }
    }
}

impl CropListener for JsListeners {
    fn on_rectangle_click(&mut self, shape: &ShapeData) {
        Self::call(&self.rectangle_click, to_js(shape));
    }

    fn on_polygon_click(&mut self, shape: &ShapeData) {
        Self::call(&self.polygon_click, to_js(shape));
    }

    fn on_animate(&mut self, from: &Transform, to: &Transform) {
        Self::call(&self.animate, to_js(&[from, to]));
    }

    fn on_redraw(&mut self) {
        Self::call(&self.redraw, Ok(JsValue::UNDEFINED));
    }
}

/// Zoomable image surface with editable crop shapes.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const engine = new JsCropEngine(canvas.width, canvas.height, img.width, img.height);
/// engine.set_on_rectangle_click((shape) => console.log(`clicked ${shape.id}`));
/// engine.set_on_redraw(() => requestAnimationFrame(() => paint(engine.frame())));
///
/// engine.add_rect('crop-1', 0xffff0000);
/// canvas.addEventListener('pointerdown', (e) => engine.on_touch_event({
///   action: 'down',
///   pointers: [{ x: e.offsetX, y: e.offsetY }],
///   time_ms: Math.round(e.timeStamp),
/// }));
/// setInterval(() => engine.tick(performance.now()), 50);
/// ```
#[wasm_bindgen]
pub struct JsCropEngine {
    inner: RefCell<CropEngine>,
    listeners: RefCell<JsListeners>,
}

impl JsCropEngine {
    fn from_engine(engine: CropEngine) -> Self {
        Self {
            inner: RefCell::new(engine),
            listeners: RefCell::new(JsListeners::default()),
        }
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut CropEngine) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    fn notify(&self, events: &[EngineEvent]) {
        if events.is_empty() {
            return;
        }
        let mut listeners = self.listeners.borrow().clone();
        for event in events {
            event.dispatch(&mut listeners);
        }
    }

    /// Hand events to the registered listeners and return them to the caller.
    fn deliver(&self, events: Vec<EngineEvent>) -> Result<JsValue, JsValue> {
        self.notify(&events);
        to_js(&events)
    }

    /// Apply one change to the current configuration.
    fn update_config(&self, change: impl FnOnce(&mut EngineConfig)) -> Result<(), JsValue> {
        let events = self
            .with_engine(|engine| {
                let mut config = *engine.config();
                change(&mut config);
                engine.set_config(config)
            })
            .map_err(to_js_error)?;
        self.notify(&events);
        Ok(())
    }
}

#[wasm_bindgen]
impl JsCropEngine {
    /// Create an engine with the default configuration and the image
    /// fit-centered in the surface.
    ///
    /// # Arguments
    /// * `surface_width`, `surface_height` - Canvas size in pixels
    /// * `image_width`, `image_height` - Intrinsic image size in pixels
    ///
    /// # Errors
    /// Throws for non-positive dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(
        surface_width: f32,
        surface_height: f32,
        image_width: f32,
        image_height: f32,
    ) -> Result<JsCropEngine, JsValue> {
        let engine = CropEngine::new(
            EngineConfig::default(),
            Size::new(surface_width, surface_height),
            Size::new(image_width, image_height),
        )
        .map_err(to_js_error)?;
        Ok(Self::from_engine(engine))
    }

    /// Create an engine from a (partial) configuration object.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Throws for an invalid configuration or non-positive dimensions.
    pub fn with_config(
        config: JsValue,
        surface_width: f32,
        surface_height: f32,
        image_width: f32,
        image_height: f32,
    ) -> Result<JsCropEngine, JsValue> {
        let config: EngineConfig = from_js(config, "engine config")?;
        let engine = CropEngine::new(
            config,
            Size::new(surface_width, surface_height),
            Size::new(image_width, image_height),
        )
        .map_err(to_js_error)?;
        Ok(Self::from_engine(engine))
    }

    /// Create an engine whose first layout is an explicit transform
    /// (`{ scale, translate_x, translate_y }`).
    ///
    /// # Errors
    /// Throws for an invalid configuration, transform or dimensions.
    pub fn with_start_transform(
        config: JsValue,
        surface_width: f32,
        surface_height: f32,
        image_width: f32,
        image_height: f32,
        start: JsValue,
    ) -> Result<JsCropEngine, JsValue> {
        let config: EngineConfig = from_js(config, "engine config")?;
        let start: Transform = from_js(start, "transform")?;
        let engine = CropEngine::with_start_transform(
            config,
            Size::new(surface_width, surface_height),
            Size::new(image_width, image_height),
            start,
        )
        .map_err(to_js_error)?;
        Ok(Self::from_engine(engine))
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Called with the shape data of a tapped rectangle.
    pub fn set_on_rectangle_click(&self, listener: Option<Function>) {
        self.listeners.borrow_mut().rectangle_click = listener;
    }

    /// Called with the shape data of a tapped polygon.
    pub fn set_on_polygon_click(&self, listener: Option<Function>) {
        self.listeners.borrow_mut().polygon_click = listener;
    }

    /// Called with `[from, to]` transforms when the view jumps.
    pub fn set_on_animate(&self, listener: Option<Function>) {
        self.listeners.borrow_mut().animate = listener;
    }

    /// Called when the surface needs repainting.
    pub fn set_on_redraw(&self, listener: Option<Function>) {
        self.listeners.borrow_mut().redraw = listener;
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Feed one touch event (`{ action, pointers: [{x, y}], time_ms }`).
    ///
    /// Returns the produced events after dispatching them to listeners.
    pub fn on_touch_event(&self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: TouchEvent = from_js(event, "touch event")?;
        let events = self.with_engine(|engine| engine.on_touch_event(&event));
        self.deliver(events)
    }

    /// Advance host time so pending single taps get confirmed.
    pub fn tick(&self, now_ms: f64) -> Result<JsValue, JsValue> {
        let now_ms = now_ms.max(0.0) as u64;
        let events = self.with_engine(|engine| engine.tick(now_ms));
        self.deliver(events)
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn current_scale(&self) -> f32 {
        self.with_engine(|engine| engine.current_scale())
    }

    pub fn scale_factor(&self) -> f32 {
        self.with_engine(|engine| engine.scale_factor())
    }

    /// Current transform as `{ scale, translate_x, translate_y }`.
    pub fn transform(&self) -> Result<JsValue, JsValue> {
        to_js(&self.with_engine(|engine| engine.transform()))
    }

    /// Surface bounds of the image as `{ left, top, right, bottom }`.
    pub fn bounds(&self) -> Result<JsValue, JsValue> {
        to_js(&self.with_engine(|engine| engine.bounds()))
    }

    /// Return to the starting transform.
    pub fn reset(&self) -> Result<JsValue, JsValue> {
        let events = self.with_engine(|engine| engine.reset());
        self.deliver(events)
    }

    /// Replace the relative zoom range. A view outside the new range is
    /// pulled back into it; the returned events describe that jump.
    ///
    /// # Errors
    /// Throws for a non-positive or inverted range.
    pub fn set_scale_range(&self, min: f32, max: f32) -> Result<JsValue, JsValue> {
        let events = self
            .with_engine(|engine| engine.set_scale_range(min, max))
            .map_err(to_js_error)?;
        self.deliver(events)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current configuration object.
    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_js(&self.with_engine(|engine| *engine.config()))
    }

    /// Replace the whole configuration. Missing fields take their default
    /// values, not the current ones.
    ///
    /// # Errors
    /// Throws for an invalid configuration; the previous one is kept.
    pub fn set_config(&self, config: JsValue) -> Result<JsValue, JsValue> {
        let config: EngineConfig = from_js(config, "engine config")?;
        let events = self
            .with_engine(|engine| engine.set_config(config))
            .map_err(to_js_error)?;
        self.deliver(events)
    }

    pub fn set_zoomable(&self, zoomable: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.zoomable = zoomable)
    }

    pub fn set_translatable(&self, translatable: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.translatable = translatable)
    }

    pub fn set_restrict_bounds(&self, restrict: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.restrict_bounds = restrict)
    }

    pub fn set_animate_on_reset(&self, animate: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.animate_on_reset = animate)
    }

    pub fn set_auto_center(&self, auto_center: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.auto_center = auto_center)
    }

    /// `"under"`, `"over"`, `"always"` or `"never"`.
    pub fn set_auto_reset_mode(&self, mode: JsValue) -> Result<(), JsValue> {
        let mode: AutoResetMode = from_js(mode, "auto reset mode")?;
        self.update_config(|config| config.auto_reset_mode = mode)
    }

    pub fn set_double_tap_to_zoom(&self, enabled: bool) -> Result<(), JsValue> {
        self.update_config(|config| config.double_tap_to_zoom = enabled)
    }

    /// Clamped into the current scale range.
    pub fn set_double_tap_zoom_factor(&self, factor: f32) -> Result<(), JsValue> {
        self.update_config(|config| config.double_tap_zoom_factor = factor)
    }

    /// Render list for the current state.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        to_js(&self.with_engine(|engine| engine.frame()))
    }

    /// Whether anything changed since the last call.
    pub fn take_redraw_request(&self) -> bool {
        self.with_engine(|engine| engine.take_redraw_request())
    }

    // ========================================================================
    // Shapes
    // ========================================================================

    /// Add a rectangle centered on the visible image and focus it.
    ///
    /// # Arguments
    /// * `id` - Unique among rectangles
    /// * `color` - Packed ARGB (`0xAARRGGBB`)
    pub fn add_rect(&self, id: &str, color: u32) -> Result<(), JsValue> {
        self.with_engine(|engine| engine.add_rect(id, Color(color)))
            .map_err(to_js_error)
    }

    /// Add a regular polygon with `sides` vertices and focus it.
    pub fn add_polygon(
        &self,
        id: &str,
        color: u32,
        sides: u32,
        active: bool,
    ) -> Result<(), JsValue> {
        let status = status_from_active(active);
        self.with_engine(|engine| engine.add_polygon(id, Color(color), sides as usize, status))
            .map_err(to_js_error)
    }

    /// Add a rectangle from relative coordinates (`{ left, top, right, bottom }`).
    pub fn add_rect_relative(&self, id: &str, color: u32, rect: JsValue) -> Result<(), JsValue> {
        let rect: Rect = from_js(rect, "rect")?;
        self.with_engine(|engine| engine.add_rect_relative(id, Color(color), &rect))
            .map_err(to_js_error)
    }

    /// Add a polygon from relative vertices (`[{ x, y }, ...]`).
    pub fn add_polygon_relative(
        &self,
        id: &str,
        color: u32,
        points: JsValue,
        active: bool,
    ) -> Result<(), JsValue> {
        let points: Vec<Point> = from_js(points, "polygon points")?;
        let status = status_from_active(active);
        self.with_engine(|engine| {
            engine.add_polygon_relative(id, Color(color), &points, status)
        })
        .map_err(to_js_error)
    }

    /// Remove a shape; returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.with_engine(|engine| engine.remove(id))
    }

    /// Flip the lock flag and return the new value.
    pub fn toggle_lock(&self, id: &str) -> Result<bool, JsValue> {
        self.with_engine(|engine| engine.toggle_lock(id))
            .map_err(to_js_error)
    }

    pub fn set_color(&self, id: &str, color: u32) -> Result<(), JsValue> {
        self.with_engine(|engine| engine.set_color(id, Color(color)))
            .map_err(to_js_error)
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<(), JsValue> {
        self.with_engine(|engine| engine.set_status(id, status_from_active(active)))
            .map_err(to_js_error)
    }

    pub fn focused_id(&self) -> Option<String> {
        self.with_engine(|engine| engine.focused_id().map(str::to_string))
    }

    pub fn rect_ids(&self) -> Vec<String> {
        self.with_engine(|engine| engine.rect_ids())
    }

    pub fn polygon_ids(&self) -> Vec<String> {
        self.with_engine(|engine| engine.polygon_ids())
    }

    /// Shape data for `id`, or `undefined`.
    pub fn shape(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.with_engine(|engine| engine.shape(id)) {
            Some(shape) => to_js(&shape),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Geometry of a shape in relative coordinates.
    pub fn relative_geometry(&self, id: &str) -> Result<JsValue, JsValue> {
        let geometry = self
            .with_engine(|engine| engine.relative_geometry(id))
            .map_err(to_js_error)?;
        to_js(&geometry)
    }

    /// Every rectangle as `{ id, rect }` in relative coordinates.
    pub fn relative_rects(&self) -> Result<JsValue, JsValue> {
        let rects: Vec<JsRelativeRect> = self
            .with_engine(|engine| engine.relative_rects())
            .into_iter()
            .map(JsRelativeRect::from)
            .collect();
        to_js(&rects)
    }

    /// Every polygon as `{ id, points }` in relative coordinates.
    pub fn relative_polygons(&self) -> Result<JsValue, JsValue> {
        let polygons: Vec<JsRelativePolygon> = self
            .with_engine(|engine| engine.relative_polygons())
            .into_iter()
            .map(JsRelativePolygon::from)
            .collect();
        to_js(&polygons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoomcrop_core::ShapeStatus;

    fn engine() -> JsCropEngine {
        JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap()
    }

    #[test]
    fn test_add_and_lock() {
        let engine = engine();
        engine.add_rect("a", 0xFFFF_0000).unwrap();
        assert_eq!(engine.rect_ids(), vec!["a".to_string()]);
        assert_eq!(engine.focused_id(), Some("a".to_string()));
        assert_eq!(engine.toggle_lock("a").ok(), Some(true));
        assert_eq!(engine.toggle_lock("a").ok(), Some(false));
    }

    #[test]
    fn test_polygon_status() {
        let engine = engine();
        let status = |engine: &JsCropEngine| {
            engine.with_engine(|inner| inner.shape("p").unwrap().status)
        };
        engine.add_polygon("p", 0xFF00_00FF, 6, false).unwrap();
        assert_eq!(status(&engine), ShapeStatus::Inactive);
        engine.set_active("p", true).unwrap();
        assert_eq!(status(&engine), ShapeStatus::Active);
    }

    #[test]
    fn test_remove_and_redraw_request() {
        let engine = engine();
        assert!(!engine.take_redraw_request());
        engine.add_rect("a", 0).unwrap();
        assert!(engine.take_redraw_request());
        assert!(engine.remove("a"));
        assert!(!engine.remove("a"));
        assert!(engine.take_redraw_request());
        assert!(engine.rect_ids().is_empty());
    }

    #[test]
    fn test_scale_queries() {
        let engine = JsCropEngine::new(400.0, 400.0, 800.0, 800.0).unwrap();
        assert_eq!(engine.current_scale(), 0.5);
        assert_eq!(engine.scale_factor(), 1.0);
    }

    #[test]
    fn test_config_setters() {
        let engine = engine();
        let config = |engine: &JsCropEngine| engine.with_engine(|inner| *inner.config());

        engine.set_zoomable(false).unwrap();
        engine.set_translatable(false).unwrap();
        engine.set_restrict_bounds(true).unwrap();
        engine.set_auto_center(false).unwrap();
        let current = config(&engine);
        assert!(!current.zoomable);
        assert!(!current.translatable);
        assert!(current.restrict_bounds);
        assert!(!current.auto_center);

        engine.set_double_tap_zoom_factor(20.0).unwrap();
        assert_eq!(config(&engine).double_tap_zoom_factor, 8.0);
        engine.set_double_tap_to_zoom(false).unwrap();
        assert!(!config(&engine).double_tap_to_zoom);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;
    use zoomcrop_core::TouchAction;

    wasm_bindgen_test_configure!(run_in_browser);

    fn touch(action: TouchAction, x: f32, y: f32, time_ms: u64) -> JsValue {
        to_js(&TouchEvent::single(action, Point::new(x, y), time_ms)).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_invalid_dimensions_throw() {
        let err = JsCropEngine::new(0.0, 400.0, 400.0, 400.0).err().unwrap();
        assert!(err.as_string().unwrap().contains("Invalid dimensions"));
    }

    #[wasm_bindgen_test]
    fn test_partial_config() {
        let config = js_sys::JSON::parse(r#"{"zoomable":false}"#).unwrap();
        let engine = JsCropEngine::with_config(config, 400.0, 400.0, 400.0, 400.0).unwrap();
        assert!(!engine.with_engine(|inner| inner.config().zoomable));
        assert!(engine.with_engine(|inner| inner.config().translatable));
    }

    #[wasm_bindgen_test]
    fn test_narrowed_scale_range_returns_settle_events() {
        let engine = JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap();
        let pinch = |action, half_span: f32, time_ms| {
            let points = vec![
                Point::new(200.0 - half_span, 200.0),
                Point::new(200.0 + half_span, 200.0),
            ];
            to_js(&TouchEvent::new(action, points, time_ms)).unwrap()
        };
        engine.on_touch_event(pinch(TouchAction::Down, 25.0, 0)).unwrap();
        engine.on_touch_event(pinch(TouchAction::Move, 100.0, 16)).unwrap();
        assert!((engine.scale_factor() - 4.0).abs() < 1e-4);

        let events: Vec<EngineEvent> =
            from_js(engine.set_scale_range(0.5, 2.0).unwrap(), "events").unwrap();
        assert!(matches!(events[0], EngineEvent::AnimateTransform { .. }));
        assert!((engine.scale_factor() - 2.0).abs() < 1e-4);
    }

    #[wasm_bindgen_test]
    fn test_set_config_and_auto_reset_mode() {
        let engine = JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap();
        engine.set_auto_reset_mode(JsValue::from_str("never")).unwrap();
        let config: EngineConfig = from_js(engine.config().unwrap(), "config").unwrap();
        assert_eq!(config.auto_reset_mode, AutoResetMode::Never);
        assert!(engine.set_auto_reset_mode(JsValue::from_str("sometimes")).is_err());

        let partial = js_sys::JSON::parse(r#"{"min_scale":1.0,"max_scale":0.5}"#).unwrap();
        assert!(engine.set_config(partial).is_err());
        let partial = js_sys::JSON::parse(r#"{"translatable":false}"#).unwrap();
        engine.set_config(partial).unwrap();
        let config: EngineConfig = from_js(engine.config().unwrap(), "config").unwrap();
        assert!(!config.translatable);
        assert_eq!(config.auto_reset_mode, AutoResetMode::Under);
    }

    #[wasm_bindgen_test]
    fn test_duplicate_id_throws() {
        let engine = JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap();
        engine.add_rect("a", 0).unwrap();
        let err = engine.add_rect("a", 0).unwrap_err();
        assert!(err.as_string().unwrap().contains("already exists"));
    }

    #[wasm_bindgen_test]
    fn test_drag_returns_redraw_event() {
        let engine = JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap();
        engine.add_rect("a", 0).unwrap();
        engine.on_touch_event(touch(TouchAction::Down, 300.0, 300.0, 0)).unwrap();
        let events = engine
            .on_touch_event(touch(TouchAction::Move, 350.0, 350.0, 16))
            .unwrap();
        let events: Vec<EngineEvent> = from_js(events, "events").unwrap();
        assert_eq!(events, vec![EngineEvent::RedrawRequested]);

        let rects: Vec<JsRelativeRect> =
            from_js(engine.relative_rects().unwrap(), "rects").unwrap();
        assert!((rects[0].rect.right - 0.875).abs() < 1e-5);
    }

    #[wasm_bindgen_test]
    fn test_click_listener_may_reenter() {
        let engine = std::rc::Rc::new(JsCropEngine::new(400.0, 400.0, 400.0, 400.0).unwrap());
        engine.add_rect("a", 0).unwrap();

        let clicked = std::rc::Rc::new(RefCell::new(Vec::<String>::new()));
        let (inner, seen) = (engine.clone(), clicked.clone());
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |shape: JsValue| {
            let shape: ShapeData = from_js(shape, "shape").unwrap();
            seen.borrow_mut().push(shape.id.clone());
            // Re-entrant mutation from inside the listener.
            inner.remove(&shape.id);
        });
        engine.set_on_rectangle_click(Some(listener.as_ref().unchecked_ref::<Function>().clone()));

        engine.on_touch_event(touch(TouchAction::Down, 200.0, 200.0, 0)).unwrap();
        engine.on_touch_event(touch(TouchAction::Up, 200.0, 200.0, 50)).unwrap();
        engine.tick(1000.0).unwrap();

        assert_eq!(*clicked.borrow(), vec!["a".to_string()]);
        assert!(engine.rect_ids().is_empty());
        drop(listener);
    }
}
