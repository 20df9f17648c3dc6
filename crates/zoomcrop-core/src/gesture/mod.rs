//! Multi-touch gesture handling.
//!
//! Two cooperating trackers are combined per event:
//!
//! - **Pointer tracker** ([`TouchSession`]): pans and pinch-zooms the view, or
//!   drags the shape region found by the session's hit-test
//! - **Tap tracker** ([`TapTracker`]): single and double taps
//!
//! The machine mutates the view and shapes it is handed through a [`Scene`]
//! and reports what happened as [`GestureOutcome`]s. Taps are reported, not
//! handled: the caller decides what a tap selects.

pub mod event;
pub mod session;
pub mod tap;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::geometry::{Point, Size};
use crate::shape::{ConstraintEngine, HitTester, Region, ShapeRegistry};
use crate::transform::{viewport, BoundsTracker, Transform, TransformState};

pub use event::{TouchAction, TouchEvent};
pub use session::{Target, TouchSession};
pub use tap::{TapOutcome, TapTracker};

/// Mutable view of the engine state a gesture may change.
pub struct Scene<'a> {
    pub config: &'a EngineConfig,
    pub transform: &'a mut TransformState,
    pub bounds: &'a BoundsTracker,
    pub registry: &'a mut ShapeRegistry,
    pub surface: Size,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The view or a shape changed in place.
    Changed,
    /// A single tap was confirmed at this surface point.
    Tap(Point),
    /// The view should move to `to`; the caller applies it.
    Settle { from: Transform, to: Transform },
}

/// Pointer and tap trackers sharing one gesture session.
#[derive(Debug, Clone, Default)]
pub struct GestureStateMachine {
    session: TouchSession,
    taps: TapTracker,
}

impl GestureStateMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            session: TouchSession::new(),
            taps: TapTracker::new(config.gestures),
        }
    }

    pub fn session(&self) -> &TouchSession {
        &self.session
    }

    /// Whether a tap is waiting for [`GestureStateMachine::tick`].
    pub fn has_pending_tap(&self) -> bool {
        self.taps.is_single_tap_pending()
    }

    /// Feed one touch event.
    pub fn handle(&mut self, event: &TouchEvent, scene: &mut Scene<'_>) -> Vec<GestureOutcome> {
        let mut out = Vec::new();
        let count = event.pointer_count();

        let Some(focal) = event.focal_point() else {
            if event.ends_gesture() {
                self.taps.cancel();
                self.session.end();
                self.settle(scene, &mut out);
            }
            return out;
        };

        match event.action {
            TouchAction::Down => {
                if count == 1 {
                    let confirmed = self.taps.on_down(focal, event.time_ms);
                    if let Some(TapOutcome::SingleTap(at)) = confirmed {
                        out.push(GestureOutcome::Tap(at));
                    }
                } else {
                    self.taps.cancel();
                }
                self.session.begin(focal, count, event.span());
            }
            TouchAction::Move => {
                if count > 1 {
                    self.taps.cancel();
                } else {
                    self.taps.on_move(focal);
                }
                if self.taps.is_double_tap_pending() {
                    return out;
                }
                if self.session.needs_reanchor(count) {
                    trace!(count, "re-anchoring gesture");
                    self.session.begin(focal, count, event.span());
                    return out;
                }
                self.track(event, focal, scene, &mut out);
            }
            TouchAction::Up if count > 1 => {
                self.taps.cancel();
                self.session.invalidate();
            }
            TouchAction::Up | TouchAction::Cancel => {
                let tap = match event.action {
                    TouchAction::Up => self.taps.on_up(event.time_ms),
                    _ => {
                        self.taps.cancel();
                        None
                    }
                };
                self.session.end();

                if let Some(TapOutcome::DoubleTap(at)) = tap {
                    if scene.config.double_tap_to_zoom {
                        self.double_tap(at, scene, &mut out);
                        return out;
                    }
                }
                self.settle(scene, &mut out);
            }
        }
        out
    }

    /// Confirm a pending single tap whose double-tap window has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<GestureOutcome> {
        match self.taps.tick(now_ms)? {
            TapOutcome::SingleTap(at) => Some(GestureOutcome::Tap(at)),
            TapOutcome::DoubleTap(_) => None,
        }
    }

    /// Abandon the gesture without settling the view.
    pub fn reset(&mut self) {
        self.session.end();
        self.taps.cancel();
    }

    fn track(
        &mut self,
        event: &TouchEvent,
        focal: Point,
        scene: &mut Scene<'_>,
        out: &mut Vec<GestureOutcome>,
    ) {
        let count = event.pointer_count();
        let transform = scene.transform.current();

        if self.session.target().is_none() {
            let target = self.classify(transform, scene);
            self.session.set_target(target);
        }
        let (dx, dy) = self.session.advance(focal);

        let dragged = match self.session.target() {
            Some(Target::Shape { id, region }) if count == 1 => Some((id.clone(), *region)),
            _ => None,
        };
        let changed = match dragged {
            Some((id, region)) => drag_shape(&id, region, dx, dy, scene),
            None => self.pan_zoom(event, focal, dx, dy, scene),
        };
        if changed {
            out.push(GestureOutcome::Changed);
        }
    }

    /// Hit-test at the session's anchor point and move focus to the result.
    fn classify(&self, transform: Transform, scene: &mut Scene<'_>) -> Target {
        let Some(point) = self.session.hit_point() else {
            return Target::View;
        };
        scene.registry.refresh_focus();
        let hit = HitTester::new(scene.registry, transform)
            .classify(point, scene.registry.focused_id());
        let Some(hit) = hit else {
            return Target::View;
        };
        scene.registry.set_focus(hit.id.as_deref());
        debug!(id = ?hit.id, region = ?hit.region, "gesture target classified");
        match hit.id {
            Some(id) if !hit.region.is_out_of_bounds() => Target::Shape {
                id,
                region: hit.region,
            },
            _ => Target::View,
        }
    }

    fn pan_zoom(
        &mut self,
        event: &TouchEvent,
        focal: Point,
        dx: f32,
        dy: f32,
        scene: &mut Scene<'_>,
    ) -> bool {
        let config = scene.config;
        let pinching = event.pointer_count() > 1;
        let mut changed = false;

        if config.translatable && scene.transform.scale_factor() > 1.0 {
            let current = scene.transform.current();
            let (dx, dy) = viewport::clamp_pan(
                dx,
                dy,
                &scene.bounds.bounds(&current),
                scene.bounds.displayed_size(&current),
                scene.surface,
                config.restrict_bounds,
                pinching,
            );
            if dx != 0.0 || dy != 0.0 {
                scene.transform.pan(dx, dy);
                changed = true;
            }
        }

        if config.zoomable && pinching {
            if let Some(ratio) = self.session.pinch_ratio(event.span()) {
                let applied = scene.transform.zoom_by(ratio, focal);
                changed |= applied != 1.0;
            }
        }
        changed
    }

    fn settle(&self, scene: &mut Scene<'_>, out: &mut Vec<GestureOutcome>) {
        let from = scene.transform.current();
        let to = viewport::settle_target(
            scene.config.auto_reset_mode,
            scene.config.auto_center,
            scene.transform,
            &scene.bounds.bounds(&from),
            scene.bounds.displayed_size(&from),
            scene.surface,
        );
        if to != from {
            out.push(GestureOutcome::Settle { from, to });
        }
    }

    /// Reset when zoomed, otherwise zoom by the configured factor about `at`.
    fn double_tap(&self, at: Point, scene: &mut Scene<'_>, out: &mut Vec<GestureOutcome>) {
        let from = scene.transform.current();
        let to = if scene.transform.is_at_start_scale() {
            let mut zoomed = scene.transform.clone();
            zoomed.zoom_by(scene.config.double_tap_zoom_factor, at);
            zoomed.current()
        } else {
            scene.transform.start()
        };
        debug!(x = at.x, y = at.y, scale = to.scale, "double tap");
        if to != from {
            out.push(GestureOutcome::Settle { from, to });
        }
    }
}

/// Drag one region of a shape by a surface delta. Returns whether the shape
/// changed.
fn drag_shape(id: &str, region: Region, dx: f32, dy: f32, scene: &mut Scene<'_>) -> bool {
    let shape = match region {
        Region::Rect(_) => scene.registry.rect(id),
        Region::Polygon(_) => scene.registry.polygon(id),
    };
    let Some(shape) = shape else {
        return false;
    };
    if shape.locked {
        trace!(id, "drag ignored on locked shape");
        return false;
    }

    let transform = scene.transform.current();
    let solver = ConstraintEngine::new(
        transform,
        scene.bounds.bounds(&transform),
        scene.config.min_rect_width,
        scene.config.min_rect_height,
    );
    let geometry = solver.translate(
        &shape.geometry,
        region,
        transform.invert_length(dx),
        transform.invert_length(dy),
    );
    if geometry == shape.geometry {
        return false;
    }
    scene.registry.set_geometry(id, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::shape::{Color, Geometry, ViewContext};

    struct Harness {
        config: EngineConfig,
        transform: TransformState,
        bounds: BoundsTracker,
        registry: ShapeRegistry,
        machine: GestureStateMachine,
    }

    const SIZE: Size = Size {
        width: 400.0,
        height: 400.0,
    };

    impl Harness {
        fn new() -> Self {
            let config = EngineConfig::default();
            Self {
                transform: TransformState::new(
                    Transform::identity(),
                    config.min_scale,
                    config.max_scale,
                )
                .unwrap(),
                bounds: BoundsTracker::new(SIZE),
                registry: ShapeRegistry::new(),
                machine: GestureStateMachine::new(&config),
                config,
            }
        }

        fn view(&self) -> ViewContext {
            let transform = self.transform.current();
            ViewContext {
                transform,
                bounds: self.bounds.bounds(&transform),
                surface: SIZE,
                image: SIZE,
                scale_factor: self.transform.scale_factor(),
            }
        }

        fn feed(
            &mut self,
            action: TouchAction,
            pointers: &[(f32, f32)],
            time_ms: u64,
        ) -> Vec<GestureOutcome> {
            let event = TouchEvent::new(
                action,
                pointers.iter().map(|&(x, y)| Point::new(x, y)).collect(),
                time_ms,
            );
            let mut scene = Scene {
                config: &self.config,
                transform: &mut self.transform,
                bounds: &self.bounds,
                registry: &mut self.registry,
                surface: SIZE,
            };
            self.machine.handle(&event, &mut scene)
        }

        fn rect(&self, id: &str) -> Rect {
            match &self.registry.rect(id).unwrap().geometry {
                Geometry::Rect(rect) => *rect,
                other => panic!("not a rectangle: {other:?}"),
            }
        }
    }

    #[test]
    fn test_corner_drag_resizes_rect() {
        let mut h = Harness::new();
        let view = h.view();
        h.registry.add_rect("a", Color::RED, &view).unwrap();

        h.feed(TouchAction::Down, &[(300.0, 300.0)], 0);
        let out = h.feed(TouchAction::Move, &[(350.0, 350.0)], 16);
        assert_eq!(out, vec![GestureOutcome::Changed]);
        assert_eq!(h.rect("a"), Rect::new(100.0, 100.0, 350.0, 350.0));

        h.feed(TouchAction::Move, &[(850.0, 850.0)], 32);
        assert_eq!(h.rect("a"), Rect::new(100.0, 100.0, 400.0, 400.0));
        h.feed(TouchAction::Up, &[(850.0, 850.0)], 48);
    }

    #[test]
    fn test_locked_shape_is_not_dragged() {
        let mut h = Harness::new();
        let view = h.view();
        h.registry.add_rect("a", Color::RED, &view).unwrap();
        h.registry.toggle_lock("a").unwrap();

        h.feed(TouchAction::Down, &[(200.0, 200.0)], 0);
        let out = h.feed(TouchAction::Move, &[(250.0, 250.0)], 16);
        assert!(out.is_empty());
        assert_eq!(h.rect("a"), Rect::new(100.0, 100.0, 300.0, 300.0));
    }

    #[test]
    fn test_pan_requires_zoom() {
        let mut h = Harness::new();
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 0);
        let out = h.feed(TouchAction::Move, &[(250.0, 250.0)], 16);
        assert!(out.is_empty());
        assert_eq!(h.transform.current(), Transform::identity());

        // Zoomed in, panning moves the view.
        h.transform.zoom_by(2.0, Point::new(200.0, 200.0));
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 100);
        h.feed(TouchAction::Move, &[(250.0, 230.0)], 116);
        assert_eq!(h.transform.current().translate_x, -150.0);
        assert_eq!(h.transform.current().translate_y, -170.0);
    }

    #[test]
    fn test_pinch_zoom_clamps() {
        let mut h = Harness::new();
        h.feed(TouchAction::Down, &[(150.0, 200.0)], 0);
        // Second pointer re-anchors.
        h.feed(TouchAction::Down, &[(150.0, 200.0), (250.0, 200.0)], 10);
        let out = h.feed(TouchAction::Move, &[(100.0, 200.0), (300.0, 200.0)], 20);
        assert_eq!(out, vec![GestureOutcome::Changed]);
        assert!((h.transform.current_scale() - 2.0).abs() < 1e-5);

        h.feed(TouchAction::Move, &[(0.0, 200.0), (4000.0, 200.0)], 30);
        assert!((h.transform.current_scale() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_release_settles_under_start_scale() {
        let mut h = Harness::new();
        h.transform.zoom_by(0.7, Point::new(200.0, 200.0));
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 0);
        let out = h.feed(TouchAction::Up, &[(200.0, 200.0)], 900);
        assert_eq!(
            out,
            vec![GestureOutcome::Settle {
                from: h.transform.current(),
                to: Transform::identity(),
            }]
        );
    }

    #[test]
    fn test_single_tap_reported_after_timeout() {
        let mut h = Harness::new();
        h.feed(TouchAction::Down, &[(120.0, 130.0)], 0);
        h.feed(TouchAction::Up, &[(120.0, 130.0)], 40);
        assert!(h.machine.has_pending_tap());
        assert_eq!(h.machine.tick(100), None);
        assert_eq!(h.machine.tick(400), Some(GestureOutcome::Tap(Point::new(120.0, 130.0))));
    }

    #[test]
    fn test_double_tap_zooms_then_resets() {
        let mut h = Harness::new();
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 0);
        h.feed(TouchAction::Up, &[(200.0, 200.0)], 40);
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 120);
        // Moves are ignored while the double tap is pending.
        assert!(h.feed(TouchAction::Move, &[(260.0, 260.0)], 130).is_empty());
        let out = h.feed(TouchAction::Up, &[(200.0, 200.0)], 160);

        let zoomed = Transform::identity().post_scale(3.0, Point::new(200.0, 200.0));
        assert_eq!(
            out,
            vec![GestureOutcome::Settle {
                from: Transform::identity(),
                to: zoomed,
            }]
        );

        // Applied by the caller; a second double tap goes back to the start.
        h.transform.set(zoomed);
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 1000);
        h.feed(TouchAction::Up, &[(200.0, 200.0)], 1040);
        h.feed(TouchAction::Down, &[(200.0, 200.0)], 1100);
        let out = h.feed(TouchAction::Up, &[(200.0, 200.0)], 1140);
        assert_eq!(
            out,
            vec![GestureOutcome::Settle {
                from: zoomed,
                to: Transform::identity(),
            }]
        );
    }

    #[test]
    fn test_pointer_lift_reanchors() {
        let mut h = Harness::new();
        h.transform.zoom_by(2.0, Point::new(200.0, 200.0));
        h.feed(TouchAction::Down, &[(100.0, 100.0)], 0);
        h.feed(TouchAction::Down, &[(100.0, 100.0), (300.0, 100.0)], 10);
        h.feed(TouchAction::Up, &[(100.0, 100.0), (300.0, 100.0)], 20);
        let before = h.transform.current();
        // First move after the lift only re-anchors.
        assert!(h.feed(TouchAction::Move, &[(300.0, 100.0)], 30).is_empty());
        assert_eq!(h.transform.current(), before);
    }

    #[test]
    fn test_drag_hit_test_uses_anchor_point() {
        let mut h = Harness::new();
        let view = h.view();
        h.registry.add_rect("a", Color::RED, &view).unwrap();
        // Down on the left-top corner, first move lands well away from it.
        h.feed(TouchAction::Down, &[(100.0, 100.0)], 0);
        h.feed(TouchAction::Move, &[(40.0, 160.0)], 16);
        assert_eq!(h.rect("a"), Rect::new(40.0, 160.0, 300.0, 300.0));
    }
}
