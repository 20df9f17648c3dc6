//! Per-gesture pointer tracking.

use crate::geometry::Point;
use crate::shape::Region;

/// What a single-pointer drag acts on, decided once per session.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Pan/zoom the view.
    View,
    /// Drag `region` of the shape `id`.
    Shape { id: String, region: Region },
}

/// State of the gesture in progress.
///
/// Re-anchored on every down and whenever the pointer count changes, which
/// also drops the cached target so the next move hit-tests again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchSession {
    anchor: Option<Point>,
    hit_point: Option<Point>,
    pointer_count: usize,
    span: Option<f32>,
    target: Option<Target>,
}

impl TouchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking from `focal` with `pointer_count` pointers.
    pub fn begin(&mut self, focal: Point, pointer_count: usize, span: f32) {
        self.anchor = Some(focal);
        self.hit_point = Some(focal);
        self.pointer_count = pointer_count;
        self.span = (pointer_count > 1).then_some(span);
        self.target = None;
    }

    /// Whether the next move must re-anchor instead of applying a delta.
    pub fn needs_reanchor(&self, pointer_count: usize) -> bool {
        self.anchor.is_none() || pointer_count != self.pointer_count
    }

    /// Drop the anchor so the next move re-anchors.
    pub fn invalidate(&mut self) {
        self.anchor = None;
        self.target = None;
    }

    /// End the gesture.
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// Surface delta from the last focal point to `focal`; `focal` becomes
    /// the new anchor.
    pub fn advance(&mut self, focal: Point) -> (f32, f32) {
        let last = self.anchor.replace(focal).unwrap_or(focal);
        (focal.x - last.x, focal.y - last.y)
    }

    /// Ratio of `span` to the previous span, remembering `span`.
    ///
    /// `None` when there is no usable previous span.
    pub fn pinch_ratio(&mut self, span: f32) -> Option<f32> {
        let previous = self.span.replace(span)?;
        (previous > 0.0 && span > 0.0).then(|| span / previous)
    }

    /// Point the session's hit-test runs at: the focal point at the last
    /// (re-)anchor.
    pub fn hit_point(&self) -> Option<Point> {
        self.hit_point
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    pub fn pointer_count(&self) -> usize {
        self.pointer_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::RectRegion;

    #[test]
    fn test_advance_moves_anchor() {
        let mut session = TouchSession::new();
        session.begin(Point::new(10.0, 10.0), 1, 0.0);
        assert_eq!(session.advance(Point::new(15.0, 7.0)), (5.0, -3.0));
        assert_eq!(session.advance(Point::new(20.0, 7.0)), (5.0, 0.0));
        // The hit point stays where the session was anchored.
        assert_eq!(session.hit_point(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_reanchor_on_pointer_change() {
        let mut session = TouchSession::new();
        assert!(session.needs_reanchor(1));
        session.begin(Point::default(), 1, 0.0);
        assert!(!session.needs_reanchor(1));
        assert!(session.needs_reanchor(2));

        session.set_target(Target::Shape {
            id: "a".into(),
            region: Region::Rect(RectRegion::Center),
        });
        session.invalidate();
        assert!(session.needs_reanchor(1));
        assert_eq!(session.target(), None);
    }

    #[test]
    fn test_pinch_ratio() {
        let mut session = TouchSession::new();
        session.begin(Point::default(), 2, 50.0);
        assert_eq!(session.pinch_ratio(100.0), Some(2.0));
        assert_eq!(session.pinch_ratio(50.0), Some(0.5));
        assert_eq!(session.pinch_ratio(0.0), None);

        // Single pointer sessions have no span to compare against.
        session.begin(Point::default(), 1, 0.0);
        assert_eq!(session.pinch_ratio(10.0), None);
    }

    #[test]
    fn test_end_resets() {
        let mut session = TouchSession::new();
        session.begin(Point::new(1.0, 1.0), 2, 10.0);
        session.end();
        assert_eq!(session, TouchSession::new());
    }
}
