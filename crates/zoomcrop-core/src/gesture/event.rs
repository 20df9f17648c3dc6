//! Raw touch input as delivered by the host.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Kind of touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    /// A pointer went down.
    Down,
    /// One or more pointers moved.
    Move,
    /// A pointer went up. `pointers` still includes the lifted pointer.
    Up,
    /// The host aborted the gesture.
    Cancel,
}

/// One touch event in surface coordinates.
///
/// `pointers` lists every pointer in contact when the event happened. An
/// `Up` with more than one pointer lifts one of them and leaves the gesture
/// running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<Point>,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<Point>, time_ms: u64) -> Self {
        Self {
            action,
            pointers,
            time_ms,
        }
    }

    /// Single-pointer event.
    pub fn single(action: TouchAction, point: Point, time_ms: u64) -> Self {
        Self::new(action, vec![point], time_ms)
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Centroid of all pointers, `None` without pointers.
    pub fn focal_point(&self) -> Option<Point> {
        if self.pointers.is_empty() {
            return None;
        }
        let n = self.pointers.len() as f32;
        let (sx, sy) = self
            .pointers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }

    /// Average pointer distance from the focal point.
    ///
    /// Zero for a single pointer. The ratio of consecutive spans is the pinch
    /// zoom factor.
    pub fn span(&self) -> f32 {
        let Some(focal) = self.focal_point() else {
            return 0.0;
        };
        let total: f32 = self.pointers.iter().map(|p| p.distance(focal)).sum();
        total / self.pointers.len() as f32
    }

    /// Whether this event ends the gesture (last pointer up, or cancel).
    pub fn ends_gesture(&self) -> bool {
        match self.action {
            TouchAction::Cancel => true,
            TouchAction::Up => self.pointers.len() <= 1,
            TouchAction::Down | TouchAction::Move => false,
        }
    }
}
