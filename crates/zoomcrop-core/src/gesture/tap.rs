//! Single and double tap detection.
//!
//! ## States
//!
//! ```text
//! Idle --down--> FirstDown --up--> AwaitingSecond --down--> SecondDown --up--> Idle (double tap)
//!                    |                   |
//!                 slop/long           timeout
//!                    v                   v
//!                  Idle           Idle (single tap)
//! ```
//!
//! A single tap is only confirmed once no second tap can follow: when
//! [`TapTracker::tick`] sees the double-tap timeout elapse, or when the next
//! down arrives too late or too far away.

use crate::config::GestureTimings;
use crate::geometry::Point;

/// A confirmed tap at a surface position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    SingleTap(Point),
    DoubleTap(Point),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum TapState {
    #[default]
    Idle,
    FirstDown {
        at: Point,
        time_ms: u64,
    },
    AwaitingSecond {
        at: Point,
        up_ms: u64,
    },
    SecondDown {
        at: Point,
    },
}

/// Tap state machine driven by single-pointer events.
#[derive(Debug, Clone, Default)]
pub struct TapTracker {
    timings: GestureTimings,
    state: TapState,
}

impl TapTracker {
    pub fn new(timings: GestureTimings) -> Self {
        Self {
            timings,
            state: TapState::Idle,
        }
    }

    /// A first pointer went down.
    ///
    /// Returns a previously pending single tap that this down rules out as
    /// the start of a double tap.
    pub fn on_down(&mut self, at: Point, time_ms: u64) -> Option<TapOutcome> {
        let mut confirmed = None;
        if let TapState::AwaitingSecond { at: first, up_ms } = self.state {
            let in_time = time_ms.saturating_sub(up_ms) <= self.timings.double_tap_timeout_ms;
            let in_reach = first.distance(at) <= self.timings.double_tap_slop;
            if in_time && in_reach {
                self.state = TapState::SecondDown { at };
                return None;
            }
            confirmed = Some(TapOutcome::SingleTap(first));
        }
        self.state = TapState::FirstDown { at, time_ms };
        confirmed
    }

    /// The pointer moved. Leaving the touch slop turns a tap into a drag.
    pub fn on_move(&mut self, to: Point) {
        if let TapState::FirstDown { at, .. } = self.state {
            if at.distance(to) > self.timings.touch_slop {
                self.state = TapState::Idle;
            }
        }
    }

    /// The last pointer went up.
    pub fn on_up(&mut self, time_ms: u64) -> Option<TapOutcome> {
        match self.state {
            TapState::FirstDown { at, time_ms: down_ms } => {
                if time_ms.saturating_sub(down_ms) <= self.timings.long_press_timeout_ms {
                    self.state = TapState::AwaitingSecond { at, up_ms: time_ms };
                } else {
                    self.state = TapState::Idle;
                }
                None
            }
            TapState::SecondDown { at } => {
                self.state = TapState::Idle;
                Some(TapOutcome::DoubleTap(at))
            }
            TapState::Idle | TapState::AwaitingSecond { .. } => None,
        }
    }

    /// Confirm a pending single tap once the double-tap window has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<TapOutcome> {
        if let TapState::AwaitingSecond { at, up_ms } = self.state {
            if now_ms.saturating_sub(up_ms) > self.timings.double_tap_timeout_ms {
                self.state = TapState::Idle;
                return Some(TapOutcome::SingleTap(at));
            }
        }
        None
    }

    /// Abandon any tap in progress (multi-touch or cancel).
    pub fn cancel(&mut self) {
        self.state = TapState::Idle;
    }

    /// Second tap is down and waiting for its up.
    pub fn is_double_tap_pending(&self) -> bool {
        matches!(self.state, TapState::SecondDown { .. })
    }

    /// First tap is complete and waiting for confirmation.
    pub fn is_single_tap_pending(&self) -> bool {
        matches!(self.state, TapState::AwaitingSecond { .. })
    }
}
