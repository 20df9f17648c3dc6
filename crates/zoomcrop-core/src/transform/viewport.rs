//! Viewport policies: how far a pan may go and where the image settles when
//! a gesture ends.
//!
//! Every function here is evaluated independently per axis with the same
//! inputs:
//!
//! - `lo`/`hi`: image edges in surface space (left/right or top/bottom)
//! - `displayed`: displayed image length on that axis
//! - `extent`: surface length on that axis

use tracing::debug;

use crate::config::AutoResetMode;
use crate::geometry::{Rect, Size};

use super::matrix::Transform;
use super::state::TransformState;

/// Clamp a surface-space pan delta.
///
/// With `restrict` set, an image larger than the surface cannot have its
/// edges dragged inward past the surface edges, and a smaller image cannot
/// be dragged past them outward. The restriction is skipped while a pinch is
/// in progress. Regardless of `restrict`, the image can never be dragged
/// completely off the surface.
pub fn clamp_pan(
    dx: f32,
    dy: f32,
    bounds: &Rect,
    displayed: Size,
    surface: Size,
    restrict: bool,
    pinching: bool,
) -> (f32, f32) {
    let x = clamp_axis_pan(
        dx,
        bounds.left,
        bounds.right,
        displayed.width,
        surface.width,
        restrict && !pinching,
    );
    let y = clamp_axis_pan(
        dy,
        bounds.top,
        bounds.bottom,
        displayed.height,
        surface.height,
        restrict && !pinching,
    );
    (x, y)
}

fn clamp_axis_pan(
    delta: f32,
    lo: f32,
    hi: f32,
    displayed: f32,
    extent: f32,
    restrict: bool,
) -> f32 {
    let mut delta = delta;

    if restrict {
        if displayed >= extent {
            if lo <= 0.0 && lo + delta > 0.0 {
                delta = -lo;
            } else if hi >= extent && hi + delta < extent {
                delta = extent - hi;
            }
        } else if lo >= 0.0 && lo + delta < 0.0 {
            delta = -lo;
        } else if hi <= extent && hi + delta > extent {
            delta = extent - hi;
        }
    }

    // Never let the image leave the surface entirely.
    if hi + delta < 0.0 {
        delta = -hi;
    } else if lo + delta > extent {
        delta = extent - lo;
    }

    delta
}

/// Transform with the image pulled back onto the surface.
///
/// Per axis: when the displayed image is larger than the surface, an edge
/// that moved inward past the surface edge is pulled back out to it; when it
/// is smaller, an edge that moved outward past the surface edge is pulled
/// back in. The leading edge (left/top) is considered first.
pub fn recenter(transform: &Transform, bounds: &Rect, displayed: Size, surface: Size) -> Transform {
    let tx = recenter_axis(
        transform.translate_x,
        bounds.left,
        bounds.right,
        displayed.width,
        surface.width,
    );
    let ty = recenter_axis(
        transform.translate_y,
        bounds.top,
        bounds.bottom,
        displayed.height,
        surface.height,
    );
    transform.with_translation(tx, ty)
}

fn recenter_axis(translate: f32, lo: f32, hi: f32, displayed: f32, extent: f32) -> f32 {
    if displayed > extent {
        if lo > 0.0 {
            return 0.0;
        }
        if hi < extent {
            return lo + extent - hi;
        }
    } else {
        if lo < 0.0 {
            return 0.0;
        }
        if hi > extent {
            return lo + extent - hi;
        }
    }
    translate
}

/// Transform the view should settle on once a gesture ends.
///
/// `Always` resets, `Never` only re-centers, `Under`/`Over` reset when the
/// final scale is at or below/above the starting scale and re-center
/// otherwise. Re-centering only happens with `auto_center` enabled.
pub fn settle_target(
    mode: AutoResetMode,
    auto_center: bool,
    state: &TransformState,
    bounds: &Rect,
    displayed: Size,
    surface: Size,
) -> Transform {
    let current = state.current_scale();
    let start = state.start().scale;
    let reset = match mode {
        AutoResetMode::Always => true,
        AutoResetMode::Never => false,
        AutoResetMode::Under => current <= start,
        AutoResetMode::Over => current >= start,
    };

    if reset {
        debug!(?mode, current, start, "auto reset to start transform");
        state.start()
    } else if auto_center {
        recenter(&state.current(), bounds, displayed, surface)
    } else {
        state.current()
    }
}
