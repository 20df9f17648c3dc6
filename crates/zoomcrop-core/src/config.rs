//! Engine configuration.
//!
//! Loading configuration (widget attributes, JSON files, JS objects) is the
//! host's job. The engine only consumes an [`EngineConfig`] value, validated
//! once at construction and again on every explicit scale-range update.
//!
//! Every field has a default, and the struct deserializes with
//! `#[serde(default)]`, so hosts only need to send the values they override.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default relative minimum scale (times the starting scale).
pub const DEFAULT_MIN_SCALE: f32 = 0.6;
/// Default relative maximum scale (times the starting scale).
pub const DEFAULT_MAX_SCALE: f32 = 8.0;
/// Default minimum crop rectangle edge, in image-local pixels.
pub const DEFAULT_MIN_RECT_EDGE: f32 = 10.0;
/// Default double-tap zoom factor.
pub const DEFAULT_DOUBLE_TAP_ZOOM: f32 = 3.0;

/// What happens to the view transform when a gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoResetMode {
    /// Reset only if the image ended at or below its starting scale.
    #[default]
    Under,
    /// Reset only if the image ended at or above its starting scale.
    Over,
    /// Always reset to the starting transform.
    Always,
    /// Never reset; only re-center when auto-center is enabled.
    Never,
}

/// Timing and distance thresholds for tap detection.
///
/// Defaults follow the usual touch platform values (milliseconds and surface
/// pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTimings {
    /// Maximum press duration for a down/up pair to count as a tap.
    pub long_press_timeout_ms: u64,
    /// Window after a tap's up in which a second down makes a double tap.
    pub double_tap_timeout_ms: u64,
    /// Movement allowed while a tap is pressed.
    pub touch_slop: f32,
    /// Maximum distance between the two downs of a double tap.
    pub double_tap_slop: f32,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            long_press_timeout_ms: 500,
            double_tap_timeout_ms: 300,
            touch_slop: 8.0,
            double_tap_slop: 100.0,
        }
    }
}

/// Engine configuration.
///
/// Scale bounds are relative to the starting scale: `min_scale = 0.5` means
/// the image may shrink to half of its first-layout size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pinch-to-zoom enabled.
    pub zoomable: bool,
    /// Panning enabled (only takes effect while zoomed in).
    pub translatable: bool,
    /// Keep the image edges from being dragged inward past the surface edges.
    pub restrict_bounds: bool,
    /// Ask the host to tween reset and re-center transitions.
    pub animate_on_reset: bool,
    /// Pull the image back on screen after a gesture ends.
    pub auto_center: bool,
    /// Double tap toggles between start scale and `double_tap_zoom_factor`.
    pub double_tap_to_zoom: bool,
    /// Relative minimum scale.
    pub min_scale: f32,
    /// Relative maximum scale.
    pub max_scale: f32,
    /// Minimum crop rectangle width, image-local pixels.
    pub min_rect_width: f32,
    /// Minimum crop rectangle height, image-local pixels.
    pub min_rect_height: f32,
    /// Zoom factor applied by a double tap at the starting scale.
    pub double_tap_zoom_factor: f32,
    /// Reset policy applied when a gesture ends.
    pub auto_reset_mode: AutoResetMode,
    /// Tap detection thresholds.
    pub gestures: GestureTimings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zoomable: true,
            translatable: true,
            restrict_bounds: false,
            animate_on_reset: true,
            auto_center: true,
            double_tap_to_zoom: true,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            min_rect_width: DEFAULT_MIN_RECT_EDGE,
            min_rect_height: DEFAULT_MIN_RECT_EDGE,
            double_tap_zoom_factor: DEFAULT_DOUBLE_TAP_ZOOM,
            auto_reset_mode: AutoResetMode::Under,
            gestures: GestureTimings::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the normalized copy.
    ///
    /// The double-tap zoom factor is clamped into `[min_scale, max_scale]`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidScaleRange`] when either bound is not strictly
    /// positive or `min_scale >= max_scale`.
    pub fn validate(mut self) -> Result<Self, EngineError> {
        check_scale_range(self.min_scale, self.max_scale)?;
        self.double_tap_zoom_factor = self
            .double_tap_zoom_factor
            .clamp(self.min_scale, self.max_scale);
        self.min_rect_width = self.min_rect_width.max(0.0);
        self.min_rect_height = self.min_rect_height.max(0.0);
        Ok(self)
    }
}

/// Check a relative scale range.
pub(crate) fn check_scale_range(min: f32, max: f32) -> Result<(), EngineError> {
    // NaN fails every comparison, so it lands in the error branch.
    if !(min > 0.0 && max > 0.0 && min < max) {
        return Err(EngineError::InvalidScaleRange { min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::new().validate().unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.auto_reset_mode, AutoResetMode::Under);
        assert!(config.zoomable);
        assert!(!config.restrict_bounds);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut config = EngineConfig::new();
        config.min_scale = 4.0;
        config.max_scale = 2.0;
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidScaleRange { min: 4.0, max: 2.0 })
        );
    }

    #[test]
    fn test_rejects_equal_range() {
        let mut config = EngineConfig::new();
        config.min_scale = 2.0;
        config.max_scale = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_bounds() {
        let mut config = EngineConfig::new();
        config.min_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new();
        config.min_scale = -1.0;
        config.max_scale = -0.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new();
        config.min_scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_double_tap_factor_clamped() {
        let mut config = EngineConfig::new();
        config.double_tap_zoom_factor = 20.0;
        assert_eq!(config.validate().unwrap().double_tap_zoom_factor, 8.0);

        let mut config = EngineConfig::new();
        config.double_tap_zoom_factor = 0.1;
        assert_eq!(config.validate().unwrap().double_tap_zoom_factor, 0.6);
    }

    #[test]
    fn test_auto_reset_mode_serde_names() {
        assert_eq!(mode_from_name("always"), AutoResetMode::Always);
        assert_eq!(mode_from_name("under"), AutoResetMode::Under);
        assert_eq!(mode_from_name("never"), AutoResetMode::Never);
    }

    fn mode_from_name(name: &str) -> AutoResetMode {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;
        let de: StrDeserializer<'_, Error> = name.into_deserializer();
        AutoResetMode::deserialize(de).unwrap()
    }
}
