//! Tunables for the stitch trail
//!
//! Every constant the renderer relies on lives here so the host page can
//! override it (`window.__stitch_config` on the web, a JSON file for the CLI).

use serde::Deserialize;

use super::error::{TrailError, TrailResult};

/// Trail, marker, camera and pointer parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrailConfig {
    /// Maximum recorded stitch points (and markers)
    pub max_points: usize,
    /// Maximum recorded stitch lines
    pub max_lines: usize,
    /// Minimum scene-space distance between consecutive points
    pub stitch_threshold: f32,
    /// Time until a point/line is fully transparent (ms)
    pub fade_ms: f64,
    /// Marker opacity at birth
    pub marker_opacity: f32,
    /// Opacity of the shared line mesh
    pub line_opacity: f32,
    /// Half extent of a marker cross in scene units
    pub marker_half_size: f32,
    /// Full range of the random marker rotation (radians)
    pub rotation_jitter: f32,
    /// Pulse amplitude around scale 1.0
    pub pulse_amplitude: f32,
    /// Pulse angular speed (radians per ms)
    pub pulse_speed: f64,
    /// Pulse phase offset between consecutive markers
    pub pulse_phase_step: f32,
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera distance from the origin along +z
    pub camera_distance: f32,
    /// Pointer counts as idle after this long without motion (ms)
    pub idle_timeout_ms: f64,
    /// Upper bound on the device pixel ratio used for the surface
    pub max_pixel_ratio: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_points: 100,
            max_lines: 200,
            stitch_threshold: 0.05,
            fade_ms: 10_000.0,
            marker_opacity: 0.9,
            line_opacity: 0.6,
            marker_half_size: 0.005,
            rotation_jitter: 0.3,
            pulse_amplitude: 0.1,
            pulse_speed: 0.003,
            pulse_phase_step: 0.5,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 5.0,
            idle_timeout_ms: 100.0,
            max_pixel_ratio: 2.0,
        }
    }
}

impl TrailConfig {
    /// Parse a (possibly partial) JSON document, filling gaps with defaults.
    pub fn from_json(json: &str) -> TrailResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrailError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrailResult<()> {
        if self.max_points == 0 || self.max_lines == 0 {
            return Err(TrailError::Config("buffer capacities must be non-zero".into()));
        }
        if !(self.fade_ms > 0.0 && self.fade_ms.is_finite()) {
            return Err(TrailError::Config(format!("fade_ms must be positive, got {}", self.fade_ms)));
        }
        if !(self.stitch_threshold >= 0.0) {
            return Err(TrailError::Config("stitch_threshold must be non-negative".into()));
        }
        // Zero would sweep markers on their first frame while their points stay
        if !(self.marker_opacity > 0.0 && self.marker_opacity <= 1.0) {
            return Err(TrailError::Config(format!(
                "marker_opacity must be in (0, 1], got {}",
                self.marker_opacity
            )));
        }
        if !(0.0..=1.0).contains(&self.line_opacity) {
            return Err(TrailError::Config(format!(
                "line_opacity must be in [0, 1], got {}",
                self.line_opacity
            )));
        }
        if !(self.marker_half_size > 0.0 && self.marker_half_size.is_finite()) {
            return Err(TrailError::Config("marker_half_size must be positive".into()));
        }
        if !(self.rotation_jitter >= 0.0 && self.rotation_jitter.is_finite()) {
            return Err(TrailError::Config("rotation_jitter must be non-negative".into()));
        }
        if !((0.0..1.0).contains(&self.pulse_amplitude)
            && self.pulse_speed.is_finite()
            && self.pulse_phase_step.is_finite())
        {
            return Err(TrailError::Config("invalid pulse parameters".into()));
        }
        if !(self.idle_timeout_ms >= 0.0 && self.idle_timeout_ms.is_finite()) {
            return Err(TrailError::Config(format!(
                "idle_timeout_ms must be finite and non-negative, got {}",
                self.idle_timeout_ms
            )));
        }
        if !(self.max_pixel_ratio > 0.0 && self.max_pixel_ratio.is_finite()) {
            return Err(TrailError::Config(format!(
                "max_pixel_ratio must be positive, got {}",
                self.max_pixel_ratio
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(TrailError::Config(format!(
                "invalid clip planes near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(TrailError::Config(format!("invalid fov {}", self.fov_degrees)));
        }
        if !(self.camera_distance > self.near && self.camera_distance < self.far) {
            return Err(TrailError::Config(
                "camera distance must lie between the clip planes".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrailConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_points, 100);
        assert_eq!(config.max_lines, 200);
        assert_eq!(config.fade_ms, 10_000.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TrailConfig::from_json(r#"{"max_points": 10, "fade_ms": 500}"#).unwrap();
        assert_eq!(config.max_points, 10);
        assert_eq!(config.fade_ms, 500.0);
        assert_eq!(config.max_lines, 200);
        assert_eq!(config.stitch_threshold, 0.05);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(TrailConfig::from_json(r#"{"max_lines": 0}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"fade_ms": -1}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"near": 10, "far": 1}"#).is_err());
        assert!(TrailConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_visuals_and_timing() {
        assert!(TrailConfig::from_json(r#"{"marker_opacity": 0}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"marker_opacity": -0.5}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"marker_opacity": 1.5}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"line_opacity": 2}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"max_pixel_ratio": 0}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"max_pixel_ratio": -1}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"idle_timeout_ms": -10}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"pulse_amplitude": 1}"#).is_err());
        assert!(TrailConfig::from_json(r#"{"rotation_jitter": -0.1}"#).is_err());

        // JSON has no NaN literal; values built in code still go through validate
        let nan_ratio = TrailConfig {
            max_pixel_ratio: f64::NAN,
            ..TrailConfig::default()
        };
        assert!(nan_ratio.validate().is_err());
        let infinite_idle = TrailConfig {
            idle_timeout_ms: f64::INFINITY,
            ..TrailConfig::default()
        };
        assert!(infinite_idle.validate().is_err());

        assert!(TrailConfig::from_json(r#"{"marker_opacity": 1, "line_opacity": 0}"#).is_ok());
    }
}
