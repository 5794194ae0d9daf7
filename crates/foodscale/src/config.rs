//! Top-level estimation configuration.

use std::path::Path;

use crate::calibration::CalibrationConfig;
use crate::error::ConfigError;
use crate::segment::SegmentationConfig;
use crate::volume::VolumeConfig;

/// Standard dinner-plate diameter assumed when the caller declares none.
pub const DEFAULT_PLATE_DIAMETER_CM: f64 = 24.0;

/// Configuration for the whole estimation pipeline.
///
/// Every section has defaults, so a JSON file only needs the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateConfig {
    /// Reference diameter (cm) used when the request omits `plate_diameter`.
    pub default_plate_diameter_cm: f64,
    /// Reference-object detection.
    pub calibration: CalibrationConfig,
    /// Food region segmentation.
    pub segmentation: SegmentationConfig,
    /// Volume numeric policy.
    pub volume: VolumeConfig,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            default_plate_diameter_cm: DEFAULT_PLATE_DIAMETER_CM,
            calibration: CalibrationConfig::default(),
            segmentation: SegmentationConfig::default(),
            volume: VolumeConfig::default(),
        }
    }
}

impl EstimateConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_plate_diameter_cm.is_finite() || self.default_plate_diameter_cm <= 0.0 {
            return Err(ConfigError::Invalid(
                "default_plate_diameter_cm must be finite and > 0".to_string(),
            ));
        }
        let c = &self.calibration;
        if !(c.fallback_span_fraction > 0.0 && c.fallback_span_fraction.is_finite()) {
            return Err(ConfigError::Invalid(
                "calibration.fallback_span_fraction must be finite and > 0".to_string(),
            ));
        }
        if !(c.blur_sigma >= 0.0 && c.blur_sigma.is_finite()) {
            return Err(ConfigError::Invalid(
                "calibration.blur_sigma must be finite and >= 0".to_string(),
            ));
        }
        if c.max_aspect_ratio < 1.0 {
            return Err(ConfigError::Invalid(
                "calibration.max_aspect_ratio must be >= 1".to_string(),
            ));
        }
        let s = &self.segmentation;
        if !(s.plate_interior_scale > 0.0 && s.plate_interior_scale <= 1.0) {
            return Err(ConfigError::Invalid(
                "segmentation.plate_interior_scale must be in (0, 1]".to_string(),
            ));
        }
        if !(s.background_band_scale > 0.0 && s.background_band_scale < s.plate_interior_scale) {
            return Err(ConfigError::Invalid(
                "segmentation.background_band_scale must be in (0, plate_interior_scale)"
                    .to_string(),
            ));
        }
        if s.max_regions == 0 {
            return Err(ConfigError::Invalid(
                "segmentation.max_regions must be >= 1".to_string(),
            ));
        }
        if !(self.volume.min_volume_ml > 0.0 && self.volume.min_volume_ml.is_finite()) {
            return Err(ConfigError::Invalid(
                "volume.min_volume_ml must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }
}
