use crate::calibration::ReferenceCalibration;
use crate::segment::{BoundingBox, FoodRegion};
use crate::volume::{BoundingDiagnostic, RegionVolume, ShapeModel};

/// Overall outcome of an estimate that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    /// Reference found and food segmented.
    Success,
    /// Calibration or segmentation fell back to defaults.
    Degraded,
}

/// A default substituted for a measurement or lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// No plausible reference object; fallback scale used.
    Calibration,
    /// No food region above the noise area; fallback region used.
    Segmentation,
    /// Requested food type not in the catalog; `default` entry used.
    FoodType,
}

impl Fallback {
    /// Whether this fallback lowers the result status to degraded.
    pub fn degrades_status(&self) -> bool {
        matches!(self, Self::Calibration | Self::Segmentation)
    }
}

/// Diagnostics for one region.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionSummary {
    /// Pixel count.
    pub area_px: usize,
    /// Pixel bounds.
    pub bbox: BoundingBox,
    /// Centroid `[x, y]` in pixels.
    pub centroid: [f64; 2],
    /// Silhouette area (cm²).
    pub footprint_area_cm2: f64,
    /// Semi-major axis (cm).
    pub semi_major_cm: f64,
    /// Semi-minor axis (cm).
    pub semi_minor_cm: f64,
    /// Volume (ml), identical to the matching `volumes_ml` entry.
    pub volume_ml: f64,
    /// Raw volume was below the floor.
    pub clamped: bool,
}

impl RegionSummary {
    pub(crate) fn new(region: &FoodRegion, volume: &RegionVolume) -> Self {
        Self {
            area_px: region.area_px,
            bbox: region.bbox,
            centroid: region.centroid,
            footprint_area_cm2: volume.footprint.area_cm2,
            semi_major_cm: volume.footprint.semi_major_cm,
            semi_minor_cm: volume.footprint.semi_minor_cm,
            volume_ml: volume.volume_ml,
            clamped: volume.clamped,
        }
    }
}

/// Full estimate for one image.
///
/// The first six fields form the wire response; the rest are diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EstimationResult {
    /// Requested food type on a catalog hit, `"default"` otherwise.
    pub food_type_match: String,
    /// `sum(volumes_ml) · density_g_per_ml`.
    pub weight_grams: f64,
    /// One volume per region, largest region first.
    pub volumes_ml: Vec<f64>,
    /// Density of the resolved catalog entry.
    pub density_g_per_ml: f64,
    /// `success` or `degraded`.
    pub status: EstimateStatus,
    /// `[height, width, channels]` of the decoded image.
    pub image_shape: [u32; 3],
    /// Defaults substituted during the estimate, in stage order.
    pub fallbacks: Vec<Fallback>,
    /// Shape model of the resolved entry.
    pub shape_model: ShapeModel,
    /// Scale factor and reference ellipse.
    pub calibration: ReferenceCalibration,
    /// Per-region diagnostics, aligned with `volumes_ml`.
    pub regions: Vec<RegionSummary>,
    /// Aggregate extent of all regions.
    pub bounds: BoundingDiagnostic,
}

impl EstimationResult {
    /// Total volume (ml).
    pub fn total_volume_ml(&self) -> f64 {
        self.volumes_ml.iter().sum()
    }

    /// Whether any status-lowering fallback occurred.
    pub fn is_degraded(&self) -> bool {
        self.status == EstimateStatus::Degraded
    }
}
