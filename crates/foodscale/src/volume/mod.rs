//! Per-region volume from a calibrated silhouette and a shape model.

mod shape;

pub use shape::{Footprint, ShapeModel};

use crate::calibration::ReferenceCalibration;
use crate::error::EstimateError;
use crate::pipeline::Stage;
use crate::segment::{BoundingBox, FoodRegion};

/// Numeric policy for volume estimation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Floor applied to every region volume (ml).
    pub min_volume_ml: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            min_volume_ml: 1e-3,
        }
    }
}

/// Volume of one region.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionVolume {
    /// Volume after clamping (ml).
    pub volume_ml: f64,
    /// `true` when the raw volume was below the floor.
    pub clamped: bool,
    /// Footprint the formula was applied to.
    pub footprint: Footprint,
}

/// Convert a region's pixel footprint into centimetres.
pub fn footprint_cm(region: &FoodRegion, calibration: &ReferenceCalibration) -> Footprint {
    Footprint {
        area_cm2: calibration.px2_to_cm2(region.area_px as f64),
        semi_major_cm: calibration.px_to_cm(region.footprint.a),
        semi_minor_cm: calibration.px_to_cm(region.footprint.b),
    }
}

/// Estimate the volume of one region.
///
/// Degenerate regions are clamped to `min_volume_ml`. A non-finite raw volume
/// is reported as a computation fault rather than clamped.
pub fn estimate_volume(
    region: &FoodRegion,
    calibration: &ReferenceCalibration,
    shape: &ShapeModel,
    config: &VolumeConfig,
) -> Result<RegionVolume, EstimateError> {
    let footprint = footprint_cm(region, calibration);
    let raw = shape.volume_cm3(&footprint);
    if !raw.is_finite() {
        return Err(EstimateError::Computation {
            stage: Stage::Estimated,
            quantity: "volume",
        });
    }
    let clamped = raw < config.min_volume_ml;
    Ok(RegionVolume {
        volume_ml: if clamped { config.min_volume_ml } else { raw },
        clamped,
        footprint,
    })
}

/// Aggregate extent of all regions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingDiagnostic {
    /// Union of region bounding boxes (pixels).
    pub bbox_px: BoundingBox,
    /// Width of the union box (cm).
    pub width_cm: f64,
    /// Height of the union box (cm).
    pub height_cm: f64,
    /// Sum of region footprint areas (cm²).
    pub footprint_area_cm2: f64,
}

impl BoundingDiagnostic {
    /// Fold region boxes and footprint areas; `None` for no regions.
    pub fn from_parts<I>(parts: I, calibration: &ReferenceCalibration) -> Option<Self>
    where
        I: IntoIterator<Item = (BoundingBox, f64)>,
    {
        let mut iter = parts.into_iter();
        let (first, first_area) = iter.next()?;
        let (bbox_px, footprint_area_cm2) = iter.fold((first, first_area), |(b, a), (nb, na)| {
            (b.union(&nb), a + na)
        });
        Some(Self {
            bbox_px,
            width_cm: calibration.px_to_cm(bbox_px.width() as f64),
            height_cm: calibration.px_to_cm(bbox_px.height() as f64),
            footprint_area_cm2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationConfig;
    use crate::conic::Ellipse;
    use crate::segment::RegionMask;
    use approx::assert_relative_eq;
    use image::GrayImage;

    fn calib(ppc: f64) -> ReferenceCalibration {
        ReferenceCalibration {
            detected: true,
            pixels_per_cm: ppc,
            reference_diameter_cm: 24.0,
            plate: None,
            inlier_ratio: None,
        }
    }

    fn region(area_px: usize, a: f64, b: f64) -> FoodRegion {
        let bbox = BoundingBox {
            x0: 0,
            y0: 0,
            x1: 9,
            y1: 4,
        };
        FoodRegion {
            area_px,
            bbox,
            centroid: [5.0, 2.0],
            footprint: Ellipse {
                cx: 5.0,
                cy: 2.0,
                a,
                b,
                angle: 0.0,
            },
            mean_contrast: 100.0,
            mask: RegionMask {
                origin: [0, 0],
                mask: GrayImage::new(10, 5),
            },
        }
    }

    #[test]
    fn volume_uses_calibrated_dimensions() {
        let r = region(1000, 90.0, 30.0);
        let shape = ShapeModel::Cylinder { height_ratio: 1.0 };
        let v = estimate_volume(&r, &calib(10.0), &shape, &VolumeConfig::default()).unwrap();
        assert!(!v.clamped);
        assert_relative_eq!(v.footprint.area_cm2, 10.0);
        assert_relative_eq!(v.volume_ml, 2.0 * std::f64::consts::PI * 9.0 * 9.0, max_relative = 1e-12);
    }

    #[test]
    fn tiny_region_is_clamped_to_floor() {
        let r = region(1, 0.5, 0.5);
        let shape = ShapeModel::Ellipsoid { height_ratio: 0.9 };
        let v = estimate_volume(&r, &calib(1e4), &shape, &VolumeConfig::default()).unwrap();
        assert!(v.clamped);
        assert_eq!(v.volume_ml, 1e-3);
    }

    #[test]
    fn non_finite_volume_is_a_computation_error() {
        let r = region(10, f64::INFINITY, 1.0);
        let shape = ShapeModel::Cylinder { height_ratio: 1.0 };
        let err = estimate_volume(&r, &calib(1.0), &shape, &VolumeConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "computation_error");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn bounding_diagnostic_unions_boxes() {
        let cal = ReferenceCalibration::fallback(100, 100, 9.0, &CalibrationConfig::default());
        let a = BoundingBox {
            x0: 10,
            y0: 10,
            x1: 19,
            y1: 19,
        };
        let b = BoundingBox {
            x0: 30,
            y0: 5,
            x1: 39,
            y1: 14,
        };
        let d = BoundingDiagnostic::from_parts([(a, 1.5), (b, 2.5)], &cal).unwrap();
        assert_eq!(
            d.bbox_px,
            BoundingBox {
                x0: 10,
                y0: 5,
                x1: 39,
                y1: 19
            }
        );
        assert_relative_eq!(d.width_cm, 3.0);
        assert_relative_eq!(d.height_cm, 1.5);
        assert_relative_eq!(d.footprint_area_cm2, 4.0);
        assert!(BoundingDiagnostic::from_parts(std::iter::empty(), &cal).is_none());
    }
}
