//! Top-level estimate: calibrate → segment → volume → weight → assemble.

use super::result::{EstimateStatus, EstimationResult, Fallback, RegionSummary};
use super::Stage;
use crate::calibration::calibrate;
use crate::catalog::FoodCatalog;
use crate::config::EstimateConfig;
use crate::error::EstimateError;
use crate::raster::FoodImage;
use crate::request::EstimateParams;
use crate::segment::segment;
use crate::volume::{estimate_volume, BoundingDiagnostic};
use crate::weight::convert;

/// Run the full estimate on a decoded image.
///
/// Calibration and segmentation never fail; they fall back and mark the
/// result degraded. Only a non-finite volume or weight is an error.
pub fn estimate(
    image: &FoodImage,
    params: &EstimateParams,
    catalog: &FoodCatalog,
    config: &EstimateConfig,
) -> Result<EstimationResult, EstimateError> {
    let [height, width, channels] = image.shape();
    tracing::debug!(stage = %Stage::Decoded, width, height, channels, "image decoded");
    let mut fallbacks = Vec::new();

    let calibration = calibrate(&image.luma(), params.plate_diameter_cm, &config.calibration);
    if calibration.is_low_confidence() {
        tracing::warn!(
            pixels_per_cm = calibration.pixels_per_cm,
            "reference object not found; using fallback scale"
        );
        fallbacks.push(Fallback::Calibration);
    }
    tracing::debug!(
        stage = %Stage::Calibrated,
        detected = calibration.detected,
        pixels_per_cm = calibration.pixels_per_cm,
        "stage complete"
    );

    let segmentation = segment(image, &calibration, &config.segmentation);
    if segmentation.low_confidence {
        tracing::warn!("no food region above noise area; using fallback region");
        fallbacks.push(Fallback::Segmentation);
    }
    tracing::debug!(
        stage = %Stage::Segmented,
        regions = segmentation.regions.len(),
        threshold = segmentation.threshold,
        "stage complete"
    );

    let resolution = catalog.resolve(&params.food_type);
    if resolution.fallback {
        tracing::warn!(
            requested = %params.food_type,
            "food type not in catalog; using default entry"
        );
        fallbacks.push(Fallback::FoodType);
    }
    let shape = resolution.entry.shape;

    let regions_iter = segmentation.into_regions();
    let mut volumes_ml = Vec::with_capacity(regions_iter.len());
    let mut regions = Vec::with_capacity(regions_iter.len());
    for region in regions_iter {
        let volume = estimate_volume(&region, &calibration, &shape, &config.volume)?;
        volumes_ml.push(volume.volume_ml);
        regions.push(RegionSummary::new(&region, &volume));
    }
    tracing::debug!(
        stage = %Stage::Estimated,
        model = shape.name(),
        volumes = ?volumes_ml,
        "stage complete"
    );

    let density = resolution.entry.density_g_per_ml;
    let weight = convert(&volumes_ml, density)?;
    tracing::debug!(
        stage = %Stage::Converted,
        total_volume_ml = weight.total_volume_ml,
        weight_grams = weight.grams,
        "stage complete"
    );

    let bounds = BoundingDiagnostic::from_parts(
        regions.iter().map(|r| (r.bbox, r.footprint_area_cm2)),
        &calibration,
    )
    .ok_or(EstimateError::Computation {
        stage: Stage::Segmented,
        quantity: "regions",
    })?;

    let status = if fallbacks.iter().any(Fallback::degrades_status) {
        EstimateStatus::Degraded
    } else {
        EstimateStatus::Success
    };
    tracing::debug!(stage = %Stage::Assembled, ?status, "stage complete");

    Ok(EstimationResult {
        food_type_match: resolution.matched.to_string(),
        weight_grams: weight.grams,
        volumes_ml,
        density_g_per_ml: density,
        status,
        image_shape: image.shape(),
        fallbacks,
        shape_model: shape,
        calibration,
        regions,
        bounds,
    })
}
