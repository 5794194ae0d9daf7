//! Food region segmentation.
//!
//! Stages:
//! 1. **Area** – plate interior when calibration found the plate, else the frame.
//! 2. **Background** – dominant colour (coarse RGB histogram mode) of a rim
//!    band just inside the plate, or of the frame when the plate is unknown.
//! 3. **Contrast** – Euclidean RGB distance from the background per pixel.
//! 4. **Mask** – two-class cut of the contrast, floored at `min_color_distance`,
//!    then a morphological opening.
//! 5. **Regions** – 8-connected components; fragments below the noise area
//!    merge into a nearby region or are dropped; largest first.
//!
//! At least one region is always produced. When nothing survives the noise
//! threshold, the raw component most distinct from the background is used, or
//! the whole frame if there is none; both are flagged low-confidence.

mod background;
mod components;
mod region;

pub use region::{BoundingBox, FoodRegion, FoodRegions, RegionMask};

use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

use crate::calibration::ReferenceCalibration;
use crate::conic::Ellipse;
use crate::raster::FoodImage;
use background::{dominant_color, AnalysisArea, ContrastMap};
use components::{label_components, merge_fragments};
use region::{LabelImage, RegionBuilder};

/// Configuration for food region segmentation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Plate ellipse scale defining the analysis area (excludes the rim).
    pub plate_interior_scale: f64,
    /// Inner edge of the rim band used to sample the plate colour, relative
    /// to the plate semi-axes. The band ends at `plate_interior_scale`.
    pub background_band_scale: f64,
    /// Lower bound on the foreground colour-distance threshold.
    pub min_color_distance: f64,
    /// Opening radius in pixels (0 disables).
    pub open_radius: u8,
    /// Minimum region area in pixels.
    pub min_region_area_px: usize,
    /// Minimum region area in cm² (converted with the calibrated scale).
    pub min_region_area_cm2: f64,
    /// Fragments within this distance (cm) of a region are merged into it.
    pub merge_gap_cm: f64,
    /// Cap on reported regions.
    pub max_regions: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            plate_interior_scale: 0.96,
            background_band_scale: 0.85,
            min_color_distance: 30.0,
            open_radius: 1,
            min_region_area_px: 12,
            min_region_area_cm2: 0.5,
            merge_gap_cm: 1.0,
            max_regions: 12,
        }
    }
}

/// Output of [`segment`].
#[derive(Debug)]
pub struct Segmentation {
    /// Regions in descending area order.
    pub regions: FoodRegions,
    /// `true` when the fallback region was used.
    pub low_confidence: bool,
    /// Estimated background colour (RGB).
    pub background_rgb: [f64; 3],
    /// Colour-distance threshold applied.
    pub threshold: f64,
    /// Analysis area, if restricted to the plate interior.
    pub analysis_area: Option<Ellipse>,
}

impl Segmentation {
    /// Consume into the region sequence.
    pub fn into_regions(self) -> FoodRegions {
        self.regions
    }
}

/// Separate food pixels from plate and table.
pub fn segment(
    image: &FoodImage,
    calibration: &ReferenceCalibration,
    config: &SegmentationConfig,
) -> Segmentation {
    let rgb = image.rgb();
    let (w, h) = rgb.dimensions();
    let origin = [0.5 * w as f64, 0.5 * h as f64];

    let area = match &calibration.plate {
        Some(plate) => AnalysisArea::plate(
            plate,
            config.plate_interior_scale,
            config.background_band_scale,
        ),
        None => AnalysisArea::frame(),
    };
    let background_rgb = dominant_color(rgb, &area);
    let contrast = ContrastMap::new(rgb, background_rgb, &area);
    let threshold = contrast.threshold(&area, config.min_color_distance);
    let raw = contrast.mask_above(threshold);
    let opened = if config.open_radius > 0 && w >= 3 && h >= 3 {
        open(&raw, Norm::LInf, config.open_radius)
    } else {
        raw.clone()
    };

    let ppc = calibration.pixels_per_cm;
    let noise_px = (config.min_region_area_px as f64)
        .max(calibration.cm2_to_px2(config.min_region_area_cm2));
    let (labels, comps) = label_components(&opened, &contrast, origin);
    let n_components = comps.len();
    let mut kept = merge_fragments(comps, noise_px, config.merge_gap_cm * ppc);

    let finish = |regions: FoodRegions, low_confidence: bool| Segmentation {
        regions,
        low_confidence,
        background_rgb,
        threshold,
        analysis_area: area.interior(),
    };

    if !kept.is_empty() {
        kept.sort_by(|a, b| b.area().cmp(&a.area()));
        if kept.len() > config.max_regions {
            tracing::debug!(
                found = kept.len(),
                max = config.max_regions,
                "dropping smallest regions"
            );
            kept.truncate(config.max_regions);
        }
        tracing::debug!(
            components = n_components,
            regions = kept.len(),
            threshold,
            noise_px,
            "food regions segmented"
        );
        return finish(FoodRegions::new(labels, kept), false);
    }

    // Nothing above the noise threshold: take the most distinct raw blob.
    let (raw_labels, raw_comps) = label_components(&raw, &contrast, origin);
    let best = raw_comps.into_iter().fold(None::<RegionBuilder>, |best, c| match best {
        Some(b) if b.mean_contrast() >= c.mean_contrast() => Some(b),
        _ => Some(c),
    });
    let regions = match best {
        Some(b) => {
            tracing::debug!(area_px = b.area(), "using most distinct sub-threshold blob");
            FoodRegions::new(raw_labels, vec![b])
        }
        None => {
            tracing::debug!(w, h, "no foreground; using the whole frame");
            let whole = RegionBuilder::whole_frame(w, h, origin, |x, y| contrast.get(x, y));
            FoodRegions::new(LabelImage::new(0, 0), vec![whole])
        }
    };
    finish(regions, true)
}
