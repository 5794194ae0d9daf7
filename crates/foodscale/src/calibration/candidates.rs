//! Boundary candidates for the reference object.
//!
//! The plate is assumed to contrast with its surroundings in luma. Both
//! polarities of a global two-class split are traced, and every top-level
//! outer contour large enough to be a plate becomes a candidate.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};

use super::CalibrationConfig;
use crate::threshold::split_classes;

/// Which side of the luma split is treated as foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Polarity {
    /// Reference brighter than its surroundings.
    Bright,
    /// Reference darker than its surroundings.
    Dark,
}

/// Outer boundary of one connected blob.
#[derive(Debug, Clone)]
pub(crate) struct BoundaryCandidate {
    pub polarity: Polarity,
    pub points: Vec<[f64; 2]>,
}

/// Binarize `luma` and collect plate-sized outer contours.
pub(crate) fn boundary_candidates(
    luma: &GrayImage,
    config: &CalibrationConfig,
) -> Vec<BoundaryCandidate> {
    let Some(split) = split_classes(luma) else {
        return Vec::new();
    };
    if split.separation() < config.min_contrast {
        tracing::debug!(
            separation = split.separation(),
            "luma classes too close for a reference object"
        );
        return Vec::new();
    }
    let cut = split.midpoint();
    tracing::trace!(otsu_level = split.otsu_level, cut, "luma split");
    let (w, h) = luma.dimensions();
    let min_extent = config.min_diameter_fraction * w.min(h) as f64;

    let mut out = Vec::new();
    for polarity in [Polarity::Bright, Polarity::Dark] {
        let mask = GrayImage::from_fn(w, h, |x, y| {
            let v = luma.get_pixel(x, y)[0] as f64;
            let on = match polarity {
                Polarity::Bright => v > cut,
                Polarity::Dark => v <= cut,
            };
            Luma([if on { 255 } else { 0 }])
        });

        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            if contour.points.len() < config.min_boundary_points {
                continue;
            }
            let (min_x, max_x, min_y, max_y) = contour.points.iter().fold(
                (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
                |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
            );
            let extent = (max_x - min_x).max(max_y - min_y) as f64;
            if extent < min_extent {
                continue;
            }
            let stride = contour.points.len().div_ceil(config.max_boundary_points.max(1));
            let points = contour
                .points
                .iter()
                .step_by(stride.max(1))
                .map(|p| [p.x as f64, p.y as f64])
                .collect();
            out.push(BoundaryCandidate { polarity, points });
        }
    }
    out
}
