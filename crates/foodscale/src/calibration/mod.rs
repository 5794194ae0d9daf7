//! Reference calibration: pixels per centimetre from a known-diameter plate.
//!
//! Stages:
//! 1. **Smooth** – optional Gaussian blur of the luma image.
//! 2. **Candidates** – two-class luma split, both polarities, top-level outer contours.
//! 3. **Fit** – RANSAC ellipse fit per candidate (uses `crate::conic`).
//! 4. **Gate** – inlier ratio, aspect ratio, minimum size, center inside the frame.
//! 5. **Scale** – `2·a / D` from the best candidate's major axis.
//!
//! When no candidate passes, a documented fallback scale is returned and the
//! calibration is marked low-confidence. This never fails.

mod candidates;

use image::GrayImage;

use crate::conic::{fit_ellipse_ransac, Ellipse, RansacConfig};
use candidates::{boundary_candidates, Polarity};

/// Configuration for reference-object calibration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Gaussian sigma applied before thresholding (0 disables).
    pub blur_sigma: f32,
    /// Minimum distance between the two luma class means.
    pub min_contrast: f64,
    /// Contours with fewer points are ignored.
    pub min_boundary_points: usize,
    /// Contours are subsampled to at most this many points before fitting.
    pub max_boundary_points: usize,
    /// Minimum plate diameter as a fraction of the shorter image side.
    pub min_diameter_fraction: f64,
    /// Minimum share of boundary points on the fitted ellipse.
    pub min_inlier_ratio: f64,
    /// Maximum major/minor axis ratio (perspective foreshortening).
    pub max_aspect_ratio: f64,
    /// Added to both fitted semi-axes; contour points sit on pixel centers
    /// half a pixel inside the true edge.
    pub edge_offset_px: f64,
    /// Fallback: the reference is assumed to span this fraction of the
    /// shorter image side.
    pub fallback_span_fraction: f64,
    /// Robust fitting controls.
    pub ransac: RansacConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            min_contrast: 24.0,
            min_boundary_points: 24,
            max_boundary_points: 720,
            min_diameter_fraction: 0.2,
            min_inlier_ratio: 0.6,
            max_aspect_ratio: 2.5,
            edge_offset_px: 0.5,
            fallback_span_fraction: 0.9,
            ransac: RansacConfig::default(),
        }
    }
}

/// Scale factor derived from the reference object.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceCalibration {
    /// `true` when a plausible reference ellipse was found.
    pub detected: bool,
    /// Pixels per centimetre; always > 0.
    pub pixels_per_cm: f64,
    /// Declared reference diameter (cm).
    pub reference_diameter_cm: f64,
    /// Fitted reference ellipse in pixel coordinates, if detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<Ellipse>,
    /// RANSAC inlier ratio of the accepted fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlier_ratio: Option<f64>,
}

impl ReferenceCalibration {
    /// Low-confidence calibration for a `width × height` frame.
    pub fn fallback(
        width: u32,
        height: u32,
        reference_diameter_cm: f64,
        config: &CalibrationConfig,
    ) -> Self {
        let span_px = config.fallback_span_fraction * width.min(height).max(1) as f64;
        Self {
            detected: false,
            pixels_per_cm: span_px / reference_diameter_cm,
            reference_diameter_cm,
            plate: None,
            inlier_ratio: None,
        }
    }

    /// Whether the fallback scale is in use.
    pub fn is_low_confidence(&self) -> bool {
        !self.detected
    }

    /// Convert a pixel length to centimetres.
    pub fn px_to_cm(&self, px: f64) -> f64 {
        px / self.pixels_per_cm
    }

    /// Convert a pixel area to square centimetres.
    pub fn px2_to_cm2(&self, area_px: f64) -> f64 {
        area_px / (self.pixels_per_cm * self.pixels_per_cm)
    }

    /// Convert square centimetres to a pixel area.
    pub fn cm2_to_px2(&self, area_cm2: f64) -> f64 {
        area_cm2 * self.pixels_per_cm * self.pixels_per_cm
    }
}

/// Locate the reference object and derive pixels per centimetre.
///
/// `reference_diameter_cm` must be finite and positive; request validation
/// guarantees this.
pub fn calibrate(
    luma: &GrayImage,
    reference_diameter_cm: f64,
    config: &CalibrationConfig,
) -> ReferenceCalibration {
    let (w, h) = luma.dimensions();
    let fallback = || ReferenceCalibration::fallback(w, h, reference_diameter_cm, config);
    if w < 3 || h < 3 {
        tracing::debug!(w, h, "image too small for reference detection");
        return fallback();
    }

    let smoothed;
    let luma = if config.blur_sigma > 0.0 {
        smoothed = imageproc::filter::gaussian_blur_f32(luma, config.blur_sigma);
        &smoothed
    } else {
        luma
    };

    let mut best: Option<(f64, Ellipse, f64, Polarity)> = None;
    for cand in boundary_candidates(luma, config) {
        let Some(fit) = fit_ellipse_ransac(&cand.points, &config.ransac) else {
            continue;
        };
        let e = fit.ellipse;
        if fit.inlier_ratio < config.min_inlier_ratio
            || e.aspect_ratio() > config.max_aspect_ratio
            || 2.0 * e.a < config.min_diameter_fraction * w.min(h) as f64
            || !(0.0..w as f64).contains(&e.cx)
            || !(0.0..h as f64).contains(&e.cy)
        {
            tracing::trace!(?e, inlier_ratio = fit.inlier_ratio, "reference candidate rejected");
            continue;
        }
        let score = fit.inlier_ratio * e.a;
        if best.as_ref().map_or(true, |b| score > b.0) {
            best = Some((score, e, fit.inlier_ratio, cand.polarity));
        }
    }

    let Some((_, plate, inlier_ratio, polarity)) = best else {
        tracing::debug!("no plausible reference object found");
        return fallback();
    };
    let plate = plate.grown(config.edge_offset_px);
    let pixels_per_cm = 2.0 * plate.a / reference_diameter_cm;
    tracing::debug!(
        ?polarity,
        cx = plate.cx,
        cy = plate.cy,
        a = plate.a,
        b = plate.b,
        inlier_ratio,
        pixels_per_cm,
        "reference object calibrated"
    );
    ReferenceCalibration {
        detected: true,
        pixels_per_cm,
        reference_diameter_cm,
        plate: Some(plate),
        inlier_ratio: Some(inlier_ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PlateScene;
    use image::Luma;

    #[test]
    fn detects_plate_and_derives_scale() {
        let scene = PlateScene::new(320, 240)
            .plate(160.0, 120.0, 100.0)
            .food_ellipse(Ellipse::circle(150.0, 110.0, 25.0), [180, 60, 40]);
        let cal = calibrate(&scene.render_luma(), 24.0, &CalibrationConfig::default());
        assert!(cal.detected);
        let plate = cal.plate.expect("plate ellipse");
        assert!((plate.cx - 160.0).abs() < 1.0);
        assert!((plate.cy - 120.0).abs() < 1.0);
        assert!((plate.a - 100.0).abs() < 1.0, "a = {}", plate.a);
        let expected = 200.0 / 24.0;
        assert!((cal.pixels_per_cm - expected).abs() / expected < 0.01);
    }

    #[test]
    fn detects_foreshortened_plate() {
        let plate = Ellipse {
            cx: 200.0,
            cy: 150.0,
            a: 130.0,
            b: 80.0,
            angle: 0.0,
        };
        let scene = PlateScene::new(400, 300).plate_ellipse(plate);
        let cal = calibrate(&scene.render_luma(), 26.0, &CalibrationConfig::default());
        assert!(cal.detected);
        let fitted = cal.plate.unwrap();
        assert!((fitted.a - 130.0).abs() < 1.5);
        assert!((fitted.b - 80.0).abs() < 1.5);
        assert!((cal.pixels_per_cm - 260.0 / 26.0).abs() < 0.1);
    }

    #[test]
    fn foreshortened_plate_scale_uses_major_axis_at_any_angle() {
        let cfg = CalibrationConfig::default();
        let expected = 2.0 * 180.5 / 24.0;
        for angle in [0.0, 0.2, 0.35, 0.7, 1.0, -0.4, 1.4] {
            let plate = Ellipse {
                cx: 240.0,
                cy: 240.0,
                a: 180.0,
                b: 110.0,
                angle,
            };
            let luma = PlateScene::new(480, 480).plate_ellipse(plate).render_luma();
            let cal = calibrate(&luma, 24.0, &cfg);
            assert!(cal.detected, "angle {angle}");
            let fitted = cal.plate.expect("plate ellipse");
            assert!(fitted.a >= fitted.b, "angle {angle}: a = {}, b = {}", fitted.a, fitted.b);
            assert!((fitted.a - 180.5).abs() < 1.5, "angle {angle}: a = {}", fitted.a);
            assert!((fitted.b - 110.5).abs() < 1.5, "angle {angle}: b = {}", fitted.b);
            assert!(
                (cal.pixels_per_cm - expected).abs() / expected < 0.01,
                "angle {angle}: pixels_per_cm = {}",
                cal.pixels_per_cm
            );
        }
    }

    #[test]
    fn scale_is_linear_in_plate_pixel_diameter() {
        let cfg = CalibrationConfig::default();
        let small = calibrate(
            &PlateScene::new(400, 400)
                .plate(200.0, 200.0, 80.0)
                .render_luma(),
            24.0,
            &cfg,
        );
        let large = calibrate(
            &PlateScene::new(400, 400)
                .plate(200.0, 200.0, 160.0)
                .render_luma(),
            24.0,
            &cfg,
        );
        assert!(small.detected && large.detected);
        let ratio = large.pixels_per_cm / small.pixels_per_cm;
        assert!((ratio - 2.0).abs() < 0.02, "ratio = {ratio}");

        // A fixed 40 px food extent is half as large physically in the second frame.
        let size_ratio = large.px_to_cm(40.0) / small.px_to_cm(40.0);
        assert!((size_ratio - 0.5).abs() < 0.005);
    }

    #[test]
    fn uniform_frame_falls_back() {
        let cfg = CalibrationConfig::default();
        let cal = calibrate(&GrayImage::from_pixel(100, 80, Luma([200])), 24.0, &cfg);
        assert!(cal.is_low_confidence());
        assert!(cal.plate.is_none());
        assert!((cal.pixels_per_cm - 0.9 * 80.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn non_elliptical_blob_is_rejected() {
        // A bright square: large contour, but not an ellipse.
        let luma = GrayImage::from_fn(200, 200, |x, y| {
            let inside = (40..160).contains(&x) && (40..160).contains(&y);
            Luma([if inside { 230 } else { 30 }])
        });
        let cal = calibrate(&luma, 24.0, &CalibrationConfig::default());
        assert!(!cal.detected);
    }

    #[test]
    fn single_pixel_frame_falls_back() {
        let cal = calibrate(
            &GrayImage::from_pixel(1, 1, Luma([255])),
            24.0,
            &CalibrationConfig::default(),
        );
        assert!(!cal.detected);
        assert!(cal.pixels_per_cm > 0.0);
        assert!((cal.pixels_per_cm - 0.9 / 24.0).abs() < 1e-12);
    }
}
