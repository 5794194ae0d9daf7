//! Background colour model and per-pixel colour contrast.

use image::{GrayImage, Luma, RgbImage};

use crate::conic::Ellipse;
use crate::threshold::split_values;

/// Pixels considered by segmentation: the plate interior when known,
/// otherwise the whole frame.
///
/// With a known plate, the background colour is sampled from a rim band
/// between `band_inner` and the interior boundary, which food rarely covers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnalysisArea {
    interior: Option<Ellipse>,
    band_inner: Option<Ellipse>,
}

impl AnalysisArea {
    /// The whole frame; background sampled everywhere.
    pub(crate) fn frame() -> Self {
        Self {
            interior: None,
            band_inner: None,
        }
    }

    /// Plate interior at `interior_scale`, background band from `band_scale`
    /// outwards (both relative to the plate semi-axes).
    pub(crate) fn plate(plate: &Ellipse, interior_scale: f64, band_scale: f64) -> Self {
        Self {
            interior: Some(plate.scaled(interior_scale)),
            band_inner: Some(plate.scaled(band_scale.min(interior_scale))),
        }
    }

    pub(crate) fn interior(&self) -> Option<Ellipse> {
        self.interior
    }

    pub(crate) fn contains(&self, x: u32, y: u32) -> bool {
        self.interior
            .map_or(true, |e| e.contains(x as f64, y as f64))
    }

    /// Whether `(x, y)` is used to estimate the background colour.
    pub(crate) fn in_background_band(&self, x: u32, y: u32) -> bool {
        self.contains(x, y)
            && self
                .band_inner
                .map_or(true, |e| !e.contains(x as f64, y as f64))
    }
}

const BIN_BITS: u32 = 3;
const BINS_PER_CHANNEL: usize = 1 << BIN_BITS;

fn color_bin(p: [u8; 3]) -> usize {
    let shift = 8 - BIN_BITS;
    let q = |v: u8| (v >> shift) as usize;
    (q(p[0]) * BINS_PER_CHANNEL + q(p[1])) * BINS_PER_CHANNEL + q(p[2])
}

/// Dominant colour of the background band of `area`: the mean of the most
/// populated bin of a coarse RGB histogram. Ties go to the lower bin index.
///
/// Falls back to the whole area when the band holds no pixels.
pub(crate) fn dominant_color(rgb: &RgbImage, area: &AnalysisArea) -> [f64; 3] {
    modal_bin_mean(rgb, |x, y| area.in_background_band(x, y))
        .or_else(|| modal_bin_mean(rgb, |x, y| area.contains(x, y)))
        .unwrap_or([0.0; 3])
}

fn modal_bin_mean(rgb: &RgbImage, include: impl Fn(u32, u32) -> bool) -> Option<[f64; 3]> {
    let nbins = BINS_PER_CHANNEL.pow(3);
    let mut counts = vec![0u64; nbins];
    let mut sums = vec![[0u64; 3]; nbins];
    for (x, y, p) in rgb.enumerate_pixels() {
        if !include(x, y) {
            continue;
        }
        let bin = color_bin(p.0);
        counts[bin] += 1;
        for c in 0..3 {
            sums[bin][c] += p.0[c] as u64;
        }
    }
    let mut best = 0;
    for (i, &n) in counts.iter().enumerate() {
        if n > counts[best] {
            best = i;
        }
    }
    if counts[best] == 0 {
        return None;
    }
    let n = counts[best] as f64;
    Some([
        sums[best][0] as f64 / n,
        sums[best][1] as f64 / n,
        sums[best][2] as f64 / n,
    ])
}

/// Euclidean RGB distance of every pixel from the background colour.
/// Pixels outside the analysis area have zero contrast.
#[derive(Debug, Clone)]
pub(crate) struct ContrastMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl ContrastMap {
    pub(crate) fn new(rgb: &RgbImage, background: [f64; 3], area: &AnalysisArea) -> Self {
        let (width, height) = rgb.dimensions();
        let values = rgb
            .enumerate_pixels()
            .map(|(x, y, p)| {
                if !area.contains(x, y) {
                    return 0.0;
                }
                let d2: f64 = (0..3)
                    .map(|c| {
                        let d = p.0[c] as f64 - background[c];
                        d * d
                    })
                    .sum();
                d2.sqrt() as f32
            })
            .collect();
        Self {
            width,
            height,
            values,
        }
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> f64 {
        self.values[(y as usize) * (self.width as usize) + x as usize] as f64
    }

    /// Foreground cut: the two-class midpoint of in-area contrast, never
    /// below `min_distance`.
    pub(crate) fn threshold(&self, area: &AnalysisArea, min_distance: f64) -> f64 {
        let sample: Vec<u8> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| area.contains(x, y))
            .map(|(x, y)| self.get(x, y).round().min(255.0) as u8)
            .collect();
        split_values(sample).map_or(min_distance, |s| s.midpoint().max(min_distance))
    }

    /// Binary mask of pixels strictly above `threshold`.
    pub(crate) fn mask_above(&self, threshold: f64) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) > threshold { 255 } else { 0 }])
        })
    }
}
