//! Two-class intensity split shared by calibration and segmentation.

use image::GrayImage;
use imageproc::contrast::otsu_level;
use imageproc::stats::histogram;

/// Result of splitting a sample of 8-bit values into two classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassSplit {
    /// Otsu level: values `<= level` form the low class.
    pub otsu_level: u8,
    /// Mean of the low class.
    pub low_mean: f64,
    /// Mean of the high class.
    pub high_mean: f64,
}

impl ClassSplit {
    /// Midpoint between the class means.
    ///
    /// Unlike the raw Otsu level this stays centered on a blurred edge when
    /// the gap between the classes is empty.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.low_mean + self.high_mean)
    }

    /// Distance between the class means.
    pub fn separation(&self) -> f64 {
        self.high_mean - self.low_mean
    }
}

/// Split the pixels of `img` into two classes.
///
/// Returns `None` for images with fewer than two pixels or when either class
/// would be empty (uniform input).
pub fn split_classes(img: &GrayImage) -> Option<ClassSplit> {
    if (img.width() as u64) * (img.height() as u64) < 2 {
        return None;
    }
    let level = otsu_level(img);
    let hist = &histogram(img).channels[0];

    let (mut n_lo, mut s_lo, mut n_hi, mut s_hi) = (0u64, 0u64, 0u64, 0u64);
    for (value, &count) in hist.iter().enumerate() {
        let (count, value) = (count as u64, value as u64);
        if value <= level as u64 {
            n_lo += count;
            s_lo += count * value;
        } else {
            n_hi += count;
            s_hi += count * value;
        }
    }
    if n_lo == 0 || n_hi == 0 {
        return None;
    }
    Some(ClassSplit {
        otsu_level: level,
        low_mean: s_lo as f64 / n_lo as f64,
        high_mean: s_hi as f64 / n_hi as f64,
    })
}

/// Split an arbitrary sample of values (e.g. the pixels inside a mask).
pub fn split_values(values: Vec<u8>) -> Option<ClassSplit> {
    let n = u32::try_from(values.len()).ok()?;
    let strip = GrayImage::from_raw(n, 1, values)?;
    split_classes(&strip)
}
