//! RANSAC wrapper for outlier-robust ellipse fitting.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::fit::{fit_conic, MIN_CONIC_POINTS};
use super::types::{ConicCoeffs, Ellipse};

/// Configuration for RANSAC ellipse fitting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Maximum number of minimal-sample iterations.
    pub max_iters: usize,
    /// Inlier threshold on the Sampson distance, in pixels.
    pub inlier_threshold: f64,
    /// Minimum number of inliers for a valid model.
    pub min_inliers: usize,
    /// Stop early once this fraction of points are inliers.
    pub early_exit_ratio: f64,
    /// RNG seed; fixed so repeated calls give identical results.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 300,
            inlier_threshold: 1.5,
            min_inliers: 12,
            early_exit_ratio: 0.9,
            seed: 0x5eed_f00d,
        }
    }
}

/// Ellipse fitted on the final inlier set.
#[derive(Debug, Clone)]
pub struct RansacFit {
    /// Refined ellipse.
    pub ellipse: Ellipse,
    /// Points within the inlier threshold of the refined ellipse.
    pub num_inliers: usize,
    /// `num_inliers / points.len()`.
    pub inlier_ratio: f64,
}

/// Fit an ellipse robustly.
///
/// Draws 5-point minimal samples, scores each candidate by its inlier count
/// and refits on the inliers of the best candidate.
pub fn fit_ellipse_ransac(points: &[[f64; 2]], config: &RansacConfig) -> Option<RansacFit> {
    let n = points.len();
    if n < MIN_CONIC_POINTS || n < config.min_inliers {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(ConicCoeffs, usize)> = None;
    let mut sample = [[0.0f64; 2]; MIN_CONIC_POINTS];

    for _ in 0..config.max_iters {
        let picked = rand::seq::index::sample(&mut rng, n, MIN_CONIC_POINTS);
        for (slot, idx) in sample.iter_mut().zip(picked.iter()) {
            *slot = points[idx];
        }
        let Some(conic) = fit_conic(&sample) else {
            continue;
        };
        let count = count_inliers(&conic, points, config.inlier_threshold);
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((conic, count));
            if count as f64 >= config.early_exit_ratio * n as f64 {
                break;
            }
        }
    }

    let (conic, count) = best?;
    if count < config.min_inliers {
        return None;
    }

    let inliers: Vec<[f64; 2]> = points
        .iter()
        .copied()
        .filter(|&[x, y]| conic.sampson_distance(x, y) < config.inlier_threshold)
        .collect();
    let (conic, count) = match fit_conic(&inliers) {
        Some(refit) => {
            let refit_count = count_inliers(&refit, points, config.inlier_threshold);
            if refit_count >= count {
                (refit, refit_count)
            } else {
                (conic, count)
            }
        }
        None => (conic, count),
    };

    Some(RansacFit {
        ellipse: conic.to_ellipse()?,
        num_inliers: count,
        inlier_ratio: count as f64 / n as f64,
    })
}

fn count_inliers(conic: &ConicCoeffs, points: &[[f64; 2]], threshold: f64) -> usize {
    points
        .iter()
        .filter(|&&[x, y]| conic.sampson_distance(x, y) < threshold)
        .count()
}
