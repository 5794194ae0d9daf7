//! Normalized algebraic conic fitting.
//!
//! Minimizes `Σ (θ · [x², xy, y², x, y, 1])²` subject to `‖θ‖ = 1` on
//! Hartley-normalized points. The minimizer is the eigenvector of the 6×6
//! scatter matrix with the smallest eigenvalue. Five points determine the
//! conic exactly, which makes this usable as a RANSAC minimal solver.

use nalgebra::{Matrix3, Matrix6, Vector6};

use super::types::{ConicCoeffs, Ellipse};

/// Minimal number of points for a conic.
pub const MIN_CONIC_POINTS: usize = 5;

/// Fit a general conic; `None` unless the result is a real ellipse.
pub fn fit_conic(points: &[[f64; 2]]) -> Option<ConicCoeffs> {
    if points.len() < MIN_CONIC_POINTS {
        return None;
    }
    let norm = Normalization::from_points(points)?;

    let mut scatter = Matrix6::<f64>::zeros();
    for &[px, py] in points {
        let [x, y] = norm.apply(px, py);
        let row = Vector6::new(x * x, x * y, y * y, x, y, 1.0);
        scatter += row * row.transpose();
    }

    let eig = scatter.symmetric_eigen();
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let theta = eig.eigenvectors.column(min_idx);
    let normalized = ConicCoeffs([theta[0], theta[1], theta[2], theta[3], theta[4], theta[5]]);

    // Undo normalization: Q = Tᵀ Q' T.
    let t = norm.matrix();
    let q = t.transpose() * normalized.to_matrix() * t;
    let conic = ConicCoeffs::from_matrix(&q).normalized_sign();
    if conic.0.iter().any(|c| !c.is_finite()) || !conic.is_ellipse() {
        return None;
    }
    conic.to_ellipse().map(|_| conic)
}

/// Fit and return geometric ellipse parameters.
pub fn fit_ellipse(points: &[[f64; 2]]) -> Option<Ellipse> {
    fit_conic(points)?.to_ellipse()
}

/// Similarity transform moving the centroid to the origin with mean
/// distance √2.
#[derive(Debug, Clone, Copy)]
struct Normalization {
    mx: f64,
    my: f64,
    scale: f64,
}

impl Normalization {
    fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        let n = points.len() as f64;
        let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
        let my = points.iter().map(|p| p[1]).sum::<f64>() / n;
        let mean_dist = points
            .iter()
            .map(|p| (p[0] - mx).hypot(p[1] - my))
            .sum::<f64>()
            / n;
        if !mean_dist.is_finite() || mean_dist < 1e-12 {
            return None;
        }
        Some(Self {
            mx,
            my,
            scale: std::f64::consts::SQRT_2 / mean_dist,
        })
    }

    #[inline]
    fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [(x - self.mx) * self.scale, (y - self.my) * self.scale]
    }

    fn matrix(&self) -> Matrix3<f64> {
        let s = self.scale;
        Matrix3::new(s, 0.0, -s * self.mx, 0.0, s, -s * self.my, 0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn reference() -> Ellipse {
        Ellipse {
            cx: 310.0,
            cy: 205.0,
            a: 140.0,
            b: 95.0,
            angle: 0.35,
        }
    }

    #[test]
    fn exact_points_recover_parameters() {
        let e = reference();
        let fitted = fit_ellipse(&e.sample_points(40)).expect("fit");
        assert_relative_eq!(fitted.cx, e.cx, epsilon = 1e-6);
        assert_relative_eq!(fitted.cy, e.cy, epsilon = 1e-6);
        assert_relative_eq!(fitted.a, e.a, epsilon = 1e-6);
        assert_relative_eq!(fitted.b, e.b, epsilon = 1e-6);
        assert_relative_eq!(fitted.angle, e.angle, epsilon = 1e-6);
    }

    #[test]
    fn five_points_are_enough() {
        let e = reference();
        let fitted = fit_ellipse(&e.sample_points(5)).expect("fit");
        assert_relative_eq!(fitted.a, e.a, epsilon = 1e-5);
        assert_relative_eq!(fitted.b, e.b, epsilon = 1e-5);
    }

    #[test]
    fn noisy_points_stay_close() {
        let e = reference();
        let mut rng = StdRng::seed_from_u64(7);
        let pts: Vec<[f64; 2]> = e
            .sample_points(400)
            .into_iter()
            .map(|[x, y]| [x + rng.gen_range(-0.5..0.5), y + rng.gen_range(-0.5..0.5)])
            .collect();
        let fitted = fit_ellipse(&pts).expect("fit");
        assert!((fitted.cx - e.cx).abs() < 0.5);
        assert!((fitted.cy - e.cy).abs() < 0.5);
        assert!((fitted.a - e.a).abs() / e.a < 0.01);
        assert!((fitted.b - e.b).abs() / e.b < 0.01);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(fit_conic(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_none());
        assert!(fit_conic(&[[4.0, 4.0]; 8]).is_none());
    }
}
