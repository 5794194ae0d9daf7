//! Conic and ellipse representations.

use nalgebra::{Matrix2, Matrix3};
use serde::{Deserialize, Serialize};

/// General conic `A x² + B xy + C y² + D x + E y + F = 0`, stored as `[A, B, C, D, E, F]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// Geometric ellipse in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Semi-major axis.
    pub a: f64,
    /// Semi-minor axis.
    pub b: f64,
    /// Major-axis direction from +x, radians in (−π/2, π/2].
    pub angle: f64,
}

impl ConicCoeffs {
    /// Symmetric 3×3 matrix `Q` with `[x y 1] Q [x y 1]ᵀ = 0`.
    pub fn to_matrix(self) -> Matrix3<f64> {
        let [a, b, c, d, e, f] = self.0;
        Matrix3::new(
            a,
            0.5 * b,
            0.5 * d,
            0.5 * b,
            c,
            0.5 * e,
            0.5 * d,
            0.5 * e,
            f,
        )
    }

    /// Inverse of [`ConicCoeffs::to_matrix`].
    pub fn from_matrix(q: &Matrix3<f64>) -> Self {
        Self([
            q[(0, 0)],
            q[(0, 1)] + q[(1, 0)],
            q[(1, 1)],
            q[(0, 2)] + q[(2, 0)],
            q[(1, 2)] + q[(2, 1)],
            q[(2, 2)],
        ])
    }

    /// Algebraic residual of `(x, y)`.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// First-order geometric distance of `(x, y)` to the curve, in pixels.
    pub fn sampson_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, _] = self.0;
        let gx = 2.0 * a * x + b * y + d;
        let gy = b * x + 2.0 * c * y + e;
        let grad_sq = gx * gx + gy * gy;
        let alg = self.algebraic_distance(x, y).abs();
        if grad_sq < 1e-30 {
            alg
        } else {
            alg / grad_sq.sqrt()
        }
    }

    /// `true` when the quadratic part is definite (`B² − 4AC < 0`).
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// Same curve with a positive-definite quadratic part.
    ///
    /// Conic coefficients are defined up to scale, so a fit may return the
    /// negated form.
    pub fn normalized_sign(self) -> Self {
        let [a, _, c, ..] = self.0;
        if a + c < 0.0 {
            Self(self.0.map(|v| -v))
        } else {
            self
        }
    }

    /// Geometric parameters, or `None` for non-ellipses and empty/degenerate conics.
    ///
    /// `a` is always the semi-major axis, whatever the sign of the coefficients.
    pub fn to_ellipse(self) -> Option<Ellipse> {
        if !self.is_ellipse() {
            return None;
        }
        let [a, b, c, d, e, f] = self.normalized_sign().0;
        let quad = Matrix2::new(a, 0.5 * b, 0.5 * b, c);
        let center = quad.try_inverse()? * nalgebra::Vector2::new(-0.5 * d, -0.5 * e);
        let (cx, cy) = (center.x, center.y);
        // Value of the conic at its center.
        let f0 = f + 0.5 * (d * cx + e * cy);

        let eig = quad.symmetric_eigen();
        let (lo, hi) = if eig.eigenvalues[0] <= eig.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };
        let a_sq = -f0 / eig.eigenvalues[lo];
        let b_sq = -f0 / eig.eigenvalues[hi];
        if !(a_sq > 0.0 && b_sq > 0.0) {
            return None;
        }
        let major_dir = eig.eigenvectors.column(lo);
        let ellipse = Ellipse {
            cx,
            cy,
            a: a_sq.sqrt(),
            b: b_sq.sqrt(),
            angle: normalize_angle(major_dir[1].atan2(major_dir[0])),
        };
        ellipse.is_valid().then_some(ellipse)
    }
}

impl Ellipse {
    /// Circle of radius `r` centered at `(cx, cy)`.
    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self {
            cx,
            cy,
            a: r,
            b: r,
            angle: 0.0,
        }
    }

    /// Finite parameters and positive semi-axes.
    pub fn is_valid(&self) -> bool {
        [self.cx, self.cy, self.a, self.b, self.angle]
            .iter()
            .all(|v| v.is_finite())
            && self.a > 0.0
            && self.b > 0.0
    }

    /// Ratio of the longer to the shorter semi-axis.
    pub fn aspect_ratio(&self) -> f64 {
        self.a.max(self.b) / self.a.min(self.b)
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.a * self.b
    }

    /// Same center and orientation, semi-axes multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            b: self.b * factor,
            ..*self
        }
    }

    /// Semi-axes grown by `delta` (may be negative).
    pub fn grown(&self, delta: f64) -> Self {
        Self {
            a: self.a + delta,
            b: self.b + delta,
            ..*self
        }
    }

    /// Whether `(x, y)` lies inside or on the boundary.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (s, c) = self.angle.sin_cos();
        let dx = x - self.cx;
        let dy = y - self.cy;
        let u = (c * dx + s * dy) / self.a;
        let v = (-s * dx + c * dy) / self.b;
        u * u + v * v <= 1.0
    }

    /// Implicit form.
    pub fn to_conic(self) -> ConicCoeffs {
        let (s, c) = self.angle.sin_cos();
        let ia = 1.0 / (self.a * self.a);
        let ib = 1.0 / (self.b * self.b);
        let qa = c * c * ia + s * s * ib;
        let qb = 2.0 * c * s * (ia - ib);
        let qc = s * s * ia + c * c * ib;
        let (x0, y0) = (self.cx, self.cy);
        ConicCoeffs([
            qa,
            qb,
            qc,
            -2.0 * qa * x0 - qb * y0,
            -qb * x0 - 2.0 * qc * y0,
            qa * x0 * x0 + qb * x0 * y0 + qc * y0 * y0 - 1.0,
        ])
    }

    /// `n` evenly spaced boundary points.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let (s, c) = self.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                let (u, v) = (self.a * t.cos(), self.b * t.sin());
                [self.cx + c * u - s * v, self.cy + s * u + c * v]
            })
            .collect()
    }
}

/// Fold an angle into (−π/2, π/2].
pub(crate) fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    let mut t = angle % PI;
    if t > FRAC_PI_2 {
        t -= PI;
    } else if t <= -FRAC_PI_2 {
        t += PI;
    }
    t
}
