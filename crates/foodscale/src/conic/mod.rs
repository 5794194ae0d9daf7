//! Ellipse / conic primitives.
//!
//! Implements:
//! - Conversion between general conic coefficients and geometric ellipse parameters.
//! - Normalized algebraic least-squares conic fit (5-point minimal solver).
//! - Sampson-distance residuals and a RANSAC wrapper for outlier-robust fitting.

mod fit;
mod ransac;
mod types;

pub use fit::{fit_conic, fit_ellipse, MIN_CONIC_POINTS};
pub use ransac::{fit_ellipse_ransac, RansacConfig, RansacFit};
pub use types::{ConicCoeffs, Ellipse};
