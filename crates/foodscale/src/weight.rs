//! Volume to weight conversion.

use crate::error::EstimateError;
use crate::pipeline::Stage;

/// Total volume and derived weight.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Weight {
    /// Sum of region volumes (ml).
    pub total_volume_ml: f64,
    /// `total_volume_ml · density` (g).
    pub grams: f64,
}

/// Multiply the summed volumes by `density_g_per_ml`.
///
/// Values are not rounded so that `grams == sum(volumes) · density` holds
/// exactly for the reported numbers.
pub fn convert(volumes_ml: &[f64], density_g_per_ml: f64) -> Result<Weight, EstimateError> {
    let total_volume_ml: f64 = volumes_ml.iter().sum();
    let grams = total_volume_ml * density_g_per_ml;
    if !grams.is_finite() || grams < 0.0 {
        return Err(EstimateError::Computation {
            stage: Stage::Converted,
            quantity: "weight",
        });
    }
    Ok(Weight {
        total_volume_ml,
        grams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weight_is_total_volume_times_density() {
        let w = convert(&[10.0, 2.5, 0.001], 0.6).unwrap();
        assert_relative_eq!(w.total_volume_ml, 12.501, max_relative = 1e-12);
        assert_relative_eq!(w.grams, 12.501 * 0.6, max_relative = 1e-12);
    }

    #[test]
    fn no_regions_weigh_nothing() {
        assert_eq!(convert(&[], 0.8).unwrap().grams, 0.0);
    }

    #[test]
    fn overflow_is_a_computation_error() {
        let err = convert(&[f64::MAX, f64::MAX], 0.5).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::Computation {
                stage: Stage::Converted,
                ..
            }
        ));
    }
}
