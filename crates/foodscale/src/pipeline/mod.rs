//! Estimation orchestrator.
//!
//! Wires the stages together for one request:
//! calibration -> segmentation -> per-region volume -> weight -> result.
//!
//! Algorithmic primitives live in `crate::calibration`, `crate::segment`,
//! `crate::volume`, `crate::catalog` and `crate::weight`. This layer owns the
//! stage order, the fallback bookkeeping and the result record.

mod result;
mod run;

pub use result::{EstimateStatus, EstimationResult, Fallback, RegionSummary};
pub use run::estimate;

use std::fmt;

/// Per-request stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Image decoded and parameters validated.
    Decoded,
    /// Scale factor known (detected or fallback).
    Calibrated,
    /// At least one food region available.
    Segmented,
    /// One volume per region.
    Estimated,
    /// Weight derived from total volume.
    Converted,
    /// Result record built.
    Assembled,
}

impl Stage {
    /// Snake-case stage name, as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decoded => "decoded",
            Self::Calibrated => "calibrated",
            Self::Segmented => "segmented",
            Self::Estimated => "estimated",
            Self::Converted => "converted",
            Self::Assembled => "assembled",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
