//! foodscale: food volume and weight from a single photograph.
//!
//! A plate (or any reference object of known diameter) in the frame sets the
//! scale. The pipeline stages are:
//!
//! 1. **Calibration** – robust ellipse fit of the reference boundary, giving
//!    pixels per centimetre.
//! 2. **Segmentation** – colour contrast against the plate background,
//!    connected components, fragment merging.
//! 3. **Volume** – a closed-form shape model per food class applied to each
//!    region's calibrated footprint.
//! 4. **Weight** – total volume times the catalog density.
//!
//! Calibration and segmentation never abort a request: when they cannot find
//! what they look for, documented defaults are used and the result is marked
//! `degraded`. Only malformed input is an error.
//!
//! # Public API
//! - [`Estimator`] as the primary entry point
//! - [`EstimateRequest`] / [`EstimationResult`] as the wire shapes
//! - [`EstimateConfig`] and [`FoodCatalog`] for tuning
//!
//! Geometry and image-processing internals are exposed for diagnostics only.

mod api;
pub mod calibration;
mod catalog;
mod config;
pub mod conic;
mod error;
pub mod pipeline;
mod raster;
mod request;
pub mod segment;
mod threshold;
pub mod volume;
mod weight;

#[cfg(test)]
mod test_utils;

pub use api::{Estimator, HealthReport};
pub use calibration::{CalibrationConfig, ReferenceCalibration};
pub use catalog::{FoodCatalog, FoodCatalogEntry, Resolution, DEFAULT_FOOD};
pub use config::{EstimateConfig, DEFAULT_PLATE_DIAMETER_CM};
pub use error::{ConfigError, ErrorResponse, EstimateError, InputError};
pub use pipeline::{EstimateStatus, EstimationResult, Fallback, RegionSummary, Stage};
pub use raster::FoodImage;
pub use request::{EstimateParams, EstimateRequest, ImagePayload};
pub use segment::SegmentationConfig;
pub use volume::{ShapeModel, VolumeConfig};
pub use weight::{convert, Weight};
