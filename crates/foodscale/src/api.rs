//! High-level estimation API.
//!
//! [`Estimator`] is the primary entry point. It holds an [`EstimateConfig`]
//! and a shared read-only [`FoodCatalog`]; one instance can serve any number
//! of concurrent requests.

use std::path::Path;
use std::sync::Arc;

use crate::catalog::FoodCatalog;
use crate::config::EstimateConfig;
use crate::error::{ConfigError, EstimateError};
use crate::pipeline::{self, EstimationResult};
use crate::raster::FoodImage;
use crate::request::{EstimateParams, EstimateRequest};

/// Primary estimation interface.
///
/// Create once, estimate on many images.
///
/// # Examples
///
/// ```no_run
/// use foodscale::{EstimateParams, Estimator, FoodImage};
///
/// let estimator = Estimator::new();
/// let bytes = std::fs::read("meal.jpg").unwrap();
/// let image = FoodImage::decode(&bytes).unwrap();
/// let params = EstimateParams::new(Some("rice".into()), 26.0).unwrap();
/// let result = estimator.estimate(&image, &params).unwrap();
/// println!("{:.1} g ({:?})", result.weight_grams, result.status);
/// ```
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimateConfig,
    catalog: Arc<FoodCatalog>,
}

/// Liveness report.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HealthReport {
    /// Always `"healthy"` once an estimator exists.
    pub status: String,
    /// Human-readable message.
    pub message: String,
    /// Number of catalog entries loaded.
    pub catalog_entries: usize,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator {
    /// Default configuration with the built-in catalog.
    pub fn new() -> Self {
        Self::with_config(EstimateConfig::default())
    }

    /// Create with full config control and the built-in catalog.
    pub fn with_config(config: EstimateConfig) -> Self {
        Self {
            config,
            catalog: FoodCatalog::builtin(),
        }
    }

    /// Replace the catalog.
    pub fn with_catalog(mut self, catalog: Arc<FoodCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Load configuration JSON and create an estimator in one step.
    pub fn from_config_json_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(EstimateConfig::from_json_file(path)?))
    }

    /// Access the current configuration.
    pub fn config(&self) -> &EstimateConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut EstimateConfig {
        &mut self.config
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &Arc<FoodCatalog> {
        &self.catalog
    }

    /// Estimate volume and weight for a decoded image.
    pub fn estimate(
        &self,
        image: &FoodImage,
        params: &EstimateParams,
    ) -> Result<EstimationResult, EstimateError> {
        pipeline::estimate(image, params, &self.catalog, &self.config)
    }

    /// Validate and decode a wire request, then estimate.
    pub fn estimate_request(
        &self,
        request: EstimateRequest,
    ) -> Result<EstimationResult, EstimateError> {
        let (image, params) = request.into_parts(self.config.default_plate_diameter_cm)?;
        self.estimate(&image, &params)
    }

    /// Decode an encoded image file and estimate.
    pub fn estimate_encoded(
        &self,
        bytes: &[u8],
        food_type: Option<String>,
        plate_diameter_cm: Option<f64>,
    ) -> Result<EstimationResult, EstimateError> {
        let params = EstimateParams::new(
            food_type,
            plate_diameter_cm.unwrap_or(self.config.default_plate_diameter_cm),
        )?;
        let image = FoodImage::decode(bytes)?;
        self.estimate(&image, &params)
    }

    /// Liveness probe.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            message: "food volume estimation is ready".to_string(),
            catalog_entries: self.catalog.len(),
        }
    }
}
