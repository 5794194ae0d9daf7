//! Food catalog: density and shape model per food type.
//!
//! Catalog JSON follows a versioned schema (`foodscale.catalog.v1`):
//!
//! ```json
//! {
//!   "schema": "foodscale.catalog.v1",
//!   "entries": [
//!     { "name": "default", "density_g_per_ml": 0.8,
//!       "shape": { "model": "flat_layer", "thickness_cm": 2.0, "fill_factor": 0.75 } }
//!   ]
//! }
//! ```
//!
//! A catalog is immutable once built and must contain a `default` entry.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::error::ConfigError;
use crate::volume::ShapeModel;

const CATALOG_SCHEMA_V1: &str = "foodscale.catalog.v1";

/// Name of the fallback entry; also the food type of requests that omit one.
pub const DEFAULT_FOOD: &str = "default";

/// One catalog row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoodCatalogEntry {
    /// Canonical name (matched case-insensitively).
    pub name: String,
    /// Density in g/ml.
    pub density_g_per_ml: f64,
    /// Volume formula for this food class.
    pub shape: ShapeModel,
}

impl FoodCatalogEntry {
    fn new(name: &str, density_g_per_ml: f64, shape: ShapeModel) -> Self {
        Self {
            name: name.to_string(),
            density_g_per_ml,
            shape,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogSpecV1 {
    schema: String,
    entries: Vec<FoodCatalogEntry>,
}

/// Outcome of resolving a requested food type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    /// Value reported as `food_type_match`: the request verbatim on a hit,
    /// `"default"` otherwise.
    pub matched: &'a str,
    /// Entry whose density and shape apply.
    pub entry: &'a FoodCatalogEntry,
    /// `true` when the request did not match any entry.
    pub fallback: bool,
}

/// Read-only food table keyed by lower-cased name.
#[derive(Debug, Clone)]
pub struct FoodCatalog {
    entries: Vec<FoodCatalogEntry>,
    by_name: HashMap<String, usize>,
    default_idx: usize,
}

static BUILTIN: LazyLock<Arc<FoodCatalog>> = LazyLock::new(|| Arc::new(FoodCatalog::builtin_table()));

impl FoodCatalog {
    /// Shared handle to the built-in catalog, constructed on first use.
    pub fn builtin() -> Arc<FoodCatalog> {
        Arc::clone(&BUILTIN)
    }

    fn builtin_table() -> Self {
        use ShapeModel::*;
        let entries = vec![
            FoodCatalogEntry::new("apple", 0.6, Ellipsoid { height_ratio: 0.9 }),
            FoodCatalogEntry::new("banana", 0.5, Cylinder { height_ratio: 1.0 }),
            FoodCatalogEntry::new(
                "rice",
                0.75,
                FlatLayer {
                    thickness_cm: 1.5,
                    fill_factor: 0.8,
                },
            ),
            FoodCatalogEntry::new(
                "pasta",
                0.4,
                FlatLayer {
                    thickness_cm: 2.5,
                    fill_factor: 0.7,
                },
            ),
            FoodCatalogEntry::new(
                "salad",
                0.3,
                FlatLayer {
                    thickness_cm: 4.0,
                    fill_factor: 0.6,
                },
            ),
            FoodCatalogEntry::new("chicken", 1.0, Slab { thickness_cm: 2.0 }),
            FoodCatalogEntry::new(
                DEFAULT_FOOD,
                0.8,
                FlatLayer {
                    thickness_cm: 2.0,
                    fill_factor: 0.75,
                },
            ),
        ];
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.to_lowercase(), i))
            .collect();
        Self {
            default_idx: entries.len() - 1,
            entries,
            by_name,
        }
    }

    /// Build a catalog from entries.
    ///
    /// Names must be unique ignoring case, densities finite and positive,
    /// shape parameters valid, and a `default` entry present.
    pub fn from_entries(entries: Vec<FoodCatalogEntry>) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            let key = e.name.to_lowercase();
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid("catalog entry name must not be empty".into()));
            }
            if !e.density_g_per_ml.is_finite() || e.density_g_per_ml <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "density of '{}' must be finite and > 0",
                    e.name
                )));
            }
            e.shape
                .validate()
                .map_err(|msg| ConfigError::Invalid(format!("shape of '{}': {msg}", e.name)))?;
            if by_name.insert(key, i).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "duplicate catalog entry '{}'",
                    e.name
                )));
            }
        }
        let default_idx = *by_name.get(DEFAULT_FOOD).ok_or_else(|| {
            ConfigError::Invalid(format!("catalog must contain a '{DEFAULT_FOOD}' entry"))
        })?;
        Ok(Self {
            entries,
            by_name,
            default_idx,
        })
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let spec: CatalogSpecV1 = serde_json::from_str(data)?;
        if spec.schema != CATALOG_SCHEMA_V1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported catalog schema '{}' (expected '{}')",
                spec.schema, CATALOG_SCHEMA_V1
            )));
        }
        Self::from_entries(spec.entries)
    }

    /// Serialize in the versioned JSON schema.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&CatalogSpecV1 {
            schema: CATALOG_SCHEMA_V1.to_string(),
            entries: self.entries.clone(),
        })
    }

    /// Case-insensitive exact lookup.
    pub fn get(&self, name: &str) -> Option<&FoodCatalogEntry> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// The fallback entry.
    pub fn default_entry(&self) -> &FoodCatalogEntry {
        &self.entries[self.default_idx]
    }

    /// Resolve a requested food type, falling back to `default`.
    pub fn resolve<'a>(&'a self, requested: &'a str) -> Resolution<'a> {
        match self.get(requested) {
            Some(entry) => Resolution {
                matched: requested,
                entry,
                fallback: false,
            },
            None => Resolution {
                matched: DEFAULT_FOOD,
                entry: self.default_entry(),
                fallback: true,
            },
        }
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[FoodCatalogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for a catalog without entries (never the case once validated).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FoodCatalog {
    fn default() -> Self {
        Self::builtin_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_densities() {
        let cat = FoodCatalog::builtin();
        assert_eq!(cat.len(), 7);
        assert_eq!(cat.get("apple").unwrap().density_g_per_ml, 0.6);
        assert_eq!(cat.get("Banana").unwrap().density_g_per_ml, 0.5);
        assert_eq!(cat.get("RICE").unwrap().density_g_per_ml, 0.75);
        assert_eq!(cat.get("pasta").unwrap().density_g_per_ml, 0.4);
        assert_eq!(cat.get("salad").unwrap().density_g_per_ml, 0.3);
        assert_eq!(cat.get("chicken").unwrap().density_g_per_ml, 1.0);
        assert_eq!(cat.default_entry().density_g_per_ml, 0.8);
        assert!(Arc::ptr_eq(&cat, &FoodCatalog::builtin()));
    }

    #[test]
    fn resolve_echoes_request_on_hit() {
        let cat = FoodCatalog::builtin();
        let r = cat.resolve("ApPlE");
        assert_eq!(r.matched, "ApPlE");
        assert_eq!(r.entry.name, "apple");
        assert!(!r.fallback);
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let cat = FoodCatalog::builtin();
        for requested in ["pizza", "", " apple"] {
            let r = cat.resolve(requested);
            assert_eq!(r.matched, "default");
            assert_eq!(r.entry.name, "default");
            assert!(r.fallback);
        }
        let r = cat.resolve("DEFAULT");
        assert_eq!(r.matched, "DEFAULT");
        assert!(!r.fallback);
    }

    #[test]
    fn json_roundtrip_of_builtin() {
        let json = FoodCatalog::builtin().to_json_pretty().unwrap();
        let back = FoodCatalog::from_json_str(&json).unwrap();
        assert_eq!(back.entries(), FoodCatalog::builtin().entries());
    }

    #[test]
    fn json_requires_v1_schema() {
        let err = FoodCatalog::from_json_str(
            r#"{"schema":"foodscale.catalog.v0","entries":[]}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("unsupported catalog schema"));
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let err = FoodCatalog::from_json_str(
            r#"{"schema":"foodscale.catalog.v1","entries":[
                {"name":"default","density_g_per_ml":0.8,"kcal":52,
                 "shape":{"model":"slab","thickness_cm":1.0}}]}"#,
        );
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn custom_catalog_validation() {
        let slab = ShapeModel::Slab { thickness_cm: 1.0 };
        let no_default = vec![FoodCatalogEntry::new("tofu", 1.0, slab)];
        assert!(FoodCatalog::from_entries(no_default).is_err());

        let dup = vec![
            FoodCatalogEntry::new("default", 1.0, slab),
            FoodCatalogEntry::new("Tofu", 1.0, slab),
            FoodCatalogEntry::new("tofu", 1.0, slab),
        ];
        assert!(FoodCatalog::from_entries(dup).is_err());

        let bad_density = vec![FoodCatalogEntry::new("default", 0.0, slab)];
        assert!(FoodCatalog::from_entries(bad_density).is_err());

        let ok = FoodCatalog::from_entries(vec![
            FoodCatalogEntry::new("Tofu", 1.05, slab),
            FoodCatalogEntry::new("default", 0.9, slab),
        ])
        .unwrap();
        assert_eq!(ok.resolve("tofu").entry.density_g_per_ml, 1.05);
        assert_eq!(ok.default_entry().density_g_per_ml, 0.9);
    }
}
