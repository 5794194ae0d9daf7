//! Closed set of geometric shape models.

use std::f64::consts::PI;

/// Physical footprint of one region, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Footprint {
    /// Silhouette area (cm²).
    pub area_cm2: f64,
    /// Semi-major axis of the equivalent ellipse (cm).
    pub semi_major_cm: f64,
    /// Semi-minor axis of the equivalent ellipse (cm).
    pub semi_minor_cm: f64,
}

/// Volume formula applied to a footprint.
///
/// Heights and thicknesses are typical values per food class; treat them as
/// configuration, not measurements.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ShapeModel {
    /// Rounded solid: ellipsoid with height `height_ratio · b`.
    /// `V = 4/3 · π · a · b · (height_ratio · b)`.
    Ellipsoid { height_ratio: f64 },
    /// Elongated food lying on its side: elliptic cylinder of length `2a`
    /// and cross-section semi-axes `b` and `height_ratio · b`.
    /// `V = π · b · (height_ratio · b) · 2a`.
    Cylinder { height_ratio: f64 },
    /// Loose layer of constant thickness with a packing fill factor.
    /// `V = area · thickness · fill_factor`.
    FlatLayer { thickness_cm: f64, fill_factor: f64 },
    /// Cut portion: extruded silhouette, never thicker than its half-width.
    /// `V = area · min(thickness, b)`.
    Slab { thickness_cm: f64 },
}

impl ShapeModel {
    /// Identifier used in results.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ellipsoid { .. } => "ellipsoid",
            Self::Cylinder { .. } => "cylinder",
            Self::FlatLayer { .. } => "flat_layer",
            Self::Slab { .. } => "slab",
        }
    }

    /// Raw volume in cm³; may be zero for degenerate footprints.
    pub fn volume_cm3(&self, fp: &Footprint) -> f64 {
        let (a, b) = (fp.semi_major_cm, fp.semi_minor_cm);
        match *self {
            Self::Ellipsoid { height_ratio } => 4.0 / 3.0 * PI * a * b * (height_ratio * b),
            Self::Cylinder { height_ratio } => PI * b * (height_ratio * b) * 2.0 * a,
            Self::FlatLayer {
                thickness_cm,
                fill_factor,
            } => fp.area_cm2 * thickness_cm * fill_factor,
            Self::Slab { thickness_cm } => fp.area_cm2 * thickness_cm.min(b),
        }
    }

    /// All parameters finite and positive; fill factor at most 1.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{} {name} must be finite and > 0, got {v}", self.name()))
            }
        };
        match *self {
            Self::Ellipsoid { height_ratio } | Self::Cylinder { height_ratio } => {
                positive("height_ratio", height_ratio)
            }
            Self::FlatLayer {
                thickness_cm,
                fill_factor,
            } => {
                positive("thickness_cm", thickness_cm)?;
                positive("fill_factor", fill_factor)?;
                if fill_factor > 1.0 {
                    return Err(format!("flat_layer fill_factor must be <= 1, got {fill_factor}"));
                }
                Ok(())
            }
            Self::Slab { thickness_cm } => positive("thickness_cm", thickness_cm),
        }
    }
}
