//! Transport-agnostic request shape and its validated form.

use crate::catalog::DEFAULT_FOOD;
use crate::error::InputError;
use crate::raster::FoodImage;

/// Encoded image as it arrives from a caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ImagePayload {
    /// Base64 text of an encoded image file.
    Base64(String),
    /// Raw bytes of an encoded image file as a JSON number array.
    ///
    /// Signed values are accepted and reinterpreted as two's-complement bytes.
    Bytes(Vec<i64>),
}

impl ImagePayload {
    /// Decode the payload into a raster.
    pub fn decode(&self) -> Result<FoodImage, InputError> {
        match self {
            Self::Base64(text) => FoodImage::decode_base64(text),
            Self::Bytes(values) => {
                let bytes = values
                    .iter()
                    .map(|&v| {
                        if (-128..=255).contains(&v) {
                            Ok(v as u8)
                        } else {
                            Err(InputError::InvalidByteArray(v))
                        }
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                FoodImage::decode(&bytes)
            }
        }
    }
}

/// Wire request: `{ img, food_type?, plate_diameter? }`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EstimateRequest {
    /// Encoded image.
    #[serde(default)]
    pub img: Option<ImagePayload>,
    /// Claimed food type; `"default"` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,
    /// Reference diameter in centimetres; the configured standard plate when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_diameter: Option<f64>,
}

impl EstimateRequest {
    /// Parse a JSON request body.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode the image and validate scalar parameters.
    pub fn into_parts(
        self,
        default_plate_diameter_cm: f64,
    ) -> Result<(FoodImage, EstimateParams), InputError> {
        let params = EstimateParams::new(
            self.food_type,
            self.plate_diameter.unwrap_or(default_plate_diameter_cm),
        )?;
        let image = self.img.as_ref().ok_or(InputError::MissingImage)?.decode()?;
        Ok((image, params))
    }
}

/// Validated scalar parameters of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateParams {
    /// Claimed food type as supplied by the caller.
    pub food_type: String,
    /// Physical diameter of the reference object in centimetres.
    pub plate_diameter_cm: f64,
}

impl EstimateParams {
    /// Validate a food type and reference diameter.
    pub fn new(food_type: Option<String>, plate_diameter_cm: f64) -> Result<Self, InputError> {
        if !plate_diameter_cm.is_finite() || plate_diameter_cm <= 0.0 {
            return Err(InputError::InvalidDiameter(plate_diameter_cm));
        }
        Ok(Self {
            food_type: food_type.unwrap_or_else(|| DEFAULT_FOOD.to_string()),
            plate_diameter_cm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_png;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_bytes() -> Vec<u8> {
        encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
            4,
            3,
            Rgb([255, 0, 0]),
        )))
    }

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let (image, params) = EstimateRequest {
            img: Some(ImagePayload::Bytes(
                png_bytes().into_iter().map(i64::from).collect(),
            )),
            ..Default::default()
        }
        .into_parts(24.0)
        .unwrap();
        assert_eq!(image.shape(), [3, 4, 3]);
        assert_eq!(params.food_type, "default");
        assert_eq!(params.plate_diameter_cm, 24.0);
    }

    #[test]
    fn signed_byte_values_are_reinterpreted() {
        let signed: Vec<i64> = png_bytes().into_iter().map(|b| b as i8 as i64).collect();
        assert!(signed.iter().any(|&v| v < 0));
        let img = ImagePayload::Bytes(signed).decode().unwrap();
        assert_eq!(img.shape(), [3, 4, 3]);

        assert_eq!(
            ImagePayload::Bytes(vec![137, 300]).decode().unwrap_err(),
            InputError::InvalidByteArray(300)
        );
    }

    #[test]
    fn json_request_parses_both_payload_forms() {
        let req = EstimateRequest::from_json(
            r#"{"img": "aGVsbG8=", "food_type": "Apple", "plate_diameter": 26.5}"#,
        )
        .unwrap();
        assert_eq!(req.img, Some(ImagePayload::Base64("aGVsbG8=".to_string())));
        assert_eq!(req.food_type.as_deref(), Some("Apple"));
        assert_eq!(req.plate_diameter, Some(26.5));

        let req = EstimateRequest::from_json(r#"{"img": [1, 2, -3]}"#).unwrap();
        assert_eq!(req.img, Some(ImagePayload::Bytes(vec![1, 2, -3])));
    }

    #[test]
    fn invalid_parameters_are_input_errors() {
        assert_eq!(
            EstimateRequest::default().into_parts(24.0).unwrap_err(),
            InputError::MissingImage
        );
        for d in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                EstimateParams::new(None, d),
                Err(InputError::InvalidDiameter(_))
            ));
        }
        // "hello" is valid base64 but not an image.
        let req = EstimateRequest::from_json(r#"{"img": "aGVsbG8="}"#).unwrap();
        assert!(matches!(
            req.into_parts(24.0),
            Err(InputError::Undecodable(_))
        ));
    }
}
