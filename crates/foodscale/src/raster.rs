//! Decoded raster owned by one estimation request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ColorType, DynamicImage, GrayImage, RgbImage};

use crate::error::InputError;

/// A decoded, non-empty image with 1, 3 or 4 channels.
///
/// Processing works on an 8-bit RGB view; the original channel count is kept
/// only for reporting `image_shape`.
#[derive(Debug, Clone)]
pub struct FoodImage {
    rgb: RgbImage,
    channels: u8,
}

impl FoodImage {
    /// Wrap an already decoded image.
    ///
    /// Two-channel (luma + alpha) rasters are reported as four-channel, since
    /// they are widened to RGBA on decode.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, InputError> {
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(InputError::EmptyImage { width, height });
        }
        let channels = match img.color() {
            ColorType::L8 | ColorType::L16 => 1,
            ColorType::La8 | ColorType::La16 => 4,
            c if c.has_alpha() => 4,
            _ => 3,
        };
        Ok(Self {
            rgb: img.to_rgb8(),
            channels,
        })
    }

    /// Decode an encoded image file (PNG, JPEG, ...) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, InputError> {
        if bytes.is_empty() {
            return Err(InputError::Undecodable("no image bytes".to_string()));
        }
        let img =
            image::load_from_memory(bytes).map_err(|e| InputError::Undecodable(e.to_string()))?;
        Self::from_dynamic(img)
    }

    /// Decode a base64 string carrying an encoded image.
    ///
    /// Accepts an optional `data:<mime>;base64,` prefix and ignores ASCII
    /// whitespace inside the payload.
    pub fn decode_base64(text: &str) -> Result<Self, InputError> {
        let payload = match text.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => text,
        };
        let compact: Vec<u8> = payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(&compact)
            .map_err(|e| InputError::InvalidEncoding(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Channel count of the source raster (1, 3 or 4).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// `[height, width, channels]`.
    pub fn shape(&self) -> [u32; 3] {
        [self.height(), self.width(), self.channels as u32]
    }

    /// 8-bit RGB view used by segmentation.
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luma view used by calibration.
    pub fn luma(&self) -> GrayImage {
        DynamicImage::ImageRgb8(self.rgb.clone()).to_luma8()
    }
}

impl From<RgbImage> for FoodImage {
    fn from(rgb: RgbImage) -> Self {
        Self { rgb, channels: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_png;
    use image::{Luma, LumaA, Rgb};

    #[test]
    fn decode_png_reports_shape() {
        let rgb = RgbImage::from_pixel(7, 5, Rgb([10, 20, 30]));
        let img = FoodImage::decode(&encode_png(&DynamicImage::ImageRgb8(rgb))).unwrap();
        assert_eq!(img.shape(), [5, 7, 3]);
        assert_eq!(img.rgb().get_pixel(3, 2), &Rgb([10, 20, 30]));
    }

    #[test]
    fn grayscale_and_alpha_channel_counts() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        assert_eq!(FoodImage::from_dynamic(gray).unwrap().channels(), 1);

        let la = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(2, 2, LumaA([9, 255])));
        assert_eq!(FoodImage::from_dynamic(la).unwrap().channels(), 4);
    }

    #[test]
    fn data_url_prefix_and_whitespace_are_tolerated() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([200, 0, 0]));
        let b64 = STANDARD.encode(encode_png(&DynamicImage::ImageRgb8(rgb)));
        let (head, tail) = b64.split_at(b64.len() / 2);
        let text = format!("data:image/png;base64,{head}\n  {tail}");
        let img = FoodImage::decode_base64(&text).unwrap();
        assert_eq!(img.shape(), [3, 3, 3]);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(matches!(
            FoodImage::decode_base64("invalid_base64!"),
            Err(InputError::InvalidEncoding(_))
        ));
        assert!(matches!(
            FoodImage::decode(b"definitely not an image"),
            Err(InputError::Undecodable(_))
        ));
        assert!(matches!(
            FoodImage::from_dynamic(DynamicImage::new_rgb8(0, 4)),
            Err(InputError::EmptyImage { .. })
        ));
    }
}
