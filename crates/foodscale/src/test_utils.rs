//! Shared test utilities: synthetic plate photographs.

use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use crate::conic::Ellipse;
use crate::raster::FoodImage;

pub(crate) const TABLE_RGB: [u8; 3] = [40, 40, 40];
pub(crate) const PLATE_RGB: [u8; 3] = [235, 235, 235];

/// Builder for a flat-shaded scene: table, optional plate, food ellipses.
///
/// A pixel belongs to a shape when its center lies inside the ellipse.
/// Later shapes paint over earlier ones.
#[derive(Debug, Clone)]
pub(crate) struct PlateScene {
    width: u32,
    height: u32,
    table: [u8; 3],
    plate: Option<(Ellipse, [u8; 3])>,
    foods: Vec<(Ellipse, [u8; 3])>,
}

impl PlateScene {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            table: TABLE_RGB,
            plate: None,
            foods: Vec::new(),
        }
    }

    /// Circular white plate.
    pub(crate) fn plate(self, cx: f64, cy: f64, r: f64) -> Self {
        self.plate_ellipse(Ellipse::circle(cx, cy, r))
    }

    /// White plate seen under foreshortening.
    pub(crate) fn plate_ellipse(mut self, e: Ellipse) -> Self {
        self.plate = Some((e, PLATE_RGB));
        self
    }

    pub(crate) fn food_ellipse(mut self, e: Ellipse, rgb: [u8; 3]) -> Self {
        self.foods.push((e, rgb));
        self
    }

    pub(crate) fn render_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let (px, py) = (x as f64, y as f64);
            let mut color = self.table;
            if let Some((e, c)) = &self.plate {
                if e.contains(px, py) {
                    color = *c;
                }
            }
            for (e, c) in &self.foods {
                if e.contains(px, py) {
                    color = *c;
                }
            }
            Rgb(color)
        })
    }

    pub(crate) fn render_luma(&self) -> GrayImage {
        DynamicImage::ImageRgb8(self.render_rgb()).to_luma8()
    }

    pub(crate) fn image(&self) -> FoodImage {
        FoodImage::from(self.render_rgb())
    }

    pub(crate) fn png(&self) -> Vec<u8> {
        encode_png(&DynamicImage::ImageRgb8(self.render_rgb()))
    }
}

/// Encode an image as PNG bytes.
pub(crate) fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("png encode");
    buf.into_inner()
}

/// Number of pixel centers inside `e`.
pub(crate) fn pixel_count(e: &Ellipse, width: u32, height: u32) -> usize {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| e.contains(x as f64, y as f64))
        .count()
}
