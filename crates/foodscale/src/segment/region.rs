//! Food regions and their moment accumulators.

use image::{GrayImage, ImageBuffer, Luma};

use crate::conic::Ellipse;

/// Connected-component label image (0 = background).
pub(crate) type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Axis-aligned pixel bounds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Leftmost column.
    pub x0: u32,
    /// Top row.
    pub y0: u32,
    /// Rightmost column.
    pub x1: u32,
    /// Bottom row.
    pub y1: u32,
}

impl BoundingBox {
    fn point(x: u32, y: u32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    /// Whether pixel `(x, y)` lies within the bounds.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        *self = self.union(&Self::point(x, y));
    }

    /// Euclidean distance between the closest pixel centers of two boxes.
    pub fn gap(&self, other: &Self) -> f64 {
        let dx = other.x0.saturating_sub(self.x1).max(self.x0.saturating_sub(other.x1));
        let dy = other.y0.saturating_sub(self.y1).max(self.y0.saturating_sub(other.y1));
        (dx as f64).hypot(dy as f64)
    }
}

/// Binary silhouette cropped to the region's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    /// Image coordinates of the mask's top-left pixel.
    pub origin: [u32; 2],
    /// 255 for region pixels, 0 elsewhere.
    pub mask: GrayImage,
}

impl RegionMask {
    /// Whether image pixel `(x, y)` belongs to the region.
    /// Whether pixel `(x, y)` lies within the bounds.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let [ox, oy] = self.origin;
        x >= ox
            && y >= oy
            && self
                .mask
                .get_pixel_checked(x - ox, y - oy)
                .is_some_and(|p| p[0] > 0)
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] > 0).count()
    }
}

/// One detected food silhouette.
#[derive(Debug, Clone)]
pub struct FoodRegion {
    /// Pixel count.
    pub area_px: usize,
    /// Pixel bounds.
    pub bbox: BoundingBox,
    /// Pixel-center centroid `[x, y]`.
    pub centroid: [f64; 2],
    /// Equivalent ellipse with the region's first and second moments.
    pub footprint: Ellipse,
    /// Mean colour distance from the background.
    pub mean_contrast: f64,
    /// Silhouette.
    pub mask: RegionMask,
}

/// Moment accumulator for a region under construction.
///
/// Pixels are not stored: a region remembers which component labels it
/// absorbed and materializes its mask only when finalized.
#[derive(Debug, Clone)]
pub(crate) struct RegionBuilder {
    labels: Vec<u32>,
    whole_frame: bool,
    origin: [f64; 2],
    n: u64,
    sx: f64,
    sy: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
    contrast_sum: f64,
    bbox: BoundingBox,
}

impl RegionBuilder {
    /// Start a region for component `label` at its first pixel.
    ///
    /// Moments are taken relative to `origin` to keep sums small.
    pub(crate) fn new(label: u32, origin: [f64; 2], x: u32, y: u32, contrast: f64) -> Self {
        let mut b = Self {
            labels: vec![label],
            whole_frame: false,
            origin,
            n: 0,
            sx: 0.0,
            sy: 0.0,
            sxx: 0.0,
            syy: 0.0,
            sxy: 0.0,
            contrast_sum: 0.0,
            bbox: BoundingBox::point(x, y),
        };
        b.push(x, y, contrast);
        b
    }

    /// Region covering every pixel of a `width × height` frame.
    pub(crate) fn whole_frame(
        width: u32,
        height: u32,
        origin: [f64; 2],
        contrast: impl Fn(u32, u32) -> f64,
    ) -> Self {
        let mut b = Self::new(0, origin, 0, 0, contrast(0, 0));
        b.labels.clear();
        b.whole_frame = true;
        for y in 0..height {
            for x in 0..width {
                if (x, y) != (0, 0) {
                    b.push(x, y, contrast(x, y));
                }
            }
        }
        b
    }

    pub(crate) fn push(&mut self, x: u32, y: u32, contrast: f64) {
        let dx = x as f64 - self.origin[0];
        let dy = y as f64 - self.origin[1];
        self.n += 1;
        self.sx += dx;
        self.sy += dy;
        self.sxx += dx * dx;
        self.syy += dy * dy;
        self.sxy += dx * dy;
        self.contrast_sum += contrast;
        self.bbox.include(x, y);
    }

    /// Merge another region's pixels into this one. Both must share an origin.
    pub(crate) fn absorb(&mut self, other: RegionBuilder) {
        self.labels.extend(other.labels);
        self.whole_frame |= other.whole_frame;
        self.n += other.n;
        self.sx += other.sx;
        self.sy += other.sy;
        self.sxx += other.sxx;
        self.syy += other.syy;
        self.sxy += other.sxy;
        self.contrast_sum += other.contrast_sum;
        self.bbox = self.bbox.union(&other.bbox);
    }

    pub(crate) fn area(&self) -> u64 {
        self.n
    }

    pub(crate) fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub(crate) fn mean_contrast(&self) -> f64 {
        self.contrast_sum / self.n.max(1) as f64
    }

    /// Equivalent ellipse: semi-axes `2·sqrt(λ)` of the covariance, with
    /// `1/12` added per axis for the extent of a unit pixel.
    pub(crate) fn footprint(&self) -> Ellipse {
        let n = self.n.max(1) as f64;
        let (mx, my) = (self.sx / n, self.sy / n);
        let vxx = (self.sxx / n - mx * mx).max(0.0) + 1.0 / 12.0;
        let vyy = (self.syy / n - my * my).max(0.0) + 1.0 / 12.0;
        let vxy = self.sxy / n - mx * my;

        let half_sum = 0.5 * (vxx + vyy);
        let half_diff = 0.5 * (vxx - vyy);
        let root = half_diff.hypot(vxy);
        let l_max = half_sum + root;
        let l_min = (half_sum - root).max(1.0 / 12.0);
        Ellipse {
            cx: mx + self.origin[0],
            cy: my + self.origin[1],
            a: 2.0 * l_max.sqrt(),
            b: 2.0 * l_min.sqrt(),
            angle: 0.5 * (2.0 * vxy).atan2(vxx - vyy),
        }
    }

    /// Materialize the silhouette from the component label image.
    pub(crate) fn finalize(mut self, labels: &LabelImage) -> FoodRegion {
        self.labels.sort_unstable();
        let bbox = self.bbox;
        let mask = GrayImage::from_fn(bbox.width(), bbox.height(), |x, y| {
            let on = self.whole_frame || {
                let label = labels.get_pixel(bbox.x0 + x, bbox.y0 + y)[0];
                label != 0 && self.labels.binary_search(&label).is_ok()
            };
            Luma([if on { 255 } else { 0 }])
        });
        let footprint = self.footprint();
        FoodRegion {
            area_px: self.n as usize,
            bbox,
            centroid: [footprint.cx, footprint.cy],
            footprint,
            mean_contrast: self.mean_contrast(),
            mask: RegionMask {
                origin: [bbox.x0, bbox.y0],
                mask,
            },
        }
    }
}

/// Lazy sequence of food regions, largest first.
///
/// Masks are built as the sequence is consumed; it cannot be restarted.
#[derive(Debug)]
pub struct FoodRegions {
    labels: LabelImage,
    pending: std::vec::IntoIter<RegionBuilder>,
}

impl FoodRegions {
    pub(crate) fn new(labels: LabelImage, ordered: Vec<RegionBuilder>) -> Self {
        Self {
            labels,
            pending: ordered.into_iter(),
        }
    }
}

impl Iterator for FoodRegions {
    type Item = FoodRegion;

    fn next(&mut self) -> Option<FoodRegion> {
        let builder = self.pending.next()?;
        Some(builder.finalize(&self.labels))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl ExactSizeIterator for FoodRegions {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disc_builder(cx: u32, cy: u32, r: f64) -> RegionBuilder {
        let mut b: Option<RegionBuilder> = None;
        let e = Ellipse::circle(cx as f64, cy as f64, r);
        for y in 0..200 {
            for x in 0..200 {
                if e.contains(x as f64, y as f64) {
                    match b.as_mut() {
                        Some(b) => b.push(x, y, 1.0),
                        None => b = Some(RegionBuilder::new(1, [100.0, 100.0], x, y, 1.0)),
                    }
                }
            }
        }
        b.expect("non-empty disc")
    }

    #[test]
    fn footprint_of_disc_matches_radius() {
        let b = disc_builder(90, 110, 40.0);
        let e = b.footprint();
        assert_relative_eq!(e.cx, 90.0, epsilon = 1e-9);
        assert_relative_eq!(e.cy, 110.0, epsilon = 1e-9);
        assert_relative_eq!(e.a, 40.0, max_relative = 0.01);
        assert_relative_eq!(e.b, 40.0, max_relative = 0.01);
        assert_relative_eq!(e.area(), b.area() as f64, max_relative = 0.01);
    }

    #[test]
    fn single_pixel_footprint_is_unit_area() {
        let b = RegionBuilder::new(1, [0.0, 0.0], 5, 7, 3.0);
        let e = b.footprint();
        assert_relative_eq!(e.area(), std::f64::consts::PI / 3.0, epsilon = 1e-12);
        assert_eq!(b.mean_contrast(), 3.0);
    }

    #[test]
    fn absorb_combines_moments_and_bounds() {
        let mut a = RegionBuilder::new(1, [0.0, 0.0], 0, 0, 1.0);
        a.push(1, 0, 1.0);
        let mut b = RegionBuilder::new(2, [0.0, 0.0], 10, 4, 3.0);
        b.push(11, 4, 3.0);
        a.absorb(b);
        assert_eq!(a.area(), 4);
        assert_eq!(
            *a.bbox(),
            BoundingBox {
                x0: 0,
                y0: 0,
                x1: 11,
                y1: 4
            }
        );
        assert_relative_eq!(a.mean_contrast(), 2.0);
        let e = a.footprint();
        assert_relative_eq!(e.cx, 5.5);
        assert_relative_eq!(e.cy, 2.0);
    }

    #[test]
    fn finalize_builds_mask_from_absorbed_labels() {
        let mut labels = LabelImage::new(6, 3);
        labels.put_pixel(1, 1, Luma([1]));
        labels.put_pixel(4, 1, Luma([2]));
        labels.put_pixel(5, 2, Luma([3]));
        let mut a = RegionBuilder::new(1, [0.0, 0.0], 1, 1, 1.0);
        a.absorb(RegionBuilder::new(2, [0.0, 0.0], 4, 1, 1.0));
        let region = a.finalize(&labels);
        assert_eq!(region.area_px, 2);
        assert_eq!(region.mask.count(), 2);
        assert!(region.mask.contains(1, 1));
        assert!(region.mask.contains(4, 1));
        assert!(!region.mask.contains(5, 2));
        assert!(!region.mask.contains(2, 1));
    }

    #[test]
    fn box_gap() {
        let a = BoundingBox {
            x0: 0,
            y0: 0,
            x1: 4,
            y1: 4,
        };
        let b = BoundingBox {
            x0: 7,
            y0: 8,
            x1: 9,
            y1: 9,
        };
        assert_relative_eq!(a.gap(&b), 5.0);
        assert_relative_eq!(b.gap(&a), 5.0);
        assert_eq!(a.gap(&a), 0.0);
        assert!(a.contains(4, 4));
        assert!(!a.contains(5, 0));
    }

    #[test]
    fn regions_iterate_in_order_with_exact_len() {
        let labels = LabelImage::new(4, 4);
        let mut regions = FoodRegions::new(
            labels,
            vec![RegionBuilder::whole_frame(4, 4, [0.0, 0.0], |_, _| 0.0)],
        );
        assert_eq!(regions.len(), 1);
        let r = regions.next().expect("one region");
        assert_eq!(r.area_px, 16);
        assert_eq!(r.mask.count(), 16);
        assert!(regions.next().is_none());
    }
}
