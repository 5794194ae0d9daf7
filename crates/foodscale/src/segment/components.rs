//! Connected components of the foreground mask, and fragment merging.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::background::ContrastMap;
use super::region::{LabelImage, RegionBuilder};

/// Label `mask` (8-connected) and accumulate one builder per component,
/// in label order.
pub(crate) fn label_components(
    mask: &GrayImage,
    contrast: &ContrastMap,
    origin: [f64; 2],
) -> (LabelImage, Vec<RegionBuilder>) {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut slots: Vec<Option<RegionBuilder>> = Vec::new();
    for (x, y, l) in labels.enumerate_pixels() {
        let label = l[0];
        if label == 0 {
            continue;
        }
        let idx = label as usize - 1;
        if idx >= slots.len() {
            slots.resize(idx + 1, None);
        }
        let c = contrast.get(x, y);
        match slots[idx].as_mut() {
            Some(b) => b.push(x, y, c),
            None => slots[idx] = Some(RegionBuilder::new(label, origin, x, y, c)),
        }
    }
    (labels, slots.into_iter().flatten().collect())
}

/// Split components at `noise_px`: components at or above it are kept;
/// smaller fragments join the nearest kept region within `merge_gap_px`
/// and are dropped otherwise.
pub(crate) fn merge_fragments(
    components: Vec<RegionBuilder>,
    noise_px: f64,
    merge_gap_px: f64,
) -> Vec<RegionBuilder> {
    let (mut kept, fragments): (Vec<_>, Vec<_>) = components
        .into_iter()
        .partition(|b| b.area() as f64 >= noise_px);

    let mut merged = 0usize;
    let mut dropped = 0usize;
    for frag in fragments {
        let nearest = kept
            .iter()
            .enumerate()
            .map(|(i, k)| (i, k.bbox().gap(frag.bbox())))
            .filter(|&(_, gap)| gap <= merge_gap_px)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match nearest {
            Some((i, _)) => {
                kept[i].absorb(frag);
                merged += 1;
            }
            None => dropped += 1,
        }
    }
    if merged + dropped > 0 {
        tracing::trace!(merged, dropped, "small fragments resolved");
    }
    kept
}
