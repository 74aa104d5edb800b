use common_types::{BoundingBox, Detection, MappedBox};

/// Map detection boxes from original-image pixels to fractions of the image.
///
/// Detections without a bbox are skipped. With a zero width or height nothing
/// can be mapped and the result is empty.
#[must_use]
pub fn map_boxes(
    detections: &[Detection],
    original_width: u32,
    original_height: u32,
) -> Vec<MappedBox> {
    map_detections(detections, original_width, original_height)
        .into_iter()
        .map(|(_, mapped)| mapped)
        .collect()
}

/// Like [`map_boxes`], keeping each box paired with its detection.
#[must_use]
pub fn map_detections(
    detections: &[Detection],
    original_width: u32,
    original_height: u32,
) -> Vec<(&Detection, MappedBox)> {
    if original_width == 0 || original_height == 0 {
        return vec![];
    }
    let w = f64::from(original_width);
    let h = f64::from(original_height);

    detections
        .iter()
        .filter_map(|d| d.bbox.map(|b| (d, map_box(b, w, h))))
        .collect()
}

/// Offsets are clamped into `[0, 1]` and sizes so the box ends inside the image.
fn map_box(bbox: BoundingBox, w: f64, h: f64) -> MappedBox {
    let left = unit(bbox.x / w);
    let top = unit(bbox.y / h);
    MappedBox {
        top,
        left,
        width: unit(bbox.width / w).min(1.0 - left),
        height: unit(bbox.height / h).min(1.0 - top),
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
