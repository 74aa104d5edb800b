use crate::Detection;
use bon::bon;
use serde::{Deserialize, Serialize};

/// The resolved outcome of one analysis request.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisResult {
    pub detections: Vec<Detection>,
    /// Pixel size of the image as the detector saw it. May differ from the
    /// preview's natural size when the server resizes.
    pub original_width: u32,
    pub original_height: u32,
    pub is_faulty: bool,
    pub missing_components: Vec<String>,
}

#[bon]
impl AnalysisResult {
    /// Without an explicit `is_faulty` flag, the result is faulty iff there is
    /// at least one detection.
    #[builder]
    #[must_use]
    pub fn new(
        detections: Vec<Detection>,
        original_width: u32,
        original_height: u32,
        is_faulty: Option<bool>,
        #[builder(default)] missing_components: Vec<String>,
    ) -> Self {
        let is_faulty = is_faulty.unwrap_or(!detections.is_empty());
        Self {
            detections,
            original_width,
            original_height,
            is_faulty,
            missing_components,
        }
    }

    #[must_use]
    pub fn fault_count(&self) -> usize {
        self.detections.len()
    }

    /// Detections that carry a bounding box.
    pub fn localized(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.bbox.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    #[test]
    fn test_is_faulty_derived_from_detections() {
        let empty = AnalysisResult::builder()
            .detections(vec![])
            .original_width(10)
            .original_height(10)
            .build();
        assert!(!empty.is_faulty);

        let one = AnalysisResult::builder()
            .detections(vec![Detection::new("Cap1", 0.9, None)])
            .original_width(10)
            .original_height(10)
            .build();
        assert!(one.is_faulty);
    }

    #[test]
    fn test_explicit_flag_wins() {
        let result = AnalysisResult::builder()
            .detections(vec![])
            .original_width(10)
            .original_height(10)
            .is_faulty(true)
            .missing_components(vec!["MOSFET".to_string()])
            .build();
        assert!(result.is_faulty);
        assert_eq!(result.missing_components, vec!["MOSFET"]);
    }

    #[test]
    fn test_localized_skips_image_level_labels() {
        let result = AnalysisResult::builder()
            .detections(vec![
                Detection::new("whole-board", 0.6, None),
                Detection::new("short", 0.8, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0))),
            ])
            .original_width(10)
            .original_height(10)
            .build();
        let labels: Vec<_> = result.localized().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["short"]);
        assert_eq!(result.fault_count(), 2);
    }
}
