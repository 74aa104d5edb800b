use crate::ConfidenceGrade;
use serde::{Deserialize, Serialize};

/// Rectangle in pixel units of the image the detector saw, top-left origin.
///
/// On the wire this is the array `[x, y, width, height]`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One fault finding returned by the inference service.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Absent when the label applies to the whole image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f64, bbox: Option<BoundingBox>) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    #[must_use]
    pub fn grade(&self) -> ConfidenceGrade {
        ConfidenceGrade::from_confidence(self.confidence)
    }

    /// Confidence as a percentage, clamped to `0..=100`.
    #[must_use]
    pub fn confidence_percent(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        (self.confidence * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_wire_format() -> color_eyre::Result<()> {
        let detection: Detection = serde_json::from_str(
            r#"{"label": "missing-resistor", "confidence": 0.82, "bbox": [100, 50, 40, 40]}"#,
        )?;
        assert_eq!(
            detection.bbox,
            Some(BoundingBox::new(100.0, 50.0, 40.0, 40.0))
        );

        let json = serde_json::to_value(&detection)?;
        assert_eq!(json["bbox"], serde_json::json!([100.0, 50.0, 40.0, 40.0]));
        Ok(())
    }

    #[test]
    fn test_bbox_is_optional() -> color_eyre::Result<()> {
        let detection: Detection =
            serde_json::from_str(r#"{"label": "Cap1", "confidence": 0.4}"#)?;
        assert!(detection.bbox.is_none());
        assert!(
            !serde_json::to_string(&detection)?.contains("bbox"),
            "absent bbox should not be serialized as null"
        );
        Ok(())
    }

    #[test]
    fn test_confidence_percent() {
        assert!((Detection::new("a", 0.82, None).confidence_percent() - 82.0).abs() < 1e-9);
        assert!((Detection::new("a", 1.7, None).confidence_percent() - 100.0).abs() < 1e-9);
        assert!(Detection::new("a", f64::NAN, None).confidence_percent().abs() < 1e-9);
    }
}
