use crate::{InferenceError, InferenceResult};
use common_types::{AnalysisResult, Detection};
use serde::Deserialize;

#[derive(Deserialize)]
struct PredictResponse {
    results: Vec<Detection>,
    original_width: f64,
    original_height: f64,
    is_faulty: Option<bool>,
    #[serde(default)]
    missing_components: Vec<String>,
}

/// Parse and validate the detector's JSON body.
///
/// `results`, `original_width` and `original_height` are required. Dimensions of
/// zero are let through; they only stop the boxes from being mapped.
pub fn parse_response(body: &[u8]) -> InferenceResult<AnalysisResult> {
    let response: PredictResponse =
        serde_json::from_slice(body).map_err(|e| InferenceError::Protocol(e.to_string()))?;

    let original_width = dimension("original_width", response.original_width)?;
    let original_height = dimension("original_height", response.original_height)?;

    for (i, detection) in response.results.iter().enumerate() {
        if detection.label.trim().is_empty() {
            return Err(InferenceError::Protocol(format!(
                "results[{i}] has an empty label"
            )));
        }
        if !detection.confidence.is_finite() {
            return Err(InferenceError::Protocol(format!(
                "results[{i}] has a non-numeric confidence"
            )));
        }
        if let Some(b) = detection.bbox
            && ![b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite())
        {
            return Err(InferenceError::Protocol(format!(
                "results[{i}] has a non-numeric bbox"
            )));
        }
    }

    Ok(AnalysisResult::builder()
        .detections(response.results)
        .original_width(original_width)
        .original_height(original_height)
        .maybe_is_faulty(response.is_faulty)
        .missing_components(response.missing_components)
        .build())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension(name: &str, value: f64) -> InferenceResult<u32> {
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(InferenceError::Protocol(format!(
            "{name} must be a non-negative pixel count, got {value}"
        )));
    }
    Ok(value.round() as u32)
}
