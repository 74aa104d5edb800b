use inference_client::{FailureKind, InferenceError};
use serde::Serialize;

/// Why the latest analysis failed. Network and protocol failures look the same
/// to the user; the kind is kept for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&InferenceError> for AnalysisFailure {
    fn from(error: &InferenceError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
