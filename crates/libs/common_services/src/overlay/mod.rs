//! Turning a resolved analysis into something to look at.
//!
//! [`build_overlay`] produces the view model: boxes positioned in fractions of
//! the image, one confidence bar per detection, and the verdict. The `html`
//! module renders it with percentage offsets so it survives any display size;
//! `annotate` burns the same boxes into a copy of the image.

mod annotate;
mod error;
mod html;
mod mapper;

pub use annotate::*;
pub use error::*;
pub use html::*;
pub use mapper::*;

use crate::session::AnalysisFailure;
use common_types::{AnalysisResult, ConfidenceGrade, MappedBox};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    AllClear,
    FaultsPresent { count: usize },
    /// No detections, but the server still reports the board as faulty,
    /// usually because components are missing.
    Flagged,
}

/// One positioned annotation on top of the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBox {
    pub label: String,
    pub confidence: f64,
    pub grade: ConfidenceGrade,
    /// `0..=100`
    pub percent: f64,
    pub region: MappedBox,
}

impl OverlayBox {
    /// Hover text.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} ({:.1}%)", self.label, self.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBar {
    pub label: String,
    /// `0..=100`
    pub percent: f64,
    pub grade: ConfidenceGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub image_src: String,
    pub verdict: Verdict,
    /// The server's own verdict, which also accounts for missing components.
    pub is_faulty: bool,
    pub boxes: Vec<OverlayBox>,
    pub bars: Vec<ConfidenceBar>,
    pub missing_components: Vec<String>,
    /// Boxes exist but the reported image size made them unmappable.
    pub mapping_degraded: bool,
}

/// What the report shows for each session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ReportView {
    Idle,
    Loaded {
        image_src: String,
    },
    Analyzing {
        image_src: String,
    },
    Resolved(Overlay),
    Failed {
        image_src: String,
        failure: AnalysisFailure,
    },
}

#[must_use]
pub fn build_overlay(image_src: &str, result: &AnalysisResult) -> Overlay {
    let boxes: Vec<OverlayBox> =
        map_detections(&result.detections, result.original_width, result.original_height)
            .into_iter()
            .map(|(d, region)| OverlayBox {
                label: d.label.clone(),
                confidence: d.confidence,
                grade: d.grade(),
                percent: d.confidence_percent(),
                region,
            })
            .collect();

    let bars = result
        .detections
        .iter()
        .map(|d| ConfidenceBar {
            label: d.label.clone(),
            percent: d.confidence_percent(),
            grade: d.grade(),
        })
        .collect();

    let verdict = match result.fault_count() {
        0 if result.is_faulty => Verdict::Flagged,
        0 => Verdict::AllClear,
        count => Verdict::FaultsPresent { count },
    };

    Overlay {
        image_src: image_src.to_string(),
        verdict,
        is_faulty: result.is_faulty,
        mapping_degraded: boxes.is_empty() && result.localized().next().is_some(),
        boxes,
        bars,
        missing_components: result.missing_components.clone(),
    }
}
