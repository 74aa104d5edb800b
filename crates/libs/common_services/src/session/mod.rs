//! Lifecycle of the image currently on screen.
//!
//! `Idle -> Loaded -> Analyzing -> Resolved | Failed`, re-enterable forever: a new
//! image always goes back to `Loaded`, and analysis can be re-triggered from any
//! state that has an image. Every analysis is stamped with a [`Generation`]; only
//! the response carrying the current generation is committed, anything older is
//! dropped on the floor. Requests are never aborted, only ignored.

mod failure;

pub use failure::*;

use crate::image_source::{LoadedImage, PreviewRegistry, PreviewUrl, SourceImage};
use crate::overlay::{Overlay, ReportView, build_overlay};
use common_types::{AnalysisResult, ImageOrigin};
use inference_client::{ImageUpload, InferenceClient, InferenceResult};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Identifies which analysis request a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the current image is in its lifecycle.
///
/// A session always starts `Loaded`; `Idle` is what the controller reports
/// while no session exists at all.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loaded,
    Analyzing { generation: Generation },
    Resolved(AnalysisResult),
    Failed(AnalysisFailure),
}

static IDLE: SessionState = SessionState::Idle;

impl SessionState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Analyzing { .. } => "analyzing",
            Self::Resolved(_) => "resolved",
            Self::Failed(_) => "failed",
        }
    }
}

/// One image and what is known about it. Replaced wholesale on every new image.
#[derive(Debug)]
pub struct AnalysisSession {
    image: SourceImage,
    preview: PreviewUrl,
    state: SessionState,
}

impl AnalysisSession {
    fn new(loaded: LoadedImage) -> Self {
        Self {
            image: loaded.image,
            preview: loaded.preview,
            state: SessionState::Loaded,
        }
    }

    #[must_use]
    pub const fn image(&self) -> &SourceImage {
        &self.image
    }

    #[must_use]
    pub const fn preview(&self) -> &PreviewUrl {
        &self.preview
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }
}

/// Everything needed to run one analysis away from the controller.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub generation: Generation,
    pub origin: ImageOrigin,
    pub upload: ImageUpload,
}

/// What happened to a response handed back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// The response belonged to a superseded request.
    Discarded,
}

/// Something that can turn image bytes into an analysis result.
pub trait Analyzer {
    fn analyze(
        &self,
        origin: ImageOrigin,
        upload: ImageUpload,
    ) -> impl Future<Output = InferenceResult<AnalysisResult>> + Send;
}

impl Analyzer for InferenceClient {
    fn analyze(
        &self,
        origin: ImageOrigin,
        upload: ImageUpload,
    ) -> impl Future<Output = InferenceResult<AnalysisResult>> + Send {
        self.submit(origin, upload)
    }
}

/// Owns the current [`AnalysisSession`] and the generation counter.
///
/// All mutation goes through `&mut self`, so a single task drives it; network
/// calls happen elsewhere and report back through [`SessionController::complete`].
pub struct SessionController {
    session: Option<AnalysisSession>,
    last_generation: Generation,
    previews: PreviewRegistry,
}

impl SessionController {
    #[must_use]
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            session: None,
            last_generation: Generation::default(),
            previews,
        }
    }

    #[must_use]
    pub const fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AnalysisSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        self.session.as_ref().map_or(&IDLE, |s| &s.state)
    }

    /// Replace the current session with a fresh one for `loaded`.
    ///
    /// The previous session, its preview and any result are dropped, and any
    /// analysis still in flight becomes stale.
    pub fn load_image(&mut self, loaded: LoadedImage) {
        self.last_generation = self.last_generation.next();
        let previous = self.session.replace(AnalysisSession::new(loaded));
        debug!(
            previous = previous.as_ref().map_or("idle", |s| s.state.name()),
            origin = ?self.session.as_ref().map(|s| s.image.origin),
            "Image loaded"
        );
    }

    /// Move to `Analyzing` under a new generation. No-op without an image.
    pub fn begin_analysis(&mut self) -> Option<AnalysisRequest> {
        let Some(session) = self.session.as_mut() else {
            debug!("Analysis requested without an image, ignoring");
            return None;
        };
        let generation = self.last_generation.next();
        self.last_generation = generation;
        session.state = SessionState::Analyzing { generation };
        debug!(%generation, "Analysis started");

        Some(AnalysisRequest {
            generation,
            origin: session.image.origin,
            upload: session.image.to_upload(),
        })
    }

    /// Commit the outcome of the request stamped `generation`, unless it has
    /// been superseded.
    pub fn complete(
        &mut self,
        generation: Generation,
        outcome: InferenceResult<AnalysisResult>,
    ) -> Commit {
        let Some(session) = self.session.as_mut() else {
            return Commit::Discarded;
        };
        if session.state != (SessionState::Analyzing { generation }) {
            debug!(%generation, current = %self.last_generation, "Discarding stale response");
            return Commit::Discarded;
        }

        session.state = match outcome {
            Ok(result) => {
                debug!(%generation, detections = result.detections.len(), "Analysis resolved");
                SessionState::Resolved(result)
            }
            Err(error) => {
                let failure = AnalysisFailure::from(&error);
                warn!(%generation, kind = failure.kind.as_str(), "Analysis failed: {error}");
                SessionState::Failed(failure)
            }
        };
        Commit::Applied
    }

    /// Run one analysis of the current image to completion.
    pub async fn analyze<A: Analyzer>(&mut self, analyzer: &A) -> Option<Commit> {
        let request = self.begin_analysis()?;
        let outcome = analyzer.analyze(request.origin, request.upload).await;
        Some(self.complete(request.generation, outcome))
    }

    /// Overlay for the current result, if the session is resolved.
    #[must_use]
    pub fn overlay(&self) -> Option<Overlay> {
        let session = self.session.as_ref()?;
        let SessionState::Resolved(result) = &session.state else {
            return None;
        };
        let image_src = self.image_src(session);
        Some(build_overlay(&image_src, result))
    }

    /// Snapshot of what should be on screen right now.
    #[must_use]
    pub fn view(&self) -> ReportView {
        let Some(session) = self.session.as_ref() else {
            return ReportView::Idle;
        };
        let image_src = self.image_src(session);
        match &session.state {
            // A session is never idle; no session is.
            SessionState::Idle | SessionState::Loaded => ReportView::Loaded { image_src },
            SessionState::Analyzing { .. } => ReportView::Analyzing { image_src },
            SessionState::Resolved(result) => ReportView::Resolved(build_overlay(&image_src, result)),
            SessionState::Failed(failure) => ReportView::Failed {
                image_src,
                failure: failure.clone(),
            },
        }
    }

    fn image_src(&self, session: &AnalysisSession) -> String {
        self.previews
            .data_url(&session.preview)
            .unwrap_or_else(|| session.preview.as_string())
    }
}
