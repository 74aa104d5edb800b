use app_state::ReportSettings;
use color_eyre::Result;
use common_services::overlay::{Annotator, Overlay, ReportView, render_report};
use common_services::session::SessionController;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const HTML_FILE: &str = "report.html";
const JSON_FILE: &str = "report.json";
const ANNOTATED_FILE: &str = "annotated.png";

/// Writes what the session currently shows into the output folder.
pub struct Reporter {
    output_folder: PathBuf,
    annotator: Option<Annotator>,
}

impl Reporter {
    pub fn new(settings: &ReportSettings) -> Result<Self> {
        fs::create_dir_all(&settings.output_folder)?;
        let annotator = if settings.annotate_image {
            Some(Annotator::from_font_file(settings.font_path.as_deref())?)
        } else {
            None
        };
        Ok(Self {
            output_folder: settings.output_folder.clone(),
            annotator,
        })
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Writes the HTML report, plus the annotated image once resolved.
    ///
    /// Outputs that would no longer match the view are removed: the annotated
    /// image unless it was just redrawn, and any JSON from an earlier call.
    pub fn write(&self, controller: &SessionController) -> Result<PathBuf> {
        let view = controller.view();
        let html_path = self.output_folder.join(HTML_FILE);
        fs::write(&html_path, render_report(&view)?)?;
        remove_stale(&self.output_folder.join(JSON_FILE))?;

        let mut annotated = false;
        if let ReportView::Resolved(overlay) = &view {
            info!(
                detections = overlay.bars.len(),
                is_faulty = overlay.is_faulty,
                missing = overlay.missing_components.len(),
                "Analysis resolved"
            );
            annotated = self.annotate(controller, overlay);
        }
        if !annotated {
            remove_stale(&self.output_folder.join(ANNOTATED_FILE))?;
        }

        debug!(path = %html_path.display(), state = controller.state().name(), "Report written");
        Ok(html_path)
    }

    /// Best effort; the HTML report stands on its own.
    fn annotate(&self, controller: &SessionController, overlay: &Overlay) -> bool {
        let (Some(annotator), Some(session)) = (&self.annotator, controller.session()) else {
            return false;
        };
        let png_path = self.output_folder.join(ANNOTATED_FILE);
        match annotator.write_png(&session.image().bytes, overlay, &png_path) {
            Ok(()) => {
                debug!(path = %png_path.display(), "Annotated image written");
                true
            }
            Err(error) => {
                warn!(
                    mime_type = %session.image().mime_type,
                    "Skipping annotated image: {error}"
                );
                false
            }
        }
    }

    pub fn write_json(&self, controller: &SessionController) -> Result<PathBuf> {
        let json_path = self.output_folder.join(JSON_FILE);
        fs::write(&json_path, serde_json::to_string_pretty(&controller.view())?)?;
        Ok(json_path)
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
