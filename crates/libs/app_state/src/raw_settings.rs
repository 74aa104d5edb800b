use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub inference: InferenceSettings,
    pub camera: RawCameraSettings,
    pub report: RawReportSettings,
    pub logging: LoggingSettings,
}

/// Where the fault detector lives and how it wants its images.
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceSettings {
    pub base_url: Url,
    /// Endpoint for uploaded still images, relative to `base_url`.
    pub upload_endpoint: String,
    /// Endpoint for live-captured frames, relative to `base_url`.
    pub frame_endpoint: String,
    /// Multipart field name the image bytes are sent under.
    pub form_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawCameraSettings {
    /// Folder the capture device keeps writing its latest frames into.
    pub spool_folder: PathBuf,
    /// JPEG quality `1..=100` for captured frames.
    pub jpeg_quality: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawReportSettings {
    pub output_folder: PathBuf,
    /// Also write a PNG with the boxes burned into the image.
    pub annotate_image: bool,
    /// TTF font used for labels on the annotated PNG. Boxes only when unset.
    pub font_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}
