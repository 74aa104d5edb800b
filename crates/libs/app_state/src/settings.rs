use crate::{InferenceSettings, LoggingSettings, RawSettings};
use serde::Deserialize;
use std::path::{PathBuf, absolute};

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub inference: InferenceSettings,
    pub camera: CameraSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraSettings {
    pub spool_folder: PathBuf,
    pub jpeg_quality: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    pub output_folder: PathBuf,
    pub annotate_image: bool,
    pub font_path: Option<PathBuf>,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = color_eyre::Report;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let camera = CameraSettings {
            spool_folder: absolute(&raw.camera.spool_folder)?,
            jpeg_quality: raw.camera.jpeg_quality.clamp(1, 100),
        };
        let report = ReportSettings {
            output_folder: absolute(&raw.report.output_folder)?,
            annotate_image: raw.report.annotate_image,
            font_path: raw.report.font_path.map(absolute).transpose()?,
        };

        Ok(Self {
            inference: raw.inference,
            camera,
            report,
            logging: raw.logging,
        })
    }
}

impl InferenceSettings {
    /// Full url for an endpoint relative to `base_url`.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<url::Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(endpoint.trim_start_matches('/'))
    }
}
