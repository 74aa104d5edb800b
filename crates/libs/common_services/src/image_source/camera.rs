//! Live camera capture.
//!
//! A [`Camera`] supplies raw frames on demand. [`LiveCapture`] acquires the feed
//! once, on the first capture, and keeps it for its whole lifetime; every capture
//! trigger snapshots exactly one frame at the feed's native resolution.

use super::{CameraError, LoadedImage, PreviewRegistry, SourceImage};
use bytes::Bytes;
use common_types::ImageOrigin;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub trait Camera {
    /// Open the video feed. Called once per [`LiveCapture`].
    fn acquire(&mut self) -> Result<(), CameraError>;

    /// Grab the current frame at native resolution.
    fn snapshot(&mut self) -> Result<DynamicImage, CameraError>;
}

/// A camera whose capture device keeps writing frames into a spool folder.
/// The newest frame in the folder is the current one.
pub struct SpoolCamera {
    folder: PathBuf,
}

impl SpoolCamera {
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn newest_frame(&self) -> Result<Option<PathBuf>, CameraError> {
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.folder)? {
            let path = entry?.path();
            if !is_frame_file(&path) {
                continue;
            }
            let modified = fs::metadata(&path)?.modified()?;
            if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }
        Ok(newest.map(|(_, p)| p))
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.as_str()))
}

impl Camera for SpoolCamera {
    fn acquire(&mut self) -> Result<(), CameraError> {
        if !self.folder.is_dir() {
            return Err(CameraError::Unavailable(format!(
                "spool folder {} does not exist",
                self.folder.display()
            )));
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<DynamicImage, CameraError> {
        let path = self.newest_frame()?.ok_or(CameraError::NoFrame)?;
        debug!(path = %path.display(), "Reading camera frame");
        Ok(ImageReader::open(&path)?.with_guessed_format()?.decode()?)
    }
}

/// Manual, one-frame-per-trigger capture on top of a [`Camera`].
pub struct LiveCapture<C: Camera> {
    camera: C,
    acquired: bool,
    jpeg_quality: u8,
    frames_captured: u64,
}

impl<C: Camera> LiveCapture<C> {
    #[must_use]
    pub const fn new(camera: C, jpeg_quality: u8) -> Self {
        Self {
            camera,
            acquired: false,
            jpeg_quality,
            frames_captured: 0,
        }
    }

    #[must_use]
    pub const fn is_acquired(&self) -> bool {
        self.acquired
    }

    #[must_use]
    pub const fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    /// Snapshot the current frame and encode it as a JPEG still.
    pub fn capture(&mut self, previews: &PreviewRegistry) -> Result<LoadedImage, CameraError> {
        if !self.acquired {
            self.camera.acquire()?;
            self.acquired = true;
            info!("Camera feed acquired");
        }

        let frame = self.camera.snapshot()?.to_rgb8();
        let (width, height) = frame.dimensions();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality).encode_image(&frame)?;

        self.frames_captured += 1;
        debug!(
            width,
            height,
            size = jpeg.len(),
            frame = self.frames_captured,
            "Captured camera frame"
        );

        let bytes = Bytes::from(jpeg);
        let mime_type = "image/jpeg".to_string();
        let preview = previews.create(bytes.clone(), mime_type.clone());
        Ok(LoadedImage {
            image: SourceImage {
                bytes,
                mime_type,
                file_name: "frame.jpg".to_string(),
                origin: ImageOrigin::Camera,
            },
            preview,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Counts how often the feed gets opened.
    struct CountingCamera {
        acquisitions: usize,
        frame: RgbImage,
    }

    impl Camera for CountingCamera {
        fn acquire(&mut self) -> Result<(), CameraError> {
            self.acquisitions += 1;
            Ok(())
        }

        fn snapshot(&mut self) -> Result<DynamicImage, CameraError> {
            Ok(DynamicImage::ImageRgb8(self.frame.clone()))
        }
    }

    #[test]
    fn test_feed_acquired_once_and_frames_keep_native_size() -> color_eyre::Result<()> {
        let previews = PreviewRegistry::new();
        let mut capture = LiveCapture::new(
            CountingCamera {
                acquisitions: 0,
                frame: RgbImage::from_pixel(64, 48, Rgb([10, 200, 30])),
            },
            90,
        );
        assert!(!capture.is_acquired());

        let first = capture.capture(&previews)?;
        let second = capture.capture(&previews)?;

        assert_eq!(capture.camera.acquisitions, 1);
        assert_eq!(capture.frames_captured(), 2);
        assert_eq!(second.image.origin, ImageOrigin::Camera);
        assert_eq!(second.image.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&first.image.bytes)?;
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
        Ok(())
    }

    #[test]
    fn test_spool_camera_reads_newest_frame() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::new(8, 8).save(dir.path().join("old.png"))?;
        std::thread::sleep(std::time::Duration::from_millis(50));
        RgbImage::new(16, 4).save(dir.path().join("new.png"))?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut camera = SpoolCamera::new(dir.path());
        camera.acquire()?;
        let frame = camera.snapshot()?;

        assert_eq!((frame.width(), frame.height()), (16, 4));
        Ok(())
    }

    #[test]
    fn test_spool_camera_errors() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut missing = SpoolCamera::new(dir.path().join("nope"));
        assert!(matches!(missing.acquire(), Err(CameraError::Unavailable(_))));

        let mut empty = SpoolCamera::new(dir.path());
        empty.acquire()?;
        assert!(matches!(empty.snapshot(), Err(CameraError::NoFrame)));
        Ok(())
    }
}
