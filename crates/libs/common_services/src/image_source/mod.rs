mod camera;
mod error;
mod preview;

pub use camera::*;
pub use error::*;
pub use preview::*;

use bytes::Bytes;
use common_types::ImageOrigin;
use inference_client::ImageUpload;
use std::path::Path;
use tracing::debug;

/// Raw image as it will be sent to the detector.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub origin: ImageOrigin,
}

impl SourceImage {
    #[must_use]
    pub fn to_upload(&self) -> ImageUpload {
        ImageUpload {
            bytes: self.bytes.clone(),
            mime_type: self.mime_type.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// A source image together with the preview that displays it.
#[derive(Debug)]
pub struct LoadedImage {
    pub image: SourceImage,
    pub preview: PreviewUrl,
}

/// Mime type of an image, sniffed from its content and falling back to the
/// file extension.
#[must_use]
pub fn detect_mime_type(bytes: &[u8], file_name: &str) -> Option<String> {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .or_else(|| mime_guess::from_path(file_name).first().map(|m| m.to_string()))
}

/// Accept picked bytes as an image. Anything that isn't `image/*` is ignored
/// and yields `None`.
#[must_use]
pub fn accept_image(
    bytes: Bytes,
    file_name: &str,
    origin: ImageOrigin,
    previews: &PreviewRegistry,
) -> Option<LoadedImage> {
    let Some(mime_type) = detect_mime_type(&bytes, file_name) else {
        debug!(file_name, "Ignoring pick with unknown type");
        return None;
    };
    if !mime_type.starts_with("image/") {
        debug!(file_name, mime_type, "Ignoring pick that is not an image");
        return None;
    }

    let preview = previews.create(bytes.clone(), mime_type.clone());
    Some(LoadedImage {
        image: SourceImage {
            bytes,
            mime_type,
            file_name: file_name.to_string(),
            origin,
        },
        preview,
    })
}

/// Read a user-picked file. Non-image files yield `Ok(None)`.
pub async fn pick_file(
    path: &Path,
    previews: &PreviewRegistry,
) -> Result<Option<LoadedImage>, ImageSourceError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |f| f.to_string_lossy().to_string());
    Ok(accept_image(
        Bytes::from(bytes),
        &file_name,
        ImageOrigin::Upload,
        previews,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_mime_sniffed_from_content() {
        assert_eq!(
            detect_mime_type(PNG_MAGIC, "board.txt").as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_mime_falls_back_to_extension() {
        assert_eq!(
            detect_mime_type(b"????", "board.jpeg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(detect_mime_type(b"????", "board").as_deref(), None);
    }

    #[test]
    fn test_non_images_are_ignored() {
        let previews = PreviewRegistry::new();
        let picked = accept_image(
            Bytes::from_static(b"%PDF-1.7 not an image"),
            "schematic.pdf",
            ImageOrigin::Upload,
            &previews,
        );
        assert!(picked.is_none());
        assert_eq!(previews.live_count(), 0);
    }

    #[tokio::test]
    async fn test_pick_file() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("board.png");
        tokio::fs::write(&path, PNG_MAGIC).await?;
        let previews = PreviewRegistry::new();

        let loaded = pick_file(&path, &previews).await?.expect("png is accepted");

        assert_eq!(loaded.image.mime_type, "image/png");
        assert_eq!(loaded.image.file_name, "board.png");
        assert_eq!(loaded.image.origin, ImageOrigin::Upload);
        assert_eq!(previews.live_count(), 1);
        Ok(())
    }
}
