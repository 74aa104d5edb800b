use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageSourceError {
    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera feed is not available: {0}")]
    Unavailable(String),
    #[error("No frame has been produced yet")]
    NoFrame,
    #[error("Camera I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode or encode frame: {0}")]
    Image(#[from] image::ImageError),
}
