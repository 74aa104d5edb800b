use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to load font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
