use super::{Overlay, RenderError};
use ab_glyph::FontArc;
use common_types::ConfidenceGrade;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::debug;

const STROKE: i32 = 2;
const FONT_SCALE: f32 = 16.0;

#[must_use]
pub const fn grade_color(grade: ConfidenceGrade) -> Rgb<u8> {
    match grade {
        ConfidenceGrade::High => Rgb([220, 38, 38]),
        ConfidenceGrade::Medium => Rgb([245, 158, 11]),
        ConfidenceGrade::Low => Rgb([59, 130, 246]),
    }
}

/// Draws overlay boxes onto a copy of the inspected image.
#[derive(Clone, Default)]
pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    #[must_use]
    pub const fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    /// Without a font path, boxes are drawn unlabelled.
    pub fn from_font_file(path: Option<&Path>) -> Result<Self, RenderError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read(path)?;
        let font = FontArc::try_from_vec(data)?;
        Ok(Self::new(Some(font)))
    }

    /// Boxes are placed by their fractions of the decoded image, so the
    /// image sent for analysis and the one annotated need not share a size.
    pub fn annotate(&self, image_bytes: &[u8], overlay: &Overlay) -> Result<RgbImage, RenderError> {
        let mut image = image::load_from_memory(image_bytes)?.to_rgb8();
        let (img_width, img_height) = image.dimensions();

        for b in &overlay.boxes {
            let (x, y, width, height) = b.region.to_pixels(img_width, img_height);
            if width == 0 || height == 0 {
                debug!(label = %b.label, "Box too small to draw");
                continue;
            }
            let color = grade_color(b.grade);
            for t in 0..STROKE {
                let grow = t.unsigned_abs() * 2;
                let rect = Rect::at(x - t, y - t).of_size(width + grow, height + grow);
                draw_hollow_rect_mut(&mut image, rect, color);
            }

            if let Some(font) = &self.font {
                let text = b.title();
                let text_height = FONT_SCALE as i32 + 4;
                let text_y = if y < text_height { y + height as i32 } else { y - text_height };
                let text_width = (text.chars().count() as u32 * 9).max(1);
                draw_filled_rect_mut(
                    &mut image,
                    Rect::at(x, text_y).of_size(text_width, text_height.unsigned_abs()),
                    color,
                );
                draw_text_mut(
                    &mut image,
                    Rgb([255u8, 255, 255]),
                    x + 2,
                    text_y + 2,
                    FONT_SCALE,
                    font,
                    &text,
                );
            }
        }

        Ok(image)
    }

    pub fn write_png(
        &self,
        image_bytes: &[u8],
        overlay: &Overlay,
        output: &Path,
    ) -> Result<(), RenderError> {
        let annotated = self.annotate(image_bytes, overlay)?;
        annotated.save_with_format(output, ImageFormat::Png)?;
        Ok(())
    }
}
