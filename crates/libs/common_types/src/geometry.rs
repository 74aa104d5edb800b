use serde::{Deserialize, Serialize};

/// A bounding box as fractions of the original image size, each in `[0, 1]`.
///
/// Positioning with these fractions stays correct whatever size the image
/// ends up being displayed at.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct MappedBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl MappedBox {
    /// Pixel rectangle `(x, y, width, height)` on a surface of the given size.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_pixels(&self, surface_width: u32, surface_height: u32) -> (i32, i32, u32, u32) {
        let sw = f64::from(surface_width);
        let sh = f64::from(surface_height);
        (
            (self.left * sw).round() as i32,
            (self.top * sh).round() as i32,
            (self.width * sw).round() as u32,
            (self.height * sh).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixels_scales_with_surface() {
        let mapped = MappedBox {
            top: 0.25,
            left: 0.5,
            width: 0.1,
            height: 0.5,
        };
        assert_eq!(mapped.to_pixels(200, 100), (100, 25, 20, 50));
        assert_eq!(mapped.to_pixels(2000, 1000), (1000, 250, 200, 500));
    }
}
