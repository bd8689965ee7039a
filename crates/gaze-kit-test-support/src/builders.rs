//! Synthetic frame builders for testing.

use image::{Rgb, RgbImage};

/// Builder for synthetic RGB frames and face crops.
pub struct SyntheticFrameBuilder;

impl SyntheticFrameBuilder {
    /// Creates a frame filled with one color.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(rgb))
    }

    /// Creates a black and white checkerboard with 8 pixel cells.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> RgbImage {
        Self::checkerboard_with_cell_size(width, height, 8)
    }

    /// Creates a checkerboard with custom cell size.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> RgbImage {
        let cell = cell_size.max(1);
        RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    /// Creates a frame where red grows with the column and green with the
    /// row, so every pixel reveals its own position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let r = (u32::from(u8::MAX) * x / width.max(1)) as u8;
            let g = (u32::from(u8::MAX) * y / height.max(1)) as u8;
            Rgb([r, g, 128])
        })
    }
}
