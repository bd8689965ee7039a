//! Image to tensor conversion.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array4, ArrayD};

use crate::domain::{Error, Result};

/// Channel order expected by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red (the order the landmark and gaze models were trained on).
    #[default]
    Bgr,
}

impl ChannelOrder {
    /// Index into an RGB pixel for output channel `c`.
    const fn source_channel(self, c: usize) -> usize {
        match self {
            Self::Rgb => c,
            Self::Bgr => 2 - c,
        }
    }
}

/// Resizes an image and lays it out as a `(1, 3, height, width)` tensor.
///
/// Pixel values stay in `[0, 255]`; the models normalize internally.
/// Resampling is bilinear.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the image or the target size is empty.
pub fn to_nchw_tensor(
    image: &RgbImage,
    width: u32,
    height: u32,
    order: ChannelOrder,
) -> Result<ArrayD<f32>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidInput(format!(
            "cannot preprocess an empty {}x{} image",
            image.width(),
            image.height()
        )));
    }
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "target size {width}x{height} is empty"
        )));
    }

    let resized = if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    };

    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = f32::from(pixel[order.source_channel(c)]);
        }
    }

    Ok(tensor.into_dyn())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_shape_has_batch_and_channels_first() {
        let image = RgbImage::from_pixel(30, 20, Rgb([1, 2, 3]));
        let tensor = to_nchw_tensor(&image, 48, 48, ChannelOrder::Bgr)
            .unwrap_or_else(|e| panic!("preprocess failed: {e}"));

        assert_eq!(tensor.shape(), &[1, 3, 48, 48]);
    }

    #[test]
    fn test_bgr_order_swaps_red_and_blue() {
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let tensor = to_nchw_tensor(&image, 4, 4, ChannelOrder::Bgr)
            .unwrap_or_else(|e| panic!("preprocess failed: {e}"));

        assert!((tensor[[0, 0, 1, 1]] - 30.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 1, 1, 1]] - 20.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 2, 1, 1]] - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rgb_order_keeps_channels() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(1, 0, Rgb([200, 0, 7]));
        let tensor = to_nchw_tensor(&image, 2, 2, ChannelOrder::Rgb)
            .unwrap_or_else(|e| panic!("preprocess failed: {e}"));

        assert!((tensor[[0, 0, 0, 1]] - 200.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 2, 0, 1]] - 7.0).abs() < f32::EPSILON);
        assert!(tensor[[0, 0, 1, 0]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = RgbImage::new(0, 10);
        let result = to_nchw_tensor(&image, 60, 60, ChannelOrder::Bgr);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
