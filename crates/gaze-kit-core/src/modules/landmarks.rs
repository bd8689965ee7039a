//! Facial landmark postprocessing.
//!
//! Runs the landmark model on a face crop, maps the normalized output back
//! into frame coordinates, cuts clamped eye crops and annotates the frame.

use std::time::Instant;

use image::{imageops, RgbImage};
use tracing::{debug, info};

use crate::domain::{
    BoxOffset, CropBounds, EyeCenters, EyeCrops, Error, LandmarkSet, Result, StageTimings,
    LANDMARK_COUNT,
};
use crate::inference::{
    draw_eye_boxes, draw_landmark_markers, to_nchw_tensor, ChannelOrder, OverlayStyle,
};
use crate::ports::{CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor};

/// Configuration for landmark postprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkConfig {
    /// Half-size in pixels of the square window around each eye.
    pub eye_half_size: u32,

    /// Colors and marker sizes for the annotation.
    pub style: OverlayStyle,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            eye_half_size: 25,
            style: OverlayStyle::default(),
        }
    }
}

impl LandmarkConfig {
    /// Sets the eye window half-size.
    #[must_use]
    pub const fn with_eye_half_size(mut self, half_size: u32) -> Self {
        self.eye_half_size = half_size;
        self
    }

    /// Sets the overlay style.
    #[must_use]
    pub const fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }
}

/// Result of one landmark prediction.
#[derive(Debug, Clone)]
pub struct LandmarkPrediction {
    /// Clamped copies of both eye regions, taken before annotation.
    pub eye_crops: EyeCrops,
    /// Eye centers in frame coordinates.
    pub eye_centers: EyeCenters,
    /// All five landmarks in frame coordinates.
    pub landmarks: LandmarkSet,
    /// Time spent in each stage.
    pub timings: StageTimings,
}

/// Facial landmark detector over a compiled landmark model.
pub struct LandmarkDetector {
    model: Box<dyn CompiledModel>,
    config: LandmarkConfig,
    input_name: String,
    input_width: u32,
    input_height: u32,
}

impl std::fmt::Debug for LandmarkDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandmarkDetector")
            .field("config", &self.config)
            .field("input_name", &self.input_name)
            .field("input_width", &self.input_width)
            .field("input_height", &self.input_height)
            .finish_non_exhaustive()
    }
}

impl LandmarkDetector {
    /// Wraps a compiled model.
    ///
    /// The input size is read from the model's first input, which must have a
    /// static `[batch, channels, height, width]` shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModel`] if the model has no usable input or no
    /// output.
    pub fn new(model: Box<dyn CompiledModel>, config: LandmarkConfig) -> Result<Self> {
        let input = model
            .inputs()
            .first()
            .ok_or_else(|| Error::InvalidModel("landmark model declares no inputs".into()))?;

        let (height, width) = input
            .nchw_spatial()
            .and_then(|(h, w)| Some((u32::try_from(h).ok()?, u32::try_from(w).ok()?)))
            .filter(|&(h, w)| h > 0 && w > 0)
            .ok_or_else(|| {
                Error::InvalidModel(format!(
                    "landmark input '{}' has unusable shape {:?}",
                    input.name, input.shape
                ))
            })?;

        if model.outputs().is_empty() {
            return Err(Error::InvalidModel(
                "landmark model declares no outputs".into(),
            ));
        }

        let input_name = input.name.clone();
        debug!(
            "Landmark model input '{}' expects {}x{}",
            input_name, width, height
        );

        Ok(Self {
            model,
            config,
            input_name,
            input_width: width,
            input_height: height,
        })
    }

    /// Loads the landmark model through `engine` and wraps it.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::ModelLoad`] and [`Error::UnsupportedLayers`] from the
    /// engine, and [`Error::InvalidModel`] from [`LandmarkDetector::new`].
    pub fn load(
        engine: &dyn InferenceEngine,
        files: &ModelFiles,
        device: &Device,
        config: LandmarkConfig,
    ) -> Result<Self> {
        info!(
            "Loading landmark model {} on {}",
            files.topology.display(),
            device
        );
        let model = engine.load(files, device)?;
        Self::new(model, config)
    }

    /// Model input size as `(width, height)`.
    #[must_use]
    pub const fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LandmarkConfig {
        &self.config
    }

    /// Detects landmarks on `face` and annotates `frame`.
    ///
    /// `face` is the face crop fed to the model and `offset` its top-left
    /// corner inside `frame`. Eye crops are cut from `frame` before any
    /// drawing. On error the frame is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `face` is empty
    /// - [`Error::Inference`] if the runtime fails
    /// - [`Error::InvalidOutput`] if the output holds fewer than ten values
    pub fn predict(
        &mut self,
        face: &RgbImage,
        offset: BoxOffset,
        frame: &mut RgbImage,
    ) -> Result<LandmarkPrediction> {
        let start = Instant::now();
        let tensor = to_nchw_tensor(
            face,
            self.input_width,
            self.input_height,
            ChannelOrder::Bgr,
        )?;
        let preprocess = start.elapsed();

        let start = Instant::now();
        let outputs = self
            .model
            .infer(vec![NamedTensor::new(self.input_name.clone(), tensor)])?;
        let inference = start.elapsed();

        let start = Instant::now();
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidOutput("landmark model returned no outputs".into()))?;
        let values: Vec<f32> = output.data.iter().copied().take(LANDMARK_COUNT * 2).collect();
        let landmarks =
            LandmarkSet::from_normalized(&values, face.width(), face.height(), offset)?;
        let eye_centers = landmarks.eye_centers();
        let eye_crops = extract_eye_crops(frame, &eye_centers, self.config.eye_half_size);

        draw_eye_boxes(
            frame,
            &eye_centers,
            self.config.eye_half_size,
            self.config.style.landmark_color,
        );
        draw_landmark_markers(frame, &landmarks, &self.config.style);
        let postprocess = start.elapsed();

        let timings = StageTimings {
            preprocess,
            inference,
            postprocess,
        };
        debug!(
            "Landmarks {:?} (eyes {:?}), took {:?}",
            landmarks.flatten(),
            eye_centers.to_array(),
            timings.total()
        );

        Ok(LandmarkPrediction {
            eye_crops,
            eye_centers,
            landmarks,
            timings,
        })
    }
}

/// Copies the clamped square window of half-size `half_size` around each eye.
///
/// A window that falls entirely outside the frame yields an empty image.
#[must_use]
pub fn extract_eye_crops(frame: &RgbImage, eyes: &EyeCenters, half_size: u32) -> EyeCrops {
    let (width, height) = frame.dimensions();
    let crop = |bounds: CropBounds| {
        imageops::crop_imm(frame, bounds.left, bounds.top, bounds.width(), bounds.height())
            .to_image()
    };

    EyeCrops {
        left: crop(CropBounds::around(eyes.left, half_size, width, height)),
        right: crop(CropBounds::around(eyes.right, half_size, width, height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;
    use crate::ports::TensorInfo;
    use image::Rgb;

    struct ShapeOnly {
        inputs: Vec<TensorInfo>,
        outputs: Vec<TensorInfo>,
    }

    impl CompiledModel for ShapeOnly {
        fn inputs(&self) -> &[TensorInfo] {
            &self.inputs
        }

        fn outputs(&self) -> &[TensorInfo] {
            &self.outputs
        }

        fn infer(&mut self, _inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
            Err(Error::Inference("shape-only model".into()))
        }
    }

    fn model(input: TensorInfo) -> Box<dyn CompiledModel> {
        Box::new(ShapeOnly {
            inputs: vec![input],
            outputs: vec![TensorInfo::fixed("95", &[1, 10, 1, 1])],
        })
    }

    #[test]
    fn test_default_config() {
        let config = LandmarkConfig::default();
        assert_eq!(config.eye_half_size, 25);
        assert_eq!(config.with_eye_half_size(12).eye_half_size, 12);
    }

    #[test]
    fn test_input_size_from_model() {
        let detector = LandmarkDetector::new(
            model(TensorInfo::fixed("0", &[1, 3, 48, 64])),
            LandmarkConfig::default(),
        )
        .unwrap_or_else(|e| panic!("detector rejected model: {e}"));

        assert_eq!(detector.input_size(), (64, 48));
    }

    #[test]
    fn test_dynamic_input_rejected() {
        let dynamic = TensorInfo {
            name: "0".into(),
            shape: vec![Some(1), Some(3), None, None],
        };
        let result = LandmarkDetector::new(model(dynamic), LandmarkConfig::default());
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_inference_failure_leaves_frame_untouched() {
        let mut detector = LandmarkDetector::new(
            model(TensorInfo::fixed("0", &[1, 3, 48, 48])),
            LandmarkConfig::default(),
        )
        .unwrap_or_else(|e| panic!("detector rejected model: {e}"));
        let face = RgbImage::from_pixel(20, 20, Rgb([90, 90, 90]));
        let mut frame = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
        let before = frame.clone();

        let result = detector.predict(&face, BoxOffset::new(10, 10), &mut frame);

        assert!(matches!(result, Err(Error::Inference(_))));
        assert_eq!(frame, before);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn test_eye_crops_are_clamped_copies() {
        let frame = RgbImage::from_fn(100, 100, |x, y| Rgb([x as u8, y as u8, 0]));
        let eyes = EyeCenters::new(Point::new(10, 10), Point::new(60, 50));

        let crops = extract_eye_crops(&frame, &eyes, 25);

        assert_eq!(crops.left.dimensions(), (35, 35));
        assert_eq!(*crops.left.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(crops.right.dimensions(), (50, 50));
        assert_eq!(*crops.right.get_pixel(0, 0), Rgb([35, 25, 0]));
    }

    #[test]
    fn test_eye_outside_frame_gives_empty_crop() {
        let frame = RgbImage::new(40, 40);
        let eyes = EyeCenters::new(Point::new(-30, 20), Point::new(20, 20));

        let crops = extract_eye_crops(&frame, &eyes, 25);

        assert_eq!(crops.left.width(), 0);
        assert_eq!(crops.right.dimensions(), (40, 40));
    }
}
