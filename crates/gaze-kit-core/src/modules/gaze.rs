//! Gaze estimation postprocessing.
//!
//! Feeds both eye crops and the head pose into the gaze model and draws the
//! resulting direction as an arrow from each eye center.

use std::time::Instant;

use ab_glyph::FontArc;
use image::RgbImage;
use ndarray::arr2;
use tracing::{debug, info, warn};

use crate::domain::{Error, EyeCenters, GazeVector, HeadPoseAngles, Point, Result, StageTimings};
use crate::inference::{bundled_font, draw_gaze, to_nchw_tensor, ChannelOrder, OverlayStyle};
use crate::ports::{CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor};

/// Side length of the square eye inputs.
pub const EYE_INPUT_SIZE: u32 = 60;

const LEFT_EYE_INPUT: &str = "left_eye_image";
const RIGHT_EYE_INPUT: &str = "right_eye_image";
const HEAD_POSE_INPUT: &str = "head_pose_angles";
const GAZE_OUTPUT: &str = "gaze_vector";

/// Configuration for gaze postprocessing.
#[derive(Debug, Clone)]
pub struct GazeConfig {
    /// Arrow length multiplier applied to the gaze vector.
    pub arrow_scale: f32,

    /// Baseline origin of the gaze label.
    pub label_origin: Point,

    /// Font for the gaze label, the bundled DejaVu Sans Mono by default.
    /// `None` turns the label off.
    pub font: Option<FontArc>,

    /// Colors and stroke sizes for the annotation.
    pub style: OverlayStyle,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            arrow_scale: 200.0,
            label_origin: Point::new(50, 80),
            font: bundled_font(),
            style: OverlayStyle::default(),
        }
    }
}

impl GazeConfig {
    /// Sets the arrow scale.
    #[must_use]
    pub const fn with_arrow_scale(mut self, scale: f32) -> Self {
        self.arrow_scale = scale;
        self
    }

    /// Sets the label origin.
    #[must_use]
    pub const fn with_label_origin(mut self, origin: Point) -> Self {
        self.label_origin = origin;
        self
    }

    /// Sets the label font.
    #[must_use]
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Turns the gaze label off.
    #[must_use]
    pub fn without_label(mut self) -> Self {
        self.font = None;
        self
    }

    /// Sets the overlay style.
    #[must_use]
    pub const fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }
}

/// Result of one gaze prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazePrediction {
    /// Estimated gaze direction.
    pub gaze: GazeVector,
    /// Time spent in each stage. Fold into a
    /// [`TimingTotals`](crate::TimingTotals) to accumulate.
    pub timings: StageTimings,
}

/// Gaze estimator over a compiled gaze model.
pub struct GazeEstimator {
    model: Box<dyn CompiledModel>,
    config: GazeConfig,
    output_name: Option<String>,
}

impl std::fmt::Debug for GazeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GazeEstimator")
            .field("config", &self.config)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl GazeEstimator {
    /// Wraps a compiled model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModel`] if one of the eye or head-pose inputs
    /// is missing, or the model declares no outputs.
    pub fn new(model: Box<dyn CompiledModel>, config: GazeConfig) -> Result<Self> {
        for required in [LEFT_EYE_INPUT, RIGHT_EYE_INPUT, HEAD_POSE_INPUT] {
            if !model.inputs().iter().any(|info| info.name == required) {
                return Err(Error::InvalidModel(format!(
                    "gaze model has no input named '{required}'"
                )));
            }
        }

        let outputs = model.outputs();
        if outputs.is_empty() {
            return Err(Error::InvalidModel("gaze model declares no outputs".into()));
        }

        let output_name = if outputs.iter().any(|info| info.name == GAZE_OUTPUT) {
            Some(GAZE_OUTPUT.to_owned())
        } else {
            debug!(
                "Gaze model has no '{}' output, using '{}'",
                GAZE_OUTPUT, outputs[0].name
            );
            None
        };

        if config.font.is_none() {
            warn!("Gaze label disabled, only arrows will be drawn");
        }

        Ok(Self {
            model,
            config,
            output_name,
        })
    }

    /// Loads the gaze model through `engine` and wraps it.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::ModelLoad`] and [`Error::UnsupportedLayers`] from the
    /// engine, and [`Error::InvalidModel`] from [`GazeEstimator::new`].
    pub fn load(
        engine: &dyn InferenceEngine,
        files: &ModelFiles,
        device: &Device,
        config: GazeConfig,
    ) -> Result<Self> {
        info!(
            "Loading gaze model {} on {}",
            files.topology.display(),
            device
        );
        let model = engine.load(files, device)?;
        Self::new(model, config)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GazeConfig {
        &self.config
    }

    /// Estimates gaze from both eye crops and the head pose, then annotates
    /// `frame` with the label and one arrow per eye.
    ///
    /// On error the frame is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if an eye crop is empty
    /// - [`Error::Inference`] if the runtime fails
    /// - [`Error::InvalidOutput`] if the output holds fewer than three values
    ///   or a non-finite one
    pub fn predict(
        &mut self,
        left_eye: &RgbImage,
        right_eye: &RgbImage,
        head_pose: HeadPoseAngles,
        eyes: EyeCenters,
        frame: &mut RgbImage,
    ) -> Result<GazePrediction> {
        let start = Instant::now();
        let left = to_nchw_tensor(left_eye, EYE_INPUT_SIZE, EYE_INPUT_SIZE, ChannelOrder::Bgr)?;
        let right = to_nchw_tensor(right_eye, EYE_INPUT_SIZE, EYE_INPUT_SIZE, ChannelOrder::Bgr)?;
        let pose = arr2(&[head_pose.to_array()]).into_dyn();
        let preprocess = start.elapsed();

        let start = Instant::now();
        let outputs = self.model.infer(vec![
            NamedTensor::new(LEFT_EYE_INPUT, left),
            NamedTensor::new(RIGHT_EYE_INPUT, right),
            NamedTensor::new(HEAD_POSE_INPUT, pose),
        ])?;
        let inference = start.elapsed();

        let start = Instant::now();
        let gaze = self.decode(outputs)?;
        draw_gaze(
            frame,
            &gaze,
            &eyes,
            self.config.arrow_scale,
            self.config.font.as_ref(),
            self.config.label_origin,
            &self.config.style,
        );
        let postprocess = start.elapsed();

        let timings = StageTimings {
            preprocess,
            inference,
            postprocess,
        };
        debug!(
            "Gaze ({:.3}, {:.3}, {:.3}) in {:?}",
            gaze.x,
            gaze.y,
            gaze.z,
            timings.total()
        );

        Ok(GazePrediction { gaze, timings })
    }

    fn decode(&self, mut outputs: Vec<NamedTensor>) -> Result<GazeVector> {
        let index = self
            .output_name
            .as_deref()
            .and_then(|name| outputs.iter().position(|t| t.name == name))
            .unwrap_or(0);
        if index >= outputs.len() {
            return Err(Error::InvalidOutput("gaze model returned no outputs".into()));
        }

        let output = outputs.swap_remove(index);
        let values: Vec<f32> = output.data.iter().copied().take(3).collect();
        match values.as_slice() {
            &[x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => {
                Ok(GazeVector::new(x, y, z))
            }
            &[x, y, z] => Err(Error::InvalidOutput(format!(
                "gaze output '{}' is not finite: ({x}, {y}, {z})",
                output.name
            ))),
            _ => Err(Error::InvalidOutput(format!(
                "gaze output '{}' has {} values, expected 3",
                output.name,
                output.data.len()
            ))),
        }
    }
}
