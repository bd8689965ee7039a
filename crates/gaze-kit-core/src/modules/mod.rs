//! Postprocessing components.
//!
//! Each component owns one compiled model and turns its raw output into
//! pixel coordinates and frame annotations. The components do not depend on
//! each other.

mod gaze;
mod landmarks;

pub use gaze::{GazeConfig, GazeEstimator, GazePrediction, EYE_INPUT_SIZE};
pub use landmarks::{extract_eye_crops, LandmarkConfig, LandmarkDetector, LandmarkPrediction};
