//! Gaze Kit Core - Domain logic and postprocessing components
//!
//! This crate contains the domain types, the inference port, and the two
//! postprocessing components: facial-landmark detection and gaze estimation.
//! Model execution itself is delegated to an [`InferenceEngine`] adapter.

pub mod domain;
pub mod inference;
pub mod modules;
pub mod ports;

pub use domain::{
    BoxOffset, CropBounds, EyeCenters, EyeCrops, GazeVector, HeadPoseAngles, LandmarkSet, Point,
    StageTimings, TimingTotals,
};
pub use domain::{Error, Result};
pub use inference::{bundled_font, OverlayStyle};
pub use modules::{
    extract_eye_crops, GazeConfig, GazeEstimator, GazePrediction, LandmarkConfig,
    LandmarkDetector, LandmarkPrediction, EYE_INPUT_SIZE,
};
pub use ports::{CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor, TensorInfo};
