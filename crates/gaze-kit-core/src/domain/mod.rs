//! Core domain types for landmark and gaze postprocessing.

mod error;
mod gaze;
mod geometry;
mod landmarks;
mod timing;

pub use error::{Error, Result};
pub use gaze::{GazeVector, HeadPoseAngles};
pub use geometry::{BoxOffset, CropBounds, Point};
pub use landmarks::{EyeCenters, EyeCrops, LandmarkSet, LANDMARK_COUNT};
pub use timing::{StageTimings, TimingTotals};
