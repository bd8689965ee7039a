//! Gaze direction and head pose.

// Arrow endpoints saturate at the i32 range; drawing clips them to the frame
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use super::Point;

/// Gaze direction in model-defined units.
///
/// `y` grows upward, unlike image rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeVector {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component (up is positive).
    pub y: f32,
    /// Depth component.
    pub z: f32,
}

impl GazeVector {
    /// Creates a new gaze vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Endpoint of the overlay arrow drawn from `center`.
    ///
    /// The vertical component is negated because image rows grow downward.
    /// Coordinates saturate at the `i32` range.
    #[must_use]
    pub fn arrow_endpoint(&self, center: Point, scale: f32) -> Point {
        Point::new(
            (center.x as f32 + self.x * scale).round() as i32,
            (center.y as f32 - self.y * scale).round() as i32,
        )
    }

    /// Overlay label with one decimal per component.
    #[must_use]
    pub fn label(&self) -> String {
        format!("gaze x= {:.1}, y= {:.1}, z= {:.1}", self.x, self.y, self.z)
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Head orientation in degrees, as produced by a head-pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPoseAngles {
    /// Rotation around the vertical axis.
    pub yaw: f32,
    /// Rotation around the lateral axis.
    pub pitch: f32,
    /// Rotation around the longitudinal axis.
    pub roll: f32,
}

impl HeadPoseAngles {
    /// Creates head pose angles.
    #[must_use]
    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Angles in model input order: yaw, pitch, roll.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.yaw, self.pitch, self.roll]
    }
}
