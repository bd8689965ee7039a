//! Facial landmarks and the eye regions derived from them.

// Normalized coordinates times image sizes stay far below i32::MAX
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::{BoxOffset, Error, Point, Result};

/// Number of landmarks emitted by the landmark model.
pub const LANDMARK_COUNT: usize = 5;

/// Five facial landmarks in frame pixel coordinates.
///
/// Index order is fixed: left eye, right eye, nose, left mouth corner,
/// right mouth corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Creates a landmark set from points in canonical order.
    #[must_use]
    pub const fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Maps normalized model output into frame pixel coordinates.
    ///
    /// `normalized` is the flattened model output `[x0, y0, x1, y1, ...]` with
    /// values in `[0, 1]` relative to the face crop. Each point maps to
    /// `(round(x * face_width) + offset.x, round(y * face_height) + offset.y)`.
    /// Values beyond the first ten are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOutput`] if fewer than ten values are given.
    pub fn from_normalized(
        normalized: &[f32],
        face_width: u32,
        face_height: u32,
        offset: BoxOffset,
    ) -> Result<Self> {
        if normalized.len() < LANDMARK_COUNT * 2 {
            return Err(Error::InvalidOutput(format!(
                "expected {} landmark values, got {}",
                LANDMARK_COUNT * 2,
                normalized.len()
            )));
        }

        let (fw, fh) = (face_width as f32, face_height as f32);
        let mut points = [Point::default(); LANDMARK_COUNT];
        for (point, pair) in points.iter_mut().zip(normalized.chunks_exact(2)) {
            *point = Point::new(
                (pair[0] * fw).round() as i32 + offset.x,
                (pair[1] * fh).round() as i32 + offset.y,
            );
        }

        Ok(Self { points })
    }

    /// All five points in canonical order.
    #[must_use]
    pub const fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Left eye center.
    #[must_use]
    pub const fn left_eye(&self) -> Point {
        self.points[0]
    }

    /// Right eye center.
    #[must_use]
    pub const fn right_eye(&self) -> Point {
        self.points[1]
    }

    /// Nose tip.
    #[must_use]
    pub const fn nose(&self) -> Point {
        self.points[2]
    }

    /// Left mouth corner.
    #[must_use]
    pub const fn left_mouth_corner(&self) -> Point {
        self.points[3]
    }

    /// Right mouth corner.
    #[must_use]
    pub const fn right_mouth_corner(&self) -> Point {
        self.points[4]
    }

    /// Flattened `[x0, y0, x1, y1, ...]` form.
    #[must_use]
    pub fn flatten(&self) -> [i32; LANDMARK_COUNT * 2] {
        let mut flat = [0; LANDMARK_COUNT * 2];
        for (pair, point) in flat.chunks_exact_mut(2).zip(&self.points) {
            pair[0] = point.x;
            pair[1] = point.y;
        }
        flat
    }

    /// Both eye centers (the first four flattened values).
    #[must_use]
    pub const fn eye_centers(&self) -> EyeCenters {
        EyeCenters {
            left: self.left_eye(),
            right: self.right_eye(),
        }
    }
}

/// Pixel centers of both eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeCenters {
    /// Left eye center.
    pub left: Point,
    /// Right eye center.
    pub right: Point,
}

impl EyeCenters {
    /// Creates eye centers from two points.
    #[must_use]
    pub const fn new(left: Point, right: Point) -> Self {
        Self { left, right }
    }

    /// Builds eye centers from `[left_x, left_y, right_x, right_y]`.
    #[must_use]
    pub const fn from_array(coords: [i32; 4]) -> Self {
        Self {
            left: Point::new(coords[0], coords[1]),
            right: Point::new(coords[2], coords[3]),
        }
    }

    /// Returns `[left_x, left_y, right_x, right_y]`.
    #[must_use]
    pub const fn to_array(self) -> [i32; 4] {
        [self.left.x, self.left.y, self.right.x, self.right.y]
    }
}

/// Owned crops of both eye regions.
///
/// The crops are copies; drawing on the source frame afterwards does not
/// change them.
#[derive(Debug, Clone)]
pub struct EyeCrops {
    /// Crop around the left eye.
    pub left: RgbImage,
    /// Crop around the right eye.
    pub right: RgbImage,
}
