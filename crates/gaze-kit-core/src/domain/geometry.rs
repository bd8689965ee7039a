//! Pixel-space geometry.

use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates. May lie outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row (grows downward).
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the point as an `(x, y)` tuple.
    #[must_use]
    pub const fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Top-left offset of a detected face inside the original frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoxOffset {
    /// Column of the face box's left edge.
    pub x: i32,
    /// Row of the face box's top edge.
    pub y: i32,
}

impl BoxOffset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A crop window clamped to the frame extent.
///
/// Always satisfies `0 <= left <= right <= width` and
/// `0 <= top <= bottom <= height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBounds {
    /// Left edge (inclusive).
    pub left: u32,
    /// Top edge (inclusive).
    pub top: u32,
    /// Right edge (exclusive).
    pub right: u32,
    /// Bottom edge (exclusive).
    pub bottom: u32,
}

impl CropBounds {
    /// Builds the square window `[center - half_size, center + half_size]`
    /// and clamps each side independently to `[0, width]` / `[0, height]`.
    #[must_use]
    pub fn around(center: Point, half_size: u32, width: u32, height: u32) -> Self {
        let r = i64::from(half_size);
        let (cx, cy) = (i64::from(center.x), i64::from(center.y));

        Self {
            left: clamp_to(cx - r, width),
            top: clamp_to(cy - r, height),
            right: clamp_to(cx + r, width),
            bottom: clamp_to(cy + r, height),
        }
    }

    /// Width of the window in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Height of the window in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Returns true if the window covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_to(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}
