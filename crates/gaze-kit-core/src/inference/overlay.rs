//! Drawing of landmarks and gaze arrows onto frames.
//!
//! All drawing clips to the frame, so points near or past the border are safe,
//! and the work done per call is bounded by the frame size.

// Pixel math mixes i32 coordinates with f32 geometry
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]

use std::f32::consts::FRAC_PI_4;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use tracing::warn;

use crate::domain::{EyeCenters, GazeVector, LandmarkSet, Point};

/// Arrow head length as a fraction of the arrow length.
const ARROW_TIP_RATIO: f32 = 0.1;

/// DejaVu Sans Mono, used for the gaze label unless another font is set.
/// License text ships next to the file in `assets/`.
pub const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Parses [`BUNDLED_FONT`].
#[must_use]
pub fn bundled_font() -> Option<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT)
        .map_err(|e| warn!("Bundled label font is unusable: {e}"))
        .ok()
}

/// Colors and sizes used when annotating frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Eye boxes and landmark markers.
    pub landmark_color: Rgb<u8>,
    /// Radius of the filled nose and mouth markers.
    pub marker_radius: i32,
    /// Gaze arrows.
    pub arrow_color: Rgb<u8>,
    /// Gaze arrow line thickness in pixels.
    pub arrow_thickness: u32,
    /// Gaze label text.
    pub text_color: Rgb<u8>,
    /// Gaze label height in pixels.
    pub text_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            landmark_color: Rgb([0, 0, 255]),
            marker_radius: 5,
            arrow_color: Rgb([255, 0, 0]),
            arrow_thickness: 2,
            text_color: Rgb([0, 0, 0]),
            text_scale: 24.0,
        }
    }
}

/// Draws an unfilled square of half-size `half_size` around each eye.
///
/// Edges are clamped to one pixel outside the frame, so an oversized box
/// draws only its visible sides.
pub fn draw_eye_boxes(frame: &mut RgbImage, eyes: &EyeCenters, half_size: u32, color: Rgb<u8>) {
    let r = i64::from(half_size);
    let max_x = i64::from(frame.width());
    let max_y = i64::from(frame.height());
    let to_i32 = |v: i64| i32::try_from(v).unwrap_or(i32::MAX);
    let to_u32 = |v: i64| u32::try_from(v).unwrap_or(u32::MAX);

    for eye in [eyes.left, eyes.right] {
        let (cx, cy) = (i64::from(eye.x), i64::from(eye.y));
        let left = (cx - r).clamp(-1, max_x);
        let right = (cx + r).clamp(-1, max_x);
        let top = (cy - r).clamp(-1, max_y);
        let bottom = (cy + r).clamp(-1, max_y);

        let rect = Rect::at(to_i32(left), to_i32(top))
            .of_size(to_u32(right - left + 1), to_u32(bottom - top + 1));
        draw_hollow_rect_mut(frame, rect, color);
    }
}

/// Draws filled markers at the nose and both mouth corners.
pub fn draw_landmark_markers(frame: &mut RgbImage, landmarks: &LandmarkSet, style: &OverlayStyle) {
    for point in [
        landmarks.nose(),
        landmarks.left_mouth_corner(),
        landmarks.right_mouth_corner(),
    ] {
        draw_filled_circle_mut(
            frame,
            point.as_tuple(),
            style.marker_radius,
            style.landmark_color,
        );
    }
}

/// Draws an arrow from `from` to `to` with a two-stroke head at `to`.
///
/// Every stroke is clipped to the frame before rasterizing, so far-away
/// endpoints cost no more than ones inside the frame.
pub fn draw_arrow_mut(
    frame: &mut RgbImage,
    from: Point,
    to: Point,
    color: Rgb<u8>,
    thickness: u32,
) {
    let (x0, y0) = (from.x as f32, from.y as f32);
    let (x1, y1) = (to.x as f32, to.y as f32);
    let (dx, dy) = (x1 - x0, y1 - y0);
    let length = dx.hypot(dy);
    let thickness = thickness.max(1);

    if length < f32::EPSILON {
        draw_filled_circle_mut(frame, from.as_tuple(), (thickness / 2) as i32, color);
        return;
    }

    let tip = length * ARROW_TIP_RATIO;
    let back = (y0 - y1).atan2(x0 - x1);
    let head = |theta: f32| (x1 + tip * theta.cos(), y1 + tip * theta.sin());

    let segments = [
        ((x0, y0), (x1, y1)),
        ((x1, y1), head(back + FRAC_PI_4)),
        ((x1, y1), head(back - FRAC_PI_4)),
    ];

    // Thickness is emulated with parallel strokes along the shaft normal.
    let (nx, ny) = (-dy / length, dx / length);
    let center = (thickness - 1) as f32 / 2.0;
    let bounds = (-1.0, -1.0, frame.width() as f32, frame.height() as f32);
    for (start, end) in segments {
        for stroke in 0..thickness {
            let shift = stroke as f32 - center;
            let shifted = (
                (start.0 + nx * shift, start.1 + ny * shift),
                (end.0 + nx * shift, end.1 + ny * shift),
            );
            if let Some((a, b)) = clip_segment(shifted.0, shifted.1, bounds) {
                draw_line_segment_mut(frame, a, b, color);
            }
        }
    }
}

/// Liang-Barsky clip of the segment `a`-`b` to `(min_x, min_y, max_x, max_y)`.
///
/// Returns `None` when no part of the segment lies inside, or when a
/// coordinate is not finite.
fn clip_segment(
    a: (f32, f32),
    b: (f32, f32),
    (min_x, min_y, max_x, max_y): (f32, f32, f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;

    for (p, q) in [
        (-dx, a.0 - min_x),
        (dx, max_x - a.0),
        (-dy, a.1 - min_y),
        (dy, max_y - a.1),
    ] {
        if p.abs() <= f32::EPSILON {
            // Parallel to this edge: inside or out for the whole length.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }

    Some((
        (a.0 + enter * dx, a.1 + enter * dy),
        (a.0 + exit * dx, a.1 + exit * dy),
    ))
}

/// Draws the gaze label and one arrow per eye.
///
/// Both arrows share the direction `(gaze.x, -gaze.y) * scale`. The label is
/// skipped only when `font` is `None`; `label_origin` is the text baseline.
pub fn draw_gaze(
    frame: &mut RgbImage,
    gaze: &GazeVector,
    eyes: &EyeCenters,
    scale: f32,
    font: Option<&FontArc>,
    label_origin: Point,
    style: &OverlayStyle,
) {
    if let Some(font) = font {
        let top = label_origin.y - style.text_scale.round() as i32;
        draw_text_mut(
            frame,
            style.text_color,
            label_origin.x,
            top,
            PxScale::from(style.text_scale),
            font,
            &gaze.label(),
        );
    }

    for center in [eyes.left, eyes.right] {
        let end = gaze.arrow_endpoint(center, scale);
        draw_arrow_mut(frame, center, end, style.arrow_color, style.arrow_thickness);
    }
}
