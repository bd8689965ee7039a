//! Tensor preprocessing and frame overlay helpers shared by the components.
//!
//! Provides:
//! - NCHW tensor conversion of image crops
//! - Landmark, arrow and label drawing on frames

mod overlay;
mod preprocess;

pub use overlay::{
    bundled_font, draw_arrow_mut, draw_eye_boxes, draw_gaze, draw_landmark_markers, OverlayStyle,
    BUNDLED_FONT,
};
pub use preprocess::{to_nchw_tensor, ChannelOrder};
