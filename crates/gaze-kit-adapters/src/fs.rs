//! Filesystem adapter for frames and overlay fonts.

use std::path::Path;

use ab_glyph::FontArc;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::debug;

/// Supported frame extensions.
const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Checks if a path has a supported frame extension.
#[must_use]
pub fn is_supported_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.as_str()))
}

/// Loads a still image as an 8-bit RGB frame.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or the file cannot be
/// decoded.
pub fn load_frame(path: &Path) -> Result<RgbImage> {
    if !is_supported_frame(path) {
        bail!("Unsupported frame format: {}", path.display());
    }

    let frame = image::open(path)
        .with_context(|| format!("Failed to open frame: {}", path.display()))?
        .to_rgb8();
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        frame.width(),
        frame.height()
    );

    Ok(frame)
}

/// Writes an annotated frame; the format follows the extension.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or the file cannot be
/// written.
pub fn save_frame(frame: &RgbImage, path: &Path) -> Result<()> {
    if !is_supported_frame(path) {
        bail!("Unsupported frame format: {}", path.display());
    }

    frame
        .save(path)
        .with_context(|| format!("Failed to write frame: {}", path.display()))?;
    debug!("Saved {}", path.display());
    Ok(())
}

/// Loads a TrueType or OpenType font for the gaze label.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid font.
pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read font: {}", path.display()))?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| anyhow::anyhow!("Invalid font {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_frame() {
        assert!(is_supported_frame(Path::new("frame.jpg")));
        assert!(is_supported_frame(Path::new("frame.JPEG")));
        assert!(is_supported_frame(Path::new("frame.png")));
        assert!(!is_supported_frame(Path::new("frame.tiff")));
        assert!(!is_supported_frame(Path::new("frame")));
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let path = dir.path().join("not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font")
            .unwrap_or_else(|e| panic!("write failed: {e}"));

        assert!(load_font(&path).is_err());
        assert!(load_font(&dir.path().join("missing.ttf")).is_err());
    }
}
